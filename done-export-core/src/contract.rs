//! # contract: capabilities injected into the export pipeline
//!
//! The pipeline never talks to the network itself. Everything it needs from
//! the host is expressed as a trait here:
//!
//! - [`ListReader`]: executes one page of a list query against the remote list.
//! - [`DocumentStore`]: creates or overwrites a file in a document library.
//! - [`Clock`]: supplies "now" for the threshold date, export stamp and file name.
//!
//! ## Mocking & Testing
//! - [`ListReader`] and [`DocumentStore`] are annotated for `mockall`, so
//!   consumers can build deterministic mocks (`MockListReader`,
//!   `MockDocumentStore`) when the `test-export-mocks` feature is enabled.
//! - [`FixedClock`] pins time for reproducible runs.
//!
//! ## Adding New Destinations
//! - Implement [`DocumentStore`] for the destination.
//! - Convert all upstream failures into the boxed [`RemoteError`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use serde_json::{Map, Value};

use crate::query::ListQuery;

/// Error type returned by remote capabilities.
pub type RemoteError = Box<dyn std::error::Error + Send + Sync>;

/// One raw item as returned by the remote list, keyed by internal field name.
pub type RawItem = Map<String, Value>;

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    /// Items in server order.
    pub rows: Vec<RawItem>,
    /// Opaque continuation token; `None` on the last page.
    pub next_page: Option<String>,
}

/// A file to create (or overwrite) in a document library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Server-relative folder path, e.g. `/sites/Agile/Shared Documents/Exports`.
    pub folder: String,
    /// File name inside the folder.
    pub file_name: String,
    pub content: Vec<u8>,
    pub content_type: String,
}

/// The stored file as reported by the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedFile {
    /// Location of the stored file as reported by the store.
    pub location: String,
    /// Number of bytes written.
    pub bytes: usize,
}

/// Executes list queries against a remote list.
///
/// Implementations decide how a [`ListQuery`] is transported. Pagination is
/// driven by the caller: the first call passes `None`, each further call passes
/// the token returned in [`ListPage::next_page`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ListReader: Send + Sync {
    /// Fetch one page of items matching `query`.
    async fn read_page(
        &self,
        query: &ListQuery,
        page_token: Option<String>,
    ) -> Result<ListPage, RemoteError>;
}

/// Writes files into a path-addressed document store.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create the file, replacing any existing file with the same name.
    async fn put_file(&self, upload: FileUpload) -> Result<PublishedFile, RemoteError>;
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
