#![doc = "SharePoint REST client: implements the core list-reading and file-publishing capabilities over HTTP."]
//
//! # SharePoint integration (CLI <-> Core)
//!
//! [`SharePointClient`] wires the [`ListReader`] and [`DocumentStore`] traits
//! from `done-export-core` to a SharePoint site:
//!
//! - Reads use `RenderListDataAsStream` with the CAML view rendered by
//!   [`ListQuery::to_view_xml`]. The `NextHref` of each response is the
//!   continuation token for the next page.
//! - Writes use `Files/AddUsingPath` with `overwrite=true`.
//!
//! Paths and titles are passed as OData parameter aliases (`@t`, `@f`, `@n`)
//! so they never have to be escaped into the URL path.
//!
//! ## Client Usage
//!
//! Construct with [`SharePointClient::new_from_env`] (`SHAREPOINT_SITE_URL`,
//! `SHAREPOINT_ACCESS_TOKEN`, optional `SHAREPOINT_TIMEOUT_SECS`). Obtaining the
//! token is the caller's concern.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use done_export_core::contract::{
    DocumentStore, FileUpload, ListPage, ListReader, PublishedFile, RawItem, RemoteError,
};
use done_export_core::query::ListQuery;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::form_urlencoded;

pub const SITE_URL_VAR: &str = "SHAREPOINT_SITE_URL";
pub const ACCESS_TOKEN_VAR: &str = "SHAREPOINT_ACCESS_TOKEN";
pub const TIMEOUT_VAR: &str = "SHAREPOINT_TIMEOUT_SECS";

const ODATA_ACCEPT: &str = "application/json;odata=nometadata";
/// ListData plus paging metadata.
const RENDER_OPTIONS: u32 = 2;

#[derive(Debug, Error)]
pub enum SharePointError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("invalid value for {name}: {reason}")]
    InvalidEnv { name: &'static str, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SharePoint returned {status} for {url}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },
}

#[derive(Debug, Deserialize)]
struct RenderListDataResponse {
    #[serde(rename = "Row", default)]
    row: Vec<RawItem>,
    #[serde(rename = "NextHref", default)]
    next_href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddFileResponse {
    #[serde(rename = "ServerRelativeUrl", default)]
    server_relative_url: Option<String>,
}

/// OData string literal: wrapped in single quotes, inner quotes doubled.
fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Percent-encodes a query component, spaces as `%20`.
fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn alias(name: &str, value: &str) -> String {
    format!("{name}={}", encode_component(&odata_literal(value)))
}

#[derive(Clone)]
pub struct SharePointClient {
    http: reqwest::Client,
    site_url: String,
    access_token: String,
}

impl SharePointClient {
    pub fn new(
        site_url: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, SharePointError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let site_url = site_url.into().trim_end_matches('/').to_string();
        tracing::info!(site_url = %site_url, ?timeout, "Initialized SharePointClient");
        Ok(Self {
            http: builder.build()?,
            site_url,
            access_token: access_token.into(),
        })
    }

    pub fn new_from_env() -> Result<Self, SharePointError> {
        dotenvy::dotenv().ok();
        let site_url = env::var(SITE_URL_VAR).map_err(|e| {
            tracing::error!(error = ?e, "{SITE_URL_VAR} missing in environment");
            SharePointError::MissingEnv(SITE_URL_VAR)
        })?;
        let access_token = env::var(ACCESS_TOKEN_VAR).map_err(|e| {
            tracing::error!(error = ?e, "{ACCESS_TOKEN_VAR} missing in environment");
            SharePointError::MissingEnv(ACCESS_TOKEN_VAR)
        })?;
        let timeout = match env::var(TIMEOUT_VAR) {
            Ok(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| SharePointError::InvalidEnv {
                    name: TIMEOUT_VAR,
                    reason: e.to_string(),
                })?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };
        Self::new(site_url, access_token, timeout)
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    fn list_data_url(&self, list_title: &str, page_token: Option<&str>) -> String {
        let mut url = format!(
            "{}/_api/web/lists/GetByTitle(@t)/RenderListDataAsStream?{}",
            self.site_url,
            alias("@t", list_title)
        );
        if let Some(token) = page_token.map(|t| t.trim_start_matches('?')).filter(|t| !t.is_empty()) {
            url.push('&');
            url.push_str(token);
        }
        url
    }

    fn add_file_url(&self, folder: &str, file_name: &str) -> String {
        format!(
            "{}/_api/web/GetFolderByServerRelativePath(decodedurl=@f)/Files/AddUsingPath(decodedurl=@n,overwrite=true)?{}&{}",
            self.site_url,
            alias("@f", folder),
            alias("@n", file_name)
        )
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SharePointError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
        tracing::error!(%status, url = %url, "SharePoint returned an error status");
        Err(SharePointError::Status { status, url, body })
    }

    pub async fn render_list_data(
        &self,
        query: &ListQuery,
        page_token: Option<&str>,
    ) -> Result<ListPage, SharePointError> {
        let url = self.list_data_url(&query.list_title, page_token);
        tracing::info!(list = %query.list_title, paged = page_token.is_some(), "Requesting list data");
        let body = json!({
            "parameters": {
                "ViewXml": query.to_view_xml(),
                "RenderOptions": RENDER_OPTIONS,
            }
        });
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header(ACCEPT, ODATA_ACCEPT)
            .json(&body)
            .send()
            .await?;
        let data: RenderListDataResponse = Self::check(response).await?.json().await?;
        tracing::debug!(rows = data.row.len(), next = ?data.next_href, "Received list data page");
        Ok(ListPage {
            rows: data.row,
            next_page: data.next_href.filter(|href| !href.is_empty()),
        })
    }

    pub async fn add_file(&self, upload: FileUpload) -> Result<PublishedFile, SharePointError> {
        let url = self.add_file_url(&upload.folder, &upload.file_name);
        let bytes = upload.content.len();
        tracing::info!(folder = %upload.folder, file = %upload.file_name, bytes, "Uploading file");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header(ACCEPT, ODATA_ACCEPT)
            .header(CONTENT_TYPE, upload.content_type.as_str())
            .body(upload.content)
            .send()
            .await?;
        let added: AddFileResponse = Self::check(response).await?.json().await?;
        let location = added.server_relative_url.unwrap_or_else(|| {
            format!("{}/{}", upload.folder.trim_end_matches('/'), upload.file_name)
        });
        tracing::info!(location = %location, "Successfully uploaded file");
        Ok(PublishedFile { location, bytes })
    }
}

#[async_trait]
impl ListReader for SharePointClient {
    async fn read_page(
        &self,
        query: &ListQuery,
        page_token: Option<String>,
    ) -> Result<ListPage, RemoteError> {
        Ok(self.render_list_data(query, page_token.as_deref()).await?)
    }
}

#[async_trait]
impl DocumentStore for SharePointClient {
    async fn put_file(&self, upload: FileUpload) -> Result<PublishedFile, RemoteError> {
        Ok(self.add_file(upload).await?)
    }
}
