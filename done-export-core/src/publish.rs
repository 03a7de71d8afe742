use chrono::NaiveDate;
use tracing::{error, info};

use crate::contract::{DocumentStore, FileUpload, PublishedFile, RemoteError};

/// Prefix used when the configuration leaves it empty.
pub const DEFAULT_FILE_PREFIX: &str = "Kanban_Archive";

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// `{prefix}_{YYYY-MM-DD}.csv`. Runs on the same day share a name, so later runs replace earlier files.
pub fn export_file_name(prefix: Option<&str>, day: NaiveDate) -> String {
    let prefix = prefix
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .unwrap_or(DEFAULT_FILE_PREFIX);
    format!("{prefix}_{}.csv", day.format("%Y-%m-%d"))
}

/// Uploads `csv` as `folder/file_name`, overwriting an existing file.
pub async fn publish<S>(
    store: &S,
    folder: &str,
    file_name: &str,
    csv: &str,
) -> Result<PublishedFile, RemoteError>
where
    S: DocumentStore + ?Sized,
{
    let upload = FileUpload {
        folder: folder.to_owned(),
        file_name: file_name.to_owned(),
        content: csv.as_bytes().to_vec(),
        content_type: CSV_CONTENT_TYPE.to_owned(),
    };
    info!(folder, file = file_name, bytes = upload.content.len(), "Uploading CSV");
    match store.put_file(upload).await {
        Ok(published) => {
            info!(location = %published.location, bytes = published.bytes, "Upload succeeded");
            Ok(published)
        }
        Err(e) => {
            error!(error = ?e, folder, file = file_name, "Upload failed");
            Err(e)
        }
    }
}
