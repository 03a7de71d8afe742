use thiserror::Error;

use crate::contract::RemoteError;
use crate::csv_encode::CsvEncodeError;

/// Any fault that ends an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("reading list '{list}' failed: {source}")]
    Fetch {
        list: String,
        #[source]
        source: RemoteError,
    },

    #[error("encoding CSV failed: {0}")]
    Encode(#[from] CsvEncodeError),

    #[error("uploading '{file}' failed: {source}")]
    Publish {
        file: String,
        #[source]
        source: RemoteError,
    },
}
