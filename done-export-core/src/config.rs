use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Parameters of one export, read-only for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Title of the source list.
    pub list_title: String,
    /// Internal name of the status field.
    pub status_field: String,
    /// Status value that marks an item as done.
    pub done_value: String,
    /// Internal name of the completion date field.
    pub done_date_field: String,
    /// Fields to export, in column order.
    pub select_fields: Vec<String>,
    /// Only items completed at least this many days ago are exported.
    pub older_than_days: u32,
    /// Server-relative path of the destination folder.
    pub target_folder: String,
    /// Prefix of the generated file name.
    pub file_prefix: Option<String>,
}

impl ExportConfig {
    pub fn trace_loaded(&self) {
        info!(
            list = %self.list_title,
            fields = self.select_fields.len(),
            older_than_days = self.older_than_days,
            target_folder = %self.target_folder,
            "Loaded ExportConfig"
        );
        debug!(?self, "ExportConfig loaded (full debug)");
    }
}

/// Splits a comma-separated field list, trimming whitespace and dropping empty entries.
pub fn parse_field_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_owned)
        .collect()
}
