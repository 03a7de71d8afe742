/// `load_config` module: loads the static YAML export configuration and maps it onto [`ExportConfig`].
///
/// Every key is optional; missing keys take the defaults the export has always
/// shipped with, so a minimal file only names what differs. Secrets and the
/// site binding are not part of this file; see [`crate::sharepoint`].
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use done_export_core::config::{parse_field_list, ExportConfig};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const DEFAULT_LIST_TITLE: &str = "UserStories";
pub const DEFAULT_STATUS_FIELD: &str = "Status";
pub const DEFAULT_DONE_VALUE: &str = "Erledigt";
pub const DEFAULT_DONE_DATE_FIELD: &str = "DoneDate";
pub const DEFAULT_SELECT_FIELDS: &str =
    "ID,Title,Status,DoneDate,Assignee,StoryPoints,Sprint,Priority,Labels,Created,Modified";
pub const DEFAULT_OLDER_THAN_DAYS: u32 = 30;
pub const DEFAULT_TARGET_FOLDER: &str = "/Shared Documents/Exports";
pub const DEFAULT_FILE_PREFIX: &str = "UserStories_Archive";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub target: TargetSection,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSection {
    pub list_title: String,
    pub status_field: String,
    pub done_value: String,
    pub done_date_field: String,
    /// Comma-separated internal field names, in column order.
    pub select_fields: String,
    pub older_than_days: u32,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            list_title: DEFAULT_LIST_TITLE.to_string(),
            status_field: DEFAULT_STATUS_FIELD.to_string(),
            done_value: DEFAULT_DONE_VALUE.to_string(),
            done_date_field: DEFAULT_DONE_DATE_FIELD.to_string(),
            select_fields: DEFAULT_SELECT_FIELDS.to_string(),
            older_than_days: DEFAULT_OLDER_THAN_DAYS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetSection {
    /// Server-relative folder path of the destination library.
    pub folder: String,
    pub file_prefix: Option<String>,
}

impl Default for TargetSection {
    fn default() -> Self {
        Self {
            folder: DEFAULT_TARGET_FOLDER.to_string(),
            file_prefix: Some(DEFAULT_FILE_PREFIX.to_string()),
        }
    }
}

impl CliConfig {
    pub fn into_export_config(self) -> ExportConfig {
        ExportConfig {
            list_title: self.source.list_title,
            status_field: self.source.status_field,
            done_value: self.source.done_value,
            done_date_field: self.source.done_date_field,
            select_fields: parse_field_list(&self.source.select_fields),
            older_than_days: self.source.older_than_days,
            target_folder: self.target.folder,
            file_prefix: self.target.file_prefix,
        }
    }
}

/// Loads a static YAML config file and returns the export configuration it describes.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ExportConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    parse_config(&config_content)
}

/// Parses YAML text into an export configuration. Blank input yields all defaults.
pub fn parse_config(yaml: &str) -> Result<ExportConfig> {
    let raw: CliConfig = if yaml.trim().is_empty() {
        CliConfig::default()
    } else {
        match serde_yaml::from_str(yaml) {
            Ok(conf) => conf,
            Err(e) => {
                error!(error = ?e, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    let config = raw.into_export_config();
    info!(
        list = %config.list_title,
        target_folder = %config.target_folder,
        "Config loaded successfully"
    );
    Ok(config)
}
