use std::fs::write;
use tempfile::NamedTempFile;

use done_export::load_config::load_config;

fn write_config(yaml: &str) -> NamedTempFile {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), yaml).unwrap();
    config_file
}

#[test]
fn test_load_config_full_document() {
    let config_file = write_config(
        r#"
source:
  list_title: Team Board
  status_field: State
  done_value: Closed
  done_date_field: ClosedOn
  select_fields: " ID , Title,,State "
  older_than_days: 0
target:
  folder: /sites/Team/Shared Documents/Archive
  file_prefix: Board
"#,
    );

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.list_title, "Team Board");
    assert_eq!(config.status_field, "State");
    assert_eq!(config.done_value, "Closed");
    assert_eq!(config.done_date_field, "ClosedOn");
    assert_eq!(config.select_fields, vec!["ID", "Title", "State"]);
    assert_eq!(config.older_than_days, 0);
    assert_eq!(config.target_folder, "/sites/Team/Shared Documents/Archive");
    assert_eq!(config.file_prefix.as_deref(), Some("Board"));
}

#[test]
fn test_load_config_null_prefix_falls_back_at_publish_time() {
    let config_file = write_config("target:\n  file_prefix: null\n");
    let config = load_config(config_file.path()).expect("Config should load");
    assert_eq!(config.file_prefix, None);
    assert_eq!(config.list_title, "UserStories");
}

#[test]
fn test_load_config_rejects_unknown_keys() {
    let config_file = write_config("source:\n  list: Typo\n");
    let err = load_config(config_file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config YAML"), "{err}");
}

#[test]
fn test_load_config_missing_file() {
    let err = load_config("/no/such/config.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"), "{err}");
}
