//! Integration tests for layered Settings loading.
//!
//! These tests pass an explicit global config path (temp directories only),
//! so the user's real XDG config never leaks in.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use valtree::application::ApplicationError;
use valtree::config::{local_config_path, Settings, DEFAULT_WORKBOOK};

#[test]
fn given_local_config_when_load_then_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        r#"
workbook = "/data/master.xlsx"
default_threshold = 4
"#,
    )
    .unwrap();

    let settings = Settings::load_from(None, Some(dir.path())).expect("load settings");

    assert_eq!(settings.workbook, PathBuf::from("/data/master.xlsx"));
    assert_eq!(settings.default_threshold, 4);
    assert_eq!(settings.sheets.node_master, "Node_Master");
}

#[test]
fn given_global_and_local_config_when_load_then_local_wins_per_field() {
    let global_dir = TempDir::new().unwrap();
    let global_path = global_dir.path().join("valtree.toml");
    fs::write(
        &global_path,
        r#"
workbook = "/global/master.xlsx"
default_threshold = 2

[sheets]
node_master = "Nodes"
"#,
    )
    .unwrap();
    let local_dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(local_dir.path()),
        r#"
[sheets]
context_applicability = "Rules"
"#,
    )
    .unwrap();

    let settings =
        Settings::load_from(Some(&global_path), Some(local_dir.path())).expect("load settings");

    assert_eq!(settings.workbook, PathBuf::from("/global/master.xlsx"));
    assert_eq!(settings.default_threshold, 2);
    assert_eq!(settings.sheets.node_master, "Nodes");
    assert_eq!(settings.sheets.context_applicability, "Rules");
    assert_eq!(settings.sheets.value_intent_summary, "Value_Intent_Summary");
}

#[test]
fn given_out_of_range_threshold_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "default_threshold = 9\n").unwrap();

    let err = Settings::load_from(None, Some(dir.path())).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }), "{err}");
}

#[test]
fn given_malformed_toml_when_load_then_config_error_names_file() {
    let dir = TempDir::new().unwrap();
    let path = local_config_path(dir.path());
    fs::write(&path, "workbook = [unclosed\n").unwrap();

    let err = Settings::load_from(None, Some(dir.path())).unwrap_err();

    match err {
        ApplicationError::Config { message } => {
            assert!(message.contains(&path.display().to_string()), "{message}")
        }
        other => panic!("expected config error, got {other}"),
    }
}

#[test]
fn given_missing_local_config_when_load_then_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::load_from(None, Some(dir.path())).unwrap();
    assert_eq!(settings.workbook, PathBuf::from(DEFAULT_WORKBOOK));
}

#[test]
fn given_settings_when_round_tripping_through_toml_then_unchanged() {
    let dir = TempDir::new().unwrap();
    let settings = Settings {
        default_threshold: 5,
        ..Settings::default()
    };
    fs::write(local_config_path(dir.path()), settings.to_toml().unwrap()).unwrap();

    let loaded = Settings::load_from(None, Some(dir.path())).unwrap();

    assert_eq!(loaded, settings);
}
