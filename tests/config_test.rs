//! Integration tests for options loading and validation

use std::io::{Seek, Write};
use std::path::Path;

use histrelay::config::{ConfigError, Options};
use tempfile::NamedTempFile;

fn write_options(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp options file");
    file.write_all(json.as_bytes()).expect("write options");
    file
}

#[test]
fn test_load_valid_options() {
    let file = write_options(
        r#"{
            "upload_hour": 3,
            "destination_url": "https://collector.example.com/ingest",
            "destination_key": "k",
            "history_days": 2,
            "verify_tls": true
        }"#,
    );

    let options = Options::load(file.path()).expect("valid options should load");
    assert_eq!(options.upload_hour, 3);
    assert_eq!(options.destination_url, "https://collector.example.com/ingest");
    assert_eq!(options.destination_key, "k");
    assert_eq!(options.history_days, 2);
    assert!(options.verify_tls);
}

#[test]
fn test_missing_required_field_is_fatal() {
    // destination_key absent
    let file = write_options(
        r#"{"upload_hour": 3, "destination_url": "https://x.example", "history_days": 2, "verify_tls": true}"#,
    );

    let err = Options::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
}

#[test]
fn test_unparsable_json_is_fatal() {
    let file = write_options("upload_hour: 3");

    let err = Options::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
}

#[test]
fn test_upload_hour_out_of_range_is_fatal() {
    let file = write_options(
        r#"{"upload_hour": 24, "destination_url": "https://x.example", "destination_key": "k", "history_days": 2, "verify_tls": true}"#,
    );

    let err = Options::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::UploadHourOutOfRange(24)), "got {err:?}");
}

#[test]
fn test_zero_history_days_is_fatal() {
    let file = write_options(
        r#"{"upload_hour": 3, "destination_url": "https://x.example", "destination_key": "k", "history_days": 0, "verify_tls": true}"#,
    );

    let err = Options::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyHistoryWindow), "got {err:?}");
}

#[test]
fn test_non_http_destination_is_fatal() {
    let file = write_options(
        r#"{"upload_hour": 3, "destination_url": "ftp://x.example", "destination_key": "k", "history_days": 2, "verify_tls": true}"#,
    );

    let err = Options::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidDestinationUrl { .. }), "got {err:?}");
}

#[test]
fn test_missing_file_is_read_error() {
    let err = Options::load(Path::new("/nonexistent/options.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }), "got {err:?}");
}

#[test]
fn test_reload_picks_up_edits() {
    let mut file = write_options(
        r#"{"upload_hour": 3, "destination_url": "https://x.example", "destination_key": "k", "history_days": 2, "verify_tls": true}"#,
    );

    let first = Options::load(file.path()).unwrap();
    assert_eq!(first.upload_hour, 3);

    // Rewrite in place, as the Supervisor does on option changes
    file.as_file_mut().set_len(0).unwrap();
    file.as_file_mut().rewind().unwrap();
    file.write_all(
        br#"{"upload_hour": 5, "destination_url": "https://x.example", "destination_key": "k", "history_days": 9, "verify_tls": false}"#,
    )
    .unwrap();
    file.flush().unwrap();

    let second = Options::load(file.path()).unwrap();
    assert_eq!(second.upload_hour, 5);
    assert_eq!(second.history_days, 9);
}
