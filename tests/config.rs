use std::path::Path;
use std::time::Duration;

use assert_matches::assert_matches;

use taxlineage::config::{ConfigLoader, ConfigOverrides};
use taxlineage::error::LineageError;

#[test]
fn file_values_apply_and_cli_wins() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("taxlineage.json");
    std::fs::write(
        &path,
        r#"{"output_prefix": "from_file", "timeout_secs": 5, "taxonomy_db": "taxonomy"}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(
        Path::new("accns.txt"),
        Some(path.as_path()),
        ConfigOverrides::default(),
    )
    .unwrap();
    assert_eq!(resolved.output_prefix.as_str(), "from_file");
    assert_eq!(resolved.edirect.timeout, Duration::from_secs(5));
    assert_eq!(resolved.edirect.nucleotide_db, "nucleotide");

    let resolved = ConfigLoader::resolve(
        Path::new("accns.txt"),
        Some(path.as_path()),
        ConfigOverrides {
            output_prefix: Some("cli".to_string()),
            timeout_secs: Some(12),
        },
    )
    .unwrap();
    assert_eq!(resolved.output_prefix.as_str(), "cli");
    assert_eq!(resolved.edirect.timeout, Duration::from_secs(12));
}

#[test]
fn zero_timeout_is_rejected() {
    let err = ConfigLoader::resolve(
        Path::new("accns.txt"),
        None,
        ConfigOverrides {
            output_prefix: None,
            timeout_secs: Some(0),
        },
    )
    .unwrap_err();
    assert_matches!(err, LineageError::InvalidConfig(_));
}

#[test]
fn unreadable_and_malformed_files() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(
        Path::new("a"),
        Some(missing.as_path()),
        ConfigOverrides::default(),
    )
    .unwrap_err();
    assert_matches!(err, LineageError::ConfigRead(_));

    let bad = temp.path().join("bad.json");
    std::fs::write(&bad, r#"{"retries": 3}"#).unwrap();
    let err = ConfigLoader::resolve(
        Path::new("a"),
        Some(bad.as_path()),
        ConfigOverrides::default(),
    )
    .unwrap_err();
    assert_matches!(err, LineageError::ConfigParse(_));
}
