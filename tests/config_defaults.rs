use allure_lifecycle::config::Config;
use allure_lifecycle::{FileSystemStore, Lifecycle};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_default_config_values() {
    let config = Config::default();

    assert_eq!(config.results.directory, PathBuf::from("allure-results"));
    assert!(!config.results.indent);
    assert!(!config.results.clean);
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("allure.toml");
    std::fs::write(&path, "[results]\ndirectory = \"out\"\nindent = true\n").unwrap();

    let config = Config::load_from_file(&path).expect("Failed to load config");
    assert_eq!(config.results.directory, PathBuf::from("out"));
    assert!(config.results.indent);

    assert!(Config::load_from_file(&temp_dir.path().join("absent.toml")).is_none());
}

#[test]
fn test_store_follows_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::default();
    config.results.directory = temp_dir.path().join("configured");
    config.results.indent = true;

    let store = FileSystemStore::from_config(&config.results);
    assert_eq!(store.output_dir(), config.results.directory.as_path());

    let lifecycle = Lifecycle::from_config(&config);
    lifecycle
        .schedule_test_case(allure_lifecycle::model::TestResult::new("t1"))
        .unwrap();
    lifecycle.write_test_case("t1").unwrap();

    let written = std::fs::read_to_string(config.results.directory.join("t1-result.json")).unwrap();
    assert!(written.contains('\n'));
}
