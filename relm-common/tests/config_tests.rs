//! Configuration resolution tests
//!
//! Covers the priority order for the root folder and config file, graceful
//! degradation when the default config file is missing, and the root folder
//! layout.
//!
//! Tests touching RELM_ROOT_FOLDER or RELM_CONFIG are marked #[serial] so they
//! never race each other on the process environment.

use relm_common::config::{
    default_root_folder, load_config, resolve_config_path, RootFolderInitializer,
    RootFolderResolver, CONFIG_ENV_VAR, ROOT_FOLDER_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV_VAR);

    let resolver = RootFolderResolver::new(None, None);
    assert_eq!(resolver.resolve(), default_root_folder());
}

#[test]
#[serial]
fn test_resolver_cli_beats_env_and_toml() {
    env::set_var(ROOT_FOLDER_ENV_VAR, "/tmp/relm-env-root");

    let resolver = RootFolderResolver::new(
        Some(PathBuf::from("/tmp/relm-cli-root")),
        Some(PathBuf::from("/tmp/relm-toml-root")),
    );
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/relm-cli-root"));

    env::remove_var(ROOT_FOLDER_ENV_VAR);
}

#[test]
#[serial]
fn test_resolver_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV_VAR, "/tmp/relm-env-root");

    let resolver = RootFolderResolver::new(None, Some(PathBuf::from("/tmp/relm-toml-root")));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/relm-env-root"));

    env::remove_var(ROOT_FOLDER_ENV_VAR);
}

#[test]
#[serial]
fn test_resolver_uses_toml_when_no_cli_or_env() {
    env::remove_var(ROOT_FOLDER_ENV_VAR);

    let resolver = RootFolderResolver::new(None, Some(PathBuf::from("/srv/relm")));
    assert_eq!(resolver.resolve(), PathBuf::from("/srv/relm"));
}

#[test]
#[serial]
fn test_config_path_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/relm-env.toml");
    assert_eq!(
        resolve_config_path(None),
        Some(PathBuf::from("/tmp/relm-env.toml"))
    );
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_explicit_missing_config_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.toml");

    let err = load_config(Some(&missing)).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
}

#[test]
#[serial]
fn test_malformed_config_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[folders\npending = 1").unwrap();

    assert!(load_config(Some(&path)).is_err());
}

#[test]
#[serial]
fn test_loaded_config_records_its_source() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[folders]\npending = \"/srv/pending\"\n").unwrap();

    let loaded = load_config(Some(&path)).unwrap();
    assert_eq!(loaded.source, Some(path));
    assert_eq!(
        loaded.config.folders.pending,
        Some(PathBuf::from("/srv/pending"))
    );
}

#[test]
fn test_initializer_creates_databases_folder() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("relm-root");
    let initializer = RootFolderInitializer::new(root.clone());

    initializer.ensure_directory_exists().unwrap();

    assert!(root.join("_DATABASES").is_dir());
    assert_eq!(
        initializer.composer_db_path(),
        root.join("_DATABASES").join("composer_database.json")
    );
    assert_eq!(
        initializer.isrc_db_path(),
        root.join("_DATABASES").join("isrc_database.json")
    );
    assert_eq!(initializer.session_path(), root.join("session.json"));
}

#[test]
fn test_initializer_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let initializer = RootFolderInitializer::new(dir.path().to_path_buf());

    initializer.ensure_directory_exists().unwrap();
    std::fs::write(initializer.composer_db_path(), "{}").unwrap();
    initializer.ensure_directory_exists().unwrap();

    assert!(initializer.composer_db_path().exists());
}
