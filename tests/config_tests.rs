//! Tests for tiered configuration loading.

use kanboard_migrate::config::{ConfigLoader, ConfigPaths, ConfigTier, UnmatchedPolicy};
use kanboard_migrate::error::ErrorCode;
use std::path::PathBuf;
use tempfile::TempDir;

fn no_env(_: &str) -> Option<String> {
    None
}

fn write(dir: &PathBuf, content: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("config.yaml"), content).unwrap();
}

#[test]
fn user_tier_overrides_project_field_by_field() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("kanboard-migrate");
    let user = temp.path().join("user");

    write(
        &project,
        r#"
source:
  url: https://todo.example.org/jsonrpc.php
  project_id: 45
  excluded_columns: [184, 185]
destination:
  url: https://phabricator.example.org/api
  project_phid: PHID-PROJ-zsc
"#,
    );
    write(
        &user,
        r#"
source:
  token: kb-secret
destination:
  api_token: api-secret
  watcher_phid: PHID-USER-me
migration:
  unmatched: skip
"#,
    );

    let loader =
        ConfigLoader::load_with(ConfigPaths::with_dirs(Some(project), Some(user)), None, &no_env)
            .unwrap();
    let config = loader.config();

    assert_eq!(config.source.url, "https://todo.example.org/jsonrpc.php");
    assert_eq!(config.source.user, "jsonrpc");
    assert_eq!(config.source.token, "kb-secret");
    assert_eq!(config.source.project_id, "45");
    assert_eq!(config.source.excluded_columns, vec!["184", "185"]);
    assert_eq!(config.destination.project_phid, "PHID-PROJ-zsc");
    assert_eq!(config.destination.watcher_phid, "PHID-USER-me");
    assert_eq!(config.migration.unmatched, UnmatchedPolicy::Skip);
    config.validate().unwrap();

    let tiers: Vec<ConfigTier> = loader.sources().iter().map(|(t, _)| *t).collect();
    assert_eq!(tiers, vec![ConfigTier::Project, ConfigTier::User]);
}

#[test]
fn explicit_file_replaces_tiers_but_env_still_applies() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("kanboard-migrate");
    write(&project, "source:\n  project_id: 87\n");

    let explicit = temp.path().join("migrate.yaml");
    std::fs::write(&explicit, "source:\n  project_id: 16\n  token: from-file\n").unwrap();

    let env = |key: &str| match key {
        "KANBOARD_MIGRATE_SOURCE_TOKEN" => Some("from-env".to_string()),
        _ => None,
    };

    let loader = ConfigLoader::load_with(
        ConfigPaths::with_dirs(Some(project), None),
        Some(explicit.as_path()),
        &env,
    )
    .unwrap();

    assert_eq!(loader.config().source.project_id, "16");
    assert_eq!(loader.config().source.token, "from-env");
    assert_eq!(loader.config().source.user, "jsonrpc");
}

#[test]
fn missing_explicit_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope.yaml");
    let result = ConfigLoader::load_with(ConfigPaths::with_dirs(None, None), Some(missing.as_path()), &no_env);
    assert!(result.is_err());
}

#[test]
fn empty_config_fails_validation() {
    let temp = TempDir::new().unwrap();
    let loader = ConfigLoader::load_with(
        ConfigPaths::with_dirs(Some(temp.path().join("none")), None),
        None,
        &no_env,
    )
    .unwrap();

    let err = loader.config().validate().unwrap_err();
    assert_eq!(err.code, ErrorCode::Configuration);
    assert!(err.message.contains("source.url"));
}
