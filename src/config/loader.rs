//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Explicit config file; replaces the file tiers entirely.
pub const ENV_CONFIG_PATH: &str = "KANBOARD_MIGRATE_CONFIG_PATH";
pub const ENV_USER_DIR: &str = "KANBOARD_MIGRATE_USER_DIR";
pub const ENV_PROJECT_DIR: &str = "KANBOARD_MIGRATE_PROJECT_DIR";

const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Embedded defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/kanboard-migrate/)
    Project = 1,
    /// User-level config (~/.kanboard-migrate/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let user_dir = std::env::var(ENV_USER_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".kanboard-migrate")));

        let project_dir = std::env::var(ENV_PROJECT_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("kanboard-migrate")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Environment variable lookup, injectable for tests.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: Config,
    /// Files that contributed, lowest tier first.
    sources: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
        Self::load_with(ConfigPaths::discover(), explicit.as_deref(), &process_env)
    }

    /// Load from one explicit file plus environment overrides.
    pub fn load_file(path: &Path) -> Result<Self> {
        Self::load_with(ConfigPaths::discover(), Some(path), &process_env)
    }

    /// Load configuration with explicit paths and environment.
    ///
    /// An explicit file replaces the defaults, project and user tiers. Environment
    /// overrides always apply last.
    pub fn load_with(
        paths: ConfigPaths,
        explicit: Option<&Path>,
        env: EnvLookup<'_>,
    ) -> Result<Self> {
        let mut sources = Vec::new();

        let mut config = if let Some(path) = explicit {
            sources.push((ConfigTier::Project, path.to_path_buf()));
            Config::load(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?
        } else {
            let mut tiers: Vec<Value> = Vec::new();

            // Tier 1: Defaults (embedded)
            tiers.push(serde_json::to_value(Config::default())?);

            // Tier 2 and 3: project then user files
            for (tier, dir) in [
                (ConfigTier::Project, paths.project_dir.as_deref()),
                (ConfigTier::User, paths.user_dir.as_deref()),
            ] {
                let Some(dir) = dir else { continue };
                let file = dir.join(CONFIG_FILE);
                if let Some(value) = read_yaml_tier(&file) {
                    debug!(tier = %tier, path = %file.display(), "Loaded config tier");
                    tiers.push(value);
                    sources.push((tier, file));
                }
            }

            serde_json::from_value(deep_merge_all(tiers))
                .context("merged configuration is invalid")?
        };

        // Tier 4: Environment variable overrides
        if apply_env_overrides(&mut config, env) {
            sources.push((ConfigTier::Environment, PathBuf::from("<env>")));
        }

        Ok(Self { config, sources })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}

/// Read one YAML tier. Unreadable or invalid files are skipped with a warning.
fn read_yaml_tier(file: &Path) -> Option<Value> {
    if !file.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {}", file.display(), e);
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring invalid YAML in {}: {}", file.display(), e);
            None
        }
    }
}

/// Apply environment variable overrides. Returns whether any applied.
fn apply_env_overrides(config: &mut Config, env: EnvLookup<'_>) -> bool {
    let mut applied = false;
    let mut set = |key: &str, target: &mut String| {
        if let Some(value) = env(key) {
            *target = value;
            applied = true;
        }
    };

    set("KANBOARD_MIGRATE_SOURCE_URL", &mut config.source.url);
    set("KANBOARD_MIGRATE_SOURCE_USER", &mut config.source.user);
    set("KANBOARD_MIGRATE_SOURCE_TOKEN", &mut config.source.token);
    set("KANBOARD_MIGRATE_SOURCE_PROJECT", &mut config.source.project_id);
    set("KANBOARD_MIGRATE_DEST_URL", &mut config.destination.url);
    set("KANBOARD_MIGRATE_DEST_TOKEN", &mut config.destination.api_token);
    set("KANBOARD_MIGRATE_DEST_PROJECT", &mut config.destination.project_phid);
    set("KANBOARD_MIGRATE_WATCHER", &mut config.destination.watcher_phid);

    if let Some(columns) = env("KANBOARD_MIGRATE_EXCLUDED_COLUMNS") {
        config.source.excluded_columns = columns
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        applied = true;
    }

    applied
}
