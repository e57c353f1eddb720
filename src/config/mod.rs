//! Unified configuration system.
//!
//! Consolidates configuration from four tiers with field-by-field YAML merging:
//! 1. **Defaults** - `Config::default()`
//! 2. **Project** - `$CWD/kanboard-migrate/config.yaml`
//! 3. **User** - `~/.kanboard-migrate/config.yaml`
//! 4. **Environment** - `KANBOARD_MIGRATE_*` variables
//!
//! ## Environment Variables
//! - `KANBOARD_MIGRATE_CONFIG_PATH` - Explicit config file (replaces tiers 1-3)
//! - `KANBOARD_MIGRATE_PROJECT_DIR` / `KANBOARD_MIGRATE_USER_DIR` - Tier directories
//! - `KANBOARD_MIGRATE_SOURCE_URL`, `_SOURCE_USER`, `_SOURCE_TOKEN`, `_SOURCE_PROJECT`
//! - `KANBOARD_MIGRATE_DEST_URL`, `_DEST_TOKEN`, `_DEST_PROJECT`, `_WATCHER`
//! - `KANBOARD_MIGRATE_EXCLUDED_COLUMNS` - Comma-separated column ids

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier, ENV_CONFIG_PATH, EnvLookup};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
