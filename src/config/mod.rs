//! Global configuration directory for the Stratus CLI
//!
//! All persisted state (cloud registry, active-cloud pointer, subscription
//! cache) lives in a single per-user directory. The directory can be
//! relocated with `STRATUS_CONFIG_DIR`, which also keeps integration tests
//! away from the real home directory.

pub mod ini;

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable overriding the global config directory
pub const CONFIG_DIR_ENV: &str = "STRATUS_CONFIG_DIR";

/// File holding the cloud registry (INI sections keyed by cloud name)
pub const CLOUD_CONFIG_FILENAME: &str = "clouds.config";

/// File holding the active-cloud pointer
pub const GLOBAL_CONFIG_FILENAME: &str = "config";

/// File holding the cached subscriptions
pub const SUBSCRIPTION_CACHE_FILENAME: &str = "profile.json";

/// Resolve the global config directory for this invocation
pub fn global_config_dir() -> Result<PathBuf> {
    let override_dir = std::env::var(CONFIG_DIR_ENV).ok();
    resolve_config_dir(override_dir.as_deref(), dirs::home_dir())
}

fn resolve_config_dir(override_dir: Option<&str>, home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    let home = home.context("Could not find home directory")?;
    Ok(home.join(".stratus"))
}
