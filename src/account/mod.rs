//! Cached subscriptions for the signed-in user
//!
//! Subscriptions are cached in a JSON file in the global config dir by the
//! login flow; this module only reads and updates that cache. At most one
//! subscription is flagged as the default at a time.

use crate::config::SUBSCRIPTION_CACHE_FILENAME;
use crate::traits::FileSystem;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Subscription state that makes it eligible for automatic selection
pub const ENABLED_STATE: &str = "Enabled";

/// A cached subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub name: String,
    pub state: String,
    pub cloud_name: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SubscriptionFile {
    subscriptions: Vec<Subscription>,
}

/// Read/update access to the subscription cache file
pub struct SubscriptionCache {
    fs: Arc<dyn FileSystem>,
    config_dir: PathBuf,
}

impl SubscriptionCache {
    pub fn new(fs: Arc<dyn FileSystem>, config_dir: PathBuf) -> Self {
        Self { fs, config_dir }
    }

    fn cache_path(&self) -> PathBuf {
        self.config_dir.join(SUBSCRIPTION_CACHE_FILENAME)
    }

    /// Load all cached subscriptions; a missing cache file is an empty cache
    pub fn load(&self) -> Result<Vec<Subscription>> {
        let path = self.cache_path();
        if !self.fs.exists(&path) {
            return Ok(Vec::new());
        }

        let text = self.fs.read_to_string(&path)?;
        let file: SubscriptionFile = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse subscription cache: {:?}", path))?;
        Ok(file.subscriptions)
    }

    /// Overwrite the cache with the given subscriptions
    pub fn save(&self, subscriptions: &[Subscription]) -> Result<()> {
        let file = SubscriptionFile {
            subscriptions: subscriptions.to_vec(),
        };
        let text = serde_json::to_string_pretty(&file)
            .context("Failed to serialize subscription cache")?;
        self.fs.write(&self.cache_path(), &text)
    }

    /// Mark the subscription with the given id as the default
    pub fn set_active(&self, subscription_id: &str) -> Result<Subscription> {
        let mut subscriptions = self.load()?;

        if !subscriptions.iter().any(|s| s.id == subscription_id) {
            bail!(
                "The subscription '{}' is not in the cache. Use 'stratus login' to refresh it.",
                subscription_id
            );
        }

        for subscription in &mut subscriptions {
            subscription.is_default = subscription.id == subscription_id;
        }
        self.save(&subscriptions)?;

        subscriptions
            .into_iter()
            .find(|s| s.id == subscription_id)
            .context("Subscription disappeared from the cache")
    }

    /// The subscription currently flagged as the default, if any
    pub fn get_active(&self) -> Result<Option<Subscription>> {
        Ok(self.load()?.into_iter().find(|s| s.is_default))
    }
}
