//! The cloud registry: durable CRUD over named cloud profiles
//!
//! Built-in clouds are seeded first, then the `clouds.config` file is
//! overlaid: sections matching a built-in name override its fields, all
//! other sections become custom clouds. Every mutation is a whole-file
//! read-modify-write through the injected [`FileSystem`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::account::{SubscriptionCache, ENABLED_STATE};
use crate::cloud::error::{CloudError, CloudResult};
use crate::cloud::model::{
    is_known_cloud, Cloud, ENDPOINT_NAMES, KNOWN_CLOUDS, STRATUS_PUBLIC_CLOUD, SUFFIX_NAMES,
};
use crate::cloud::profiles::{ApiProfileRegistry, LATEST_PROFILE};
use crate::config::ini::{IniDocument, IniSection};
use crate::config::{CLOUD_CONFIG_FILENAME, GLOBAL_CONFIG_FILENAME};
use crate::traits::{FileSystem, Output};

const ACTIVE_CLOUD_SECTION: &str = "cloud";
const ACTIVE_CLOUD_KEY: &str = "name";
const PROFILE_KEY: &str = "profile";
const SUBSCRIPTION_KEY: &str = "subscription";
const ENDPOINT_PREFIX: &str = "endpoint_";
const SUFFIX_PREFIX: &str = "suffix_";

/// Registry of known and custom clouds backed by the global config files
pub struct CloudRegistry {
    fs: Arc<dyn FileSystem>,
    output: Arc<dyn Output>,
    config_dir: PathBuf,
    profiles: ApiProfileRegistry,
}

impl CloudRegistry {
    pub fn new(fs: Arc<dyn FileSystem>, output: Arc<dyn Output>, config_dir: PathBuf) -> Self {
        Self {
            fs,
            output,
            config_dir,
            profiles: ApiProfileRegistry::new(),
        }
    }

    fn clouds_config_path(&self) -> PathBuf {
        self.config_dir.join(CLOUD_CONFIG_FILENAME)
    }

    fn global_config_path(&self) -> PathBuf {
        self.config_dir.join(GLOBAL_CONFIG_FILENAME)
    }

    fn read_document(&self, path: &Path) -> CloudResult<IniDocument> {
        if !self.fs.exists(path) {
            return Ok(IniDocument::new());
        }
        let text = self
            .fs
            .read_to_string(path)
            .map_err(|e| CloudError::FileSystem(e.to_string()))?;
        IniDocument::parse(&text).map_err(|e| CloudError::Config(e.to_string()))
    }

    fn write_document(&self, path: &Path, doc: &IniDocument) -> CloudResult<()> {
        self.fs
            .write(path, &doc.serialize())
            .map_err(|e| CloudError::FileSystem(e.to_string()))
    }

    /// All registered clouds in listing order: built-ins first (with any
    /// config file overrides applied), then custom clouds in file order.
    /// Exactly one cloud is flagged active when the persisted active name
    /// resolves; none are flagged when it does not.
    pub fn list_clouds(&self) -> CloudResult<Vec<Cloud>> {
        let mut doc = IniDocument::new();
        for known in KNOWN_CLOUDS.iter() {
            add_cloud_to_document(&mut doc, known, false)?;
        }

        let overlay = self.read_document(&self.clouds_config_path())?;
        for section in overlay.sections() {
            let target = doc.ensure_section(section.name());
            for (key, value) in section.entries() {
                target.set(key, value);
            }
        }

        let mut clouds = Vec::new();
        for section in doc.sections() {
            clouds.push(self.cloud_from_section(section)?);
        }

        let active_name = self.get_active_cloud_name()?;
        for cloud in &mut clouds {
            if cloud.name == active_name {
                cloud.is_active = true;
                break;
            }
        }

        Ok(clouds)
    }

    fn cloud_from_section(&self, section: &IniSection) -> CloudResult<Cloud> {
        let mut cloud = Cloud::new(section.name());
        for (key, value) in section.entries() {
            if key == PROFILE_KEY {
                cloud.profile = Some(value.to_string());
            } else if let Some(name) = key.strip_prefix(ENDPOINT_PREFIX) {
                cloud.endpoints.set(name, value);
            } else if let Some(name) = key.strip_prefix(SUFFIX_PREFIX) {
                cloud.suffixes.set(name, value);
            }
            // Other keys (including the subscription association) are not
            // part of the cloud definition and are ignored here.
        }

        let profile = cloud
            .profile
            .get_or_insert_with(|| LATEST_PROFILE.to_string());
        if !self.profiles.is_supported(profile) {
            return Err(CloudError::UnsupportedProfile(profile.clone()));
        }

        // Older releases only wrote endpoint_resource_manager
        if !cloud.endpoints.is_set("management") && cloud.endpoints.is_set("resource_manager") {
            let resource_manager = cloud.endpoints.resource_manager()?.to_string();
            cloud.endpoints.management = Some(resource_manager);
        }

        Ok(cloud)
    }

    fn find_cloud(&self, name: &str) -> CloudResult<Option<Cloud>> {
        Ok(self.list_clouds()?.into_iter().find(|c| c.name == name))
    }

    /// Whether a cloud with the given name is registered
    pub fn is_registered(&self, name: &str) -> CloudResult<bool> {
        Ok(self.find_cloud(name)?.is_some())
    }

    /// Registered clouds that are not built in
    pub fn custom_clouds(&self) -> CloudResult<Vec<Cloud>> {
        Ok(self
            .list_clouds()?
            .into_iter()
            .filter(|c| !is_known_cloud(&c.name))
            .collect())
    }

    /// Look up a cloud by exact name
    pub fn get_cloud(&self, name: &str) -> CloudResult<Cloud> {
        self.find_cloud(name)?
            .ok_or_else(|| CloudError::NotRegistered(name.to_string()))
    }

    /// The persisted active cloud name; defaults to the public cloud and
    /// persists that default when no value was ever written
    pub fn get_active_cloud_name(&self) -> CloudResult<String> {
        let doc = self.read_document(&self.global_config_path())?;
        if let Some(name) = doc
            .section(ACTIVE_CLOUD_SECTION)
            .and_then(|s| s.get(ACTIVE_CLOUD_KEY))
        {
            return Ok(name.to_string());
        }

        let default_name = STRATUS_PUBLIC_CLOUD.name.clone();
        self.set_active_cloud_name(&default_name)?;
        Ok(default_name)
    }

    fn set_active_cloud_name(&self, name: &str) -> CloudResult<()> {
        let path = self.global_config_path();
        let mut doc = self.read_document(&path)?;
        doc.ensure_section(ACTIVE_CLOUD_SECTION)
            .set(ACTIVE_CLOUD_KEY, name);
        self.write_document(&path, &doc)
    }

    /// The active cloud. When the persisted pointer no longer resolves,
    /// warns, resets the pointer to the public cloud and returns that.
    pub fn get_active_cloud(&self) -> CloudResult<Cloud> {
        let active_name = self.get_active_cloud_name()?;
        match self.get_cloud(&active_name) {
            Ok(cloud) => Ok(cloud),
            Err(CloudError::NotRegistered(_)) => {
                self.output
                    .warning(&CloudError::NotRegistered(active_name).to_string());
                self.output.warning(&format!(
                    "Resetting active cloud to '{}'.",
                    STRATUS_PUBLIC_CLOUD.name
                ));
                self.set_active_cloud_name(&STRATUS_PUBLIC_CLOUD.name)?;
                self.get_cloud(&STRATUS_PUBLIC_CLOUD.name)
            }
            Err(err) => Err(err),
        }
    }

    /// Make `name` the active cloud. No-op when already active. After a
    /// successful switch, tries to select a sensible default subscription
    /// for the new cloud; failures there are warned about, never raised.
    pub fn switch_active_cloud(&self, name: &str) -> CloudResult<()> {
        if self.get_active_cloud_name()? == name {
            return Ok(());
        }
        if !self.is_registered(name)? {
            return Err(CloudError::NotRegistered(name.to_string()));
        }

        self.set_active_cloud_name(name)?;
        self.output
            .warning(&format!("Switched active cloud to '{}'.", name));
        self.select_subscription_for_cloud(name);
        Ok(())
    }

    fn select_subscription_for_cloud(&self, name: &str) {
        let cache = SubscriptionCache::new(Arc::clone(&self.fs), self.config_dir.clone());

        let associated = match self.get_cloud_subscription(name) {
            Ok(subscription) => subscription,
            Err(err) => {
                self.output.warning(&err.to_string());
                None
            }
        };

        let cached = match cache.load() {
            Ok(subscriptions) => subscriptions,
            Err(err) => {
                self.output.warning(&err.to_string());
                Vec::new()
            }
        };

        let subscription_to_use = associated.or_else(|| {
            cached
                .iter()
                .find(|s| s.state == ENABLED_STATE)
                .map(|s| s.id.clone())
        });

        match subscription_to_use {
            Some(id) => match cache.set_active(&id) {
                Ok(subscription) => {
                    self.output.warning(&format!(
                        "Active subscription switched to '{} ({})'.",
                        subscription.name, subscription.id
                    ));
                }
                Err(err) => {
                    self.output.warning(&err.to_string());
                    self.output.warning(
                        "Unable to automatically switch the active subscription. \
                         Use 'stratus account set'.",
                    );
                }
            },
            None => {
                self.output
                    .warning("Use 'stratus login' to log in to this cloud.");
                self.output
                    .warning("Use 'stratus account set' to set the active subscription.");
            }
        }
    }

    /// Register a new custom cloud
    pub fn add_cloud(&self, cloud: &Cloud) -> CloudResult<()> {
        if self.find_cloud(&cloud.name)?.is_some() {
            return Err(CloudError::AlreadyRegistered(cloud.name.clone()));
        }
        self.save_cloud(cloud, false)
    }

    /// Replace the tracked fields of a registered cloud
    pub fn update_cloud(&self, cloud: &Cloud) -> CloudResult<()> {
        if self.find_cloud(&cloud.name)?.is_none() {
            return Err(CloudError::NotRegistered(cloud.name.clone()));
        }
        self.save_cloud(cloud, true)
    }

    fn save_cloud(&self, cloud: &Cloud, overwrite: bool) -> CloudResult<()> {
        let path = self.clouds_config_path();
        let mut doc = self.read_document(&path)?;
        add_cloud_to_document(&mut doc, cloud, overwrite)?;
        self.write_document(&path, &doc)
    }

    /// Unregister a custom cloud. The active cloud and built-in clouds
    /// cannot be removed.
    pub fn remove_cloud(&self, name: &str) -> CloudResult<()> {
        if self.find_cloud(name)?.is_none() {
            return Err(CloudError::NotRegistered(name.to_string()));
        }
        if name == self.get_active_cloud_name()? {
            return Err(CloudError::CannotUnregister {
                name: name.to_string(),
                reason: "it's currently active".to_string(),
            });
        }
        if is_known_cloud(name) {
            return Err(CloudError::CannotUnregister {
                name: name.to_string(),
                reason: "it's not a custom cloud".to_string(),
            });
        }

        let path = self.clouds_config_path();
        let mut doc = self.read_document(&path)?;
        doc.remove_section(name);
        self.write_document(&path, &doc)
    }

    /// The subscription associated with a cloud in the config file, if any.
    /// Unlike the other accessors this does not require the cloud to be
    /// registered; an unknown name simply has no association.
    pub fn get_cloud_subscription(&self, name: &str) -> CloudResult<Option<String>> {
        let doc = self.read_document(&self.clouds_config_path())?;
        Ok(doc
            .section(name)
            .and_then(|s| s.get(SUBSCRIPTION_KEY))
            .map(String::from))
    }

    /// Associate a default subscription with a registered cloud, or clear
    /// the association with `None`
    pub fn set_cloud_subscription(
        &self,
        name: &str,
        subscription: Option<&str>,
    ) -> CloudResult<()> {
        if self.find_cloud(name)?.is_none() {
            return Err(CloudError::NotRegistered(name.to_string()));
        }

        let path = self.clouds_config_path();
        let mut doc = self.read_document(&path)?;
        match subscription {
            Some(id) => {
                doc.ensure_section(name).set(SUBSCRIPTION_KEY, id);
            }
            None => {
                if let Some(section) = doc.section_mut(name) {
                    section.remove(SUBSCRIPTION_KEY);
                }
            }
        }
        self.write_document(&path, &doc)
    }
}

/// Write a cloud's tracked fields into its config section. Replaces the
/// `profile`/`endpoint_*`/`suffix_*` keys wholesale; any `subscription`
/// association in the section is left alone.
fn add_cloud_to_document(doc: &mut IniDocument, cloud: &Cloud, overwrite: bool) -> CloudResult<()> {
    if doc.has_section(&cloud.name) && !overwrite {
        return Err(CloudError::AlreadyRegistered(cloud.name.clone()));
    }

    let section = doc.ensure_section(&cloud.name);
    section.retain_keys(|key| {
        key != PROFILE_KEY && !key.starts_with(ENDPOINT_PREFIX) && !key.starts_with(SUFFIX_PREFIX)
    });

    if let Some(profile) = &cloud.profile {
        section.set(PROFILE_KEY, profile);
    }
    for name in ENDPOINT_NAMES {
        if let Some(value) = cloud.endpoints.get(name) {
            section.set(&format!("{}{}", ENDPOINT_PREFIX, name), value);
        }
    }
    for name in SUFFIX_NAMES {
        if let Some(value) = cloud.suffixes.get(name) {
            section.set(&format!("{}{}", SUFFIX_PREFIX, name), value);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Subscription;
    use crate::traits::{MockFileSystem, MockOutput};

    fn test_registry() -> (Arc<MockFileSystem>, Arc<MockOutput>, CloudRegistry) {
        let fs = Arc::new(MockFileSystem::new());
        let output = Arc::new(MockOutput::new());
        let registry = CloudRegistry::new(fs.clone(), output.clone(), PathBuf::from("/config"));
        (fs, output, registry)
    }

    fn contoso() -> Cloud {
        let mut cloud = Cloud::new("contoso");
        cloud.profile = Some("2018-01-01".to_string());
        cloud.endpoints.set("management", "https://mgmt.contoso.example");
        cloud.suffixes.set("storage_endpoint", "storage.contoso.example");
        cloud
    }

    fn seed_subscriptions(fs: &Arc<MockFileSystem>, subscriptions: Vec<Subscription>) {
        let cache = SubscriptionCache::new(fs.clone(), PathBuf::from("/config"));
        cache.save(&subscriptions).unwrap();
    }

    fn subscription(id: &str, name: &str, state: &str) -> Subscription {
        Subscription {
            id: id.to_string(),
            name: name.to_string(),
            state: state.to_string(),
            cloud_name: "StratusCloud".to_string(),
            is_default: false,
        }
    }

    #[test]
    fn test_list_clouds_contains_known_clouds() {
        let (_fs, _output, registry) = test_registry();

        let clouds = registry.list_clouds().unwrap();
        let names: Vec<&str> = clouds.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "StratusCloud",
                "StratusChinaCloud",
                "StratusUSGovernment",
                "StratusGermanCloud"
            ]
        );
    }

    #[test]
    fn test_exactly_one_cloud_is_active() {
        let (_fs, _output, registry) = test_registry();

        let clouds = registry.list_clouds().unwrap();
        let active: Vec<&Cloud> = clouds.iter().filter(|c| c.is_active).collect();

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "StratusCloud");
    }

    #[test]
    fn test_active_cloud_name_defaults_and_persists() {
        let (fs, _output, registry) = test_registry();

        assert!(!fs.has_file(&PathBuf::from("/config/config")));
        assert_eq!(registry.get_active_cloud_name().unwrap(), "StratusCloud");

        // The default is persisted, not re-derived
        let written = fs.get_file_contents(&PathBuf::from("/config/config")).unwrap();
        assert!(written.contains("name = StratusCloud"));
        assert_eq!(registry.get_active_cloud_name().unwrap(), "StratusCloud");
    }

    #[test]
    fn test_add_then_get_round_trips() {
        let (_fs, _output, registry) = test_registry();

        registry.add_cloud(&contoso()).unwrap();
        let cloud = registry.get_cloud("contoso").unwrap();

        assert_eq!(cloud.name, "contoso");
        assert_eq!(cloud.profile.as_deref(), Some("2018-01-01"));
        assert_eq!(
            cloud.endpoints.management().unwrap(),
            "https://mgmt.contoso.example"
        );
        assert_eq!(
            cloud.suffixes.storage_endpoint().unwrap(),
            "storage.contoso.example"
        );
    }

    #[test]
    fn test_add_twice_fails_and_keeps_first_registration() {
        let (_fs, _output, registry) = test_registry();
        registry.add_cloud(&contoso()).unwrap();

        let mut second = Cloud::new("contoso");
        second.endpoints.set("management", "https://other.example");

        let err = registry.add_cloud(&second).unwrap_err();
        assert!(matches!(err, CloudError::AlreadyRegistered(ref n) if n == "contoso"));
        assert_eq!(
            registry.get_cloud("contoso").unwrap().endpoints.management().unwrap(),
            "https://mgmt.contoso.example"
        );
    }

    #[test]
    fn test_add_with_known_cloud_name_fails() {
        let (_fs, _output, registry) = test_registry();
        let err = registry.add_cloud(&Cloud::new("StratusCloud")).unwrap_err();
        assert!(matches!(err, CloudError::AlreadyRegistered(_)));
    }

    #[test]
    fn test_persistence_survives_fresh_registry() {
        let (fs, _output, registry) = test_registry();
        registry.add_cloud(&contoso()).unwrap();

        // Fresh registry over the same backing store simulates a new
        // process reading the file from scratch
        let fresh = CloudRegistry::new(
            fs.clone(),
            Arc::new(MockOutput::new()),
            PathBuf::from("/config"),
        );
        let cloud = fresh.get_cloud("contoso").unwrap();

        assert_eq!(cloud.profile.as_deref(), Some("2018-01-01"));
        assert_eq!(
            cloud.endpoints.management().unwrap(),
            "https://mgmt.contoso.example"
        );
    }

    #[test]
    fn test_get_unregistered_cloud_fails() {
        let (_fs, _output, registry) = test_registry();
        let err = registry.get_cloud("nope").unwrap_err();
        assert!(matches!(err, CloudError::NotRegistered(ref n) if n == "nope"));
    }

    #[test]
    fn test_config_section_overrides_known_cloud_fields() {
        let (fs, _output, registry) = test_registry();
        fs.write(
            &PathBuf::from("/config/clouds.config"),
            "[StratusCloud]\nendpoint_management = https://mgmt.override.example\n",
        )
        .unwrap();

        let cloud = registry.get_cloud("StratusCloud").unwrap();
        assert_eq!(
            cloud.endpoints.management().unwrap(),
            "https://mgmt.override.example"
        );
        // Untouched fields keep the built-in values
        assert_eq!(
            cloud.endpoints.portal().unwrap(),
            "https://portal.stratus.cloud"
        );
    }

    #[test]
    fn test_custom_cloud_from_config_file() {
        let (fs, _output, registry) = test_registry();
        fs.write(
            &PathBuf::from("/config/clouds.config"),
            "[contoso]\nprofile = 2018-01-01\nendpoint_management = https://mgmt.contoso.example\n",
        )
        .unwrap();

        let clouds = registry.list_clouds().unwrap();
        let cloud = clouds.iter().find(|c| c.name == "contoso").unwrap();

        assert_eq!(cloud.profile.as_deref(), Some("2018-01-01"));
        assert_eq!(
            cloud.endpoints.management().unwrap(),
            "https://mgmt.contoso.example"
        );
        // management is defaulted from resource_manager, never the reverse
        assert!(cloud.endpoints.resource_manager().is_err());
    }

    #[test]
    fn test_management_defaults_from_resource_manager() {
        let (fs, _output, registry) = test_registry();
        fs.write(
            &PathBuf::from("/config/clouds.config"),
            "[contoso]\nendpoint_resource_manager = https://rm.contoso.example\n",
        )
        .unwrap();

        let cloud = registry.get_cloud("contoso").unwrap();
        assert_eq!(
            cloud.endpoints.management().unwrap(),
            "https://rm.contoso.example"
        );
    }

    #[test]
    fn test_missing_profile_defaults_to_latest() {
        let (fs, _output, registry) = test_registry();
        fs.write(
            &PathBuf::from("/config/clouds.config"),
            "[contoso]\nendpoint_management = https://mgmt.contoso.example\n",
        )
        .unwrap();

        let cloud = registry.get_cloud("contoso").unwrap();
        assert_eq!(cloud.profile.as_deref(), Some("latest"));
    }

    #[test]
    fn test_unsupported_profile_fails_listing() {
        let (fs, _output, registry) = test_registry();
        fs.write(
            &PathBuf::from("/config/clouds.config"),
            "[contoso]\nprofile = 2099-12-31\n",
        )
        .unwrap();

        let err = registry.list_clouds().unwrap_err();
        assert!(matches!(err, CloudError::UnsupportedProfile(ref p) if p == "2099-12-31"));
    }

    #[test]
    fn test_unknown_config_keys_are_ignored() {
        let (fs, _output, registry) = test_registry();
        fs.write(
            &PathBuf::from("/config/clouds.config"),
            "[contoso]\nendpoint_management = https://mgmt.contoso.example\nfuture_key = x\n",
        )
        .unwrap();

        assert!(registry.get_cloud("contoso").is_ok());
    }

    #[test]
    fn test_custom_clouds_excludes_known() {
        let (_fs, _output, registry) = test_registry();
        registry.add_cloud(&contoso()).unwrap();

        let custom = registry.custom_clouds().unwrap();
        assert_eq!(custom.len(), 1);
        assert_eq!(custom[0].name, "contoso");
    }

    #[test]
    fn test_switch_active_cloud_persists_pointer() {
        let (_fs, output, registry) = test_registry();

        registry.switch_active_cloud("StratusGermanCloud").unwrap();

        assert_eq!(
            registry.get_active_cloud_name().unwrap(),
            "StratusGermanCloud"
        );
        assert!(output.has_warning_containing("Switched active cloud to 'StratusGermanCloud'"));
        assert!(registry.get_cloud("StratusGermanCloud").unwrap().is_active);
    }

    #[test]
    fn test_switch_to_active_cloud_is_noop() {
        let (_fs, output, registry) = test_registry();
        // Establish the default pointer first
        assert_eq!(registry.get_active_cloud_name().unwrap(), "StratusCloud");
        output.clear();

        registry.switch_active_cloud("StratusCloud").unwrap();
        assert!(output.get_messages().is_empty());
    }

    #[test]
    fn test_switch_to_unregistered_cloud_fails_and_keeps_pointer() {
        let (_fs, _output, registry) = test_registry();

        let err = registry.switch_active_cloud("nope").unwrap_err();
        assert!(matches!(err, CloudError::NotRegistered(_)));
        assert_eq!(registry.get_active_cloud_name().unwrap(), "StratusCloud");
    }

    #[test]
    fn test_switch_prefers_associated_subscription() {
        let (fs, output, registry) = test_registry();
        seed_subscriptions(
            &fs,
            vec![
                subscription("1111-a", "First Enabled", ENABLED_STATE),
                subscription("2222-b", "Associated", ENABLED_STATE),
            ],
        );
        registry.add_cloud(&contoso()).unwrap();
        registry
            .set_cloud_subscription("contoso", Some("2222-b"))
            .unwrap();

        registry.switch_active_cloud("contoso").unwrap();

        assert!(output.has_warning_containing("Active subscription switched to 'Associated (2222-b)'"));
        let cache = SubscriptionCache::new(fs.clone(), PathBuf::from("/config"));
        assert_eq!(cache.get_active().unwrap().unwrap().id, "2222-b");
    }

    #[test]
    fn test_switch_falls_back_to_first_enabled_subscription() {
        let (fs, output, registry) = test_registry();
        seed_subscriptions(
            &fs,
            vec![
                subscription("1111-a", "Disabled One", "Disabled"),
                subscription("2222-b", "Enabled One", ENABLED_STATE),
            ],
        );
        registry.add_cloud(&contoso()).unwrap();

        registry.switch_active_cloud("contoso").unwrap();

        assert!(output.has_warning_containing("Active subscription switched to 'Enabled One (2222-b)'"));
    }

    #[test]
    fn test_switch_without_subscriptions_suggests_login() {
        let (_fs, output, registry) = test_registry();
        registry.add_cloud(&contoso()).unwrap();

        registry.switch_active_cloud("contoso").unwrap();

        assert!(output.has_warning_containing("Use 'stratus login' to log in to this cloud."));
        // The switch itself still succeeded
        assert_eq!(registry.get_active_cloud_name().unwrap(), "contoso");
    }

    #[test]
    fn test_switch_succeeds_when_associated_subscription_is_stale() {
        let (_fs, output, registry) = test_registry();
        registry.add_cloud(&contoso()).unwrap();
        // Association points at a subscription that is not in the cache
        registry
            .set_cloud_subscription("contoso", Some("gone-id"))
            .unwrap();

        registry.switch_active_cloud("contoso").unwrap();

        assert_eq!(registry.get_active_cloud_name().unwrap(), "contoso");
        assert!(output.has_warning_containing("Unable to automatically switch the active subscription"));
    }

    #[test]
    fn test_get_active_cloud_resets_dangling_pointer() {
        let (fs, output, registry) = test_registry();
        fs.write(
            &PathBuf::from("/config/config"),
            "[cloud]\nname = vanished\n",
        )
        .unwrap();

        let cloud = registry.get_active_cloud().unwrap();

        assert_eq!(cloud.name, "StratusCloud");
        assert!(output.has_warning_containing("The cloud 'vanished' is not registered."));
        assert!(output.has_warning_containing("Resetting active cloud to 'StratusCloud'."));
        assert_eq!(registry.get_active_cloud_name().unwrap(), "StratusCloud");
    }

    #[test]
    fn test_remove_known_cloud_fails_even_when_inactive() {
        let (_fs, _output, registry) = test_registry();

        for name in ["StratusChinaCloud", "StratusUSGovernment", "StratusGermanCloud"] {
            let err = registry.remove_cloud(name).unwrap_err();
            assert!(matches!(err, CloudError::CannotUnregister { .. }), "{}", name);
        }
    }

    #[test]
    fn test_remove_active_cloud_fails_then_succeeds_after_switch() {
        let (_fs, _output, registry) = test_registry();
        registry.add_cloud(&contoso()).unwrap();
        registry.switch_active_cloud("contoso").unwrap();

        let err = registry.remove_cloud("contoso").unwrap_err();
        assert!(matches!(
            err,
            CloudError::CannotUnregister { ref reason, .. } if reason.contains("active")
        ));

        registry.switch_active_cloud("StratusCloud").unwrap();
        registry.remove_cloud("contoso").unwrap();
        assert!(!registry.is_registered("contoso").unwrap());
    }

    #[test]
    fn test_remove_unregistered_cloud_fails() {
        let (_fs, _output, registry) = test_registry();
        let err = registry.remove_cloud("nope").unwrap_err();
        assert!(matches!(err, CloudError::NotRegistered(_)));
    }

    #[test]
    fn test_update_replaces_tracked_fields() {
        let (_fs, _output, registry) = test_registry();
        registry.add_cloud(&contoso()).unwrap();

        let mut updated = Cloud::new("contoso");
        updated.profile = Some("latest".to_string());
        updated.endpoints.set("portal", "https://portal.contoso.example");

        registry.update_cloud(&updated).unwrap();
        let cloud = registry.get_cloud("contoso").unwrap();

        assert_eq!(cloud.profile.as_deref(), Some("latest"));
        assert_eq!(
            cloud.endpoints.portal().unwrap(),
            "https://portal.contoso.example"
        );
        // The old management endpoint was not carried over
        assert!(cloud.endpoints.management().is_err());
    }

    #[test]
    fn test_update_preserves_subscription_association() {
        let (_fs, _output, registry) = test_registry();
        registry.add_cloud(&contoso()).unwrap();
        registry
            .set_cloud_subscription("contoso", Some("1111-a"))
            .unwrap();

        let mut updated = contoso();
        updated.endpoints.set("portal", "https://portal.contoso.example");
        registry.update_cloud(&updated).unwrap();

        assert_eq!(
            registry.get_cloud_subscription("contoso").unwrap().as_deref(),
            Some("1111-a")
        );
    }

    #[test]
    fn test_update_unregistered_cloud_fails() {
        let (_fs, _output, registry) = test_registry();
        let err = registry.update_cloud(&contoso()).unwrap_err();
        assert!(matches!(err, CloudError::NotRegistered(_)));
    }

    #[test]
    fn test_subscription_set_requires_registration_get_does_not() {
        let (_fs, _output, registry) = test_registry();

        // get: unknown cloud simply has no association
        assert_eq!(registry.get_cloud_subscription("nope").unwrap(), None);

        // set: validates registration
        let err = registry
            .set_cloud_subscription("nope", Some("1111-a"))
            .unwrap_err();
        assert!(matches!(err, CloudError::NotRegistered(_)));
    }

    #[test]
    fn test_set_cloud_subscription_none_clears_association() {
        let (_fs, _output, registry) = test_registry();
        registry.add_cloud(&contoso()).unwrap();
        registry
            .set_cloud_subscription("contoso", Some("1111-a"))
            .unwrap();

        registry.set_cloud_subscription("contoso", None).unwrap();
        assert_eq!(registry.get_cloud_subscription("contoso").unwrap(), None);
    }

    #[test]
    fn test_set_subscription_on_known_cloud_without_section() {
        let (_fs, _output, registry) = test_registry();

        // Known clouds are registered even with no config file section
        registry
            .set_cloud_subscription("StratusCloud", Some("1111-a"))
            .unwrap();
        assert_eq!(
            registry
                .get_cloud_subscription("StratusCloud")
                .unwrap()
                .as_deref(),
            Some("1111-a")
        );
    }

    #[test]
    fn test_malformed_clouds_config_fails_with_config_error() {
        let (fs, _output, registry) = test_registry();
        fs.write(&PathBuf::from("/config/clouds.config"), "garbage here\n")
            .unwrap();

        let err = registry.list_clouds().unwrap_err();
        assert!(matches!(err, CloudError::Config(_)));
    }
}
