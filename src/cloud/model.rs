//! Cloud definitions: endpoint/suffix sets and the built-in clouds
//!
//! Built-in clouds are immutable templates. The registry overlays config
//! file values on copies of them; the statics themselves are never mutated.

use crate::cloud::error::{CloudError, CloudResult};
use lazy_static::lazy_static;

/// Endpoint names recognized in `endpoint_<name>` config keys
pub const ENDPOINT_NAMES: [&str; 7] = [
    "management",
    "resource_manager",
    "portal",
    "authentication",
    "sql_management",
    "gallery",
    "batch",
];

/// Suffix names recognized in `suffix_<name>` config keys
pub const SUFFIX_NAMES: [&str; 3] = ["storage_endpoint", "sql_server_hostname", "vault_dns"];

/// Service endpoints of a cloud
///
/// Fields are `None` until configured. Reading code must go through the
/// named accessors, which fail with a dedicated error for unset values;
/// `get` is the raw view used for display and serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloudEndpoints {
    pub management: Option<String>,
    pub resource_manager: Option<String>,
    pub portal: Option<String>,
    pub authentication: Option<String>,
    pub sql_management: Option<String>,
    pub gallery: Option<String>,
    pub batch: Option<String>,
}

#[allow(dead_code)]
impl CloudEndpoints {
    pub fn management(&self) -> CloudResult<&str> {
        self.require("management")
    }

    pub fn resource_manager(&self) -> CloudResult<&str> {
        self.require("resource_manager")
    }

    pub fn portal(&self) -> CloudResult<&str> {
        self.require("portal")
    }

    pub fn authentication(&self) -> CloudResult<&str> {
        self.require("authentication")
    }

    pub fn sql_management(&self) -> CloudResult<&str> {
        self.require("sql_management")
    }

    pub fn gallery(&self) -> CloudResult<&str> {
        self.require("gallery")
    }

    pub fn batch(&self) -> CloudResult<&str> {
        self.require("batch")
    }

    /// Raw value for an endpoint name, `None` when unset or unknown
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "management" => &self.management,
            "resource_manager" => &self.resource_manager,
            "portal" => &self.portal,
            "authentication" => &self.authentication,
            "sql_management" => &self.sql_management,
            "gallery" => &self.gallery,
            "batch" => &self.batch,
            _ => return None,
        };
        value.as_deref()
    }

    /// Set an endpoint by name; unknown names are ignored and return false
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        let slot = match name {
            "management" => &mut self.management,
            "resource_manager" => &mut self.resource_manager,
            "portal" => &mut self.portal,
            "authentication" => &mut self.authentication,
            "sql_management" => &mut self.sql_management,
            "gallery" => &mut self.gallery,
            "batch" => &mut self.batch,
            _ => return false,
        };
        *slot = Some(value.to_string());
        true
    }

    /// Whether an endpoint has a configured value
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn require(&self, name: &str) -> CloudResult<&str> {
        self.get(name)
            .ok_or_else(|| CloudError::EndpointNotSet(name.to_string()))
    }
}

/// Domain suffixes of a cloud
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloudSuffixes {
    pub storage_endpoint: Option<String>,
    pub sql_server_hostname: Option<String>,
    pub vault_dns: Option<String>,
}

#[allow(dead_code)]
impl CloudSuffixes {
    pub fn storage_endpoint(&self) -> CloudResult<&str> {
        self.require("storage_endpoint")
    }

    pub fn sql_server_hostname(&self) -> CloudResult<&str> {
        self.require("sql_server_hostname")
    }

    pub fn vault_dns(&self) -> CloudResult<&str> {
        self.require("vault_dns")
    }

    /// Raw value for a suffix name, `None` when unset or unknown
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "storage_endpoint" => &self.storage_endpoint,
            "sql_server_hostname" => &self.sql_server_hostname,
            "vault_dns" => &self.vault_dns,
            _ => return None,
        };
        value.as_deref()
    }

    /// Set a suffix by name; unknown names are ignored and return false
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        let slot = match name {
            "storage_endpoint" => &mut self.storage_endpoint,
            "sql_server_hostname" => &mut self.sql_server_hostname,
            "vault_dns" => &mut self.vault_dns,
            _ => return false,
        };
        *slot = Some(value.to_string());
        true
    }

    fn require(&self, name: &str) -> CloudResult<&str> {
        self.get(name)
            .ok_or_else(|| CloudError::SuffixNotSet(name.to_string()))
    }
}

/// A named deployment target: endpoints, suffixes and an API profile
#[derive(Debug, Clone, PartialEq)]
pub struct Cloud {
    pub name: String,
    pub profile: Option<String>,
    pub endpoints: CloudEndpoints,
    pub suffixes: CloudSuffixes,
    pub is_active: bool,
}

impl Cloud {
    /// Create an empty cloud definition with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile: None,
            endpoints: CloudEndpoints::default(),
            suffixes: CloudSuffixes::default(),
            is_active: false,
        }
    }
}

fn builtin(
    name: &str,
    domain: &str,
    gallery_and_batch: bool,
) -> Cloud {
    let endpoint = |host: &str| Some(format!("https://{}.{}", host, domain));
    Cloud {
        name: name.to_string(),
        profile: Some("latest".to_string()),
        endpoints: CloudEndpoints {
            management: endpoint("management"),
            resource_manager: endpoint("resources"),
            portal: endpoint("portal"),
            authentication: endpoint("login"),
            sql_management: endpoint("sql"),
            gallery: if gallery_and_batch {
                endpoint("gallery")
            } else {
                None
            },
            batch: if gallery_and_batch {
                endpoint("batch")
            } else {
                None
            },
        },
        suffixes: CloudSuffixes {
            storage_endpoint: Some(format!("storage.{}", domain)),
            sql_server_hostname: Some(format!(".sql.{}", domain)),
            vault_dns: Some(format!(".vault.{}", domain)),
        },
        is_active: false,
    }
}

lazy_static! {
    /// The public Stratus cloud; the default active cloud
    pub static ref STRATUS_PUBLIC_CLOUD: Cloud = builtin("StratusCloud", "stratus.cloud", true);

    /// The sovereign China deployment
    pub static ref STRATUS_CHINA_CLOUD: Cloud = builtin("StratusChinaCloud", "stratus.cn", true);

    /// The US government deployment
    pub static ref STRATUS_US_GOVERNMENT: Cloud =
        builtin("StratusUSGovernment", "stratus-gov.us", true);

    /// The German sovereign deployment; gallery and batch are not offered there
    pub static ref STRATUS_GERMAN_CLOUD: Cloud = builtin("StratusGermanCloud", "stratus.de", false);

    /// Built-in clouds in listing order
    pub static ref KNOWN_CLOUDS: Vec<&'static Cloud> = vec![
        &*STRATUS_PUBLIC_CLOUD,
        &*STRATUS_CHINA_CLOUD,
        &*STRATUS_US_GOVERNMENT,
        &*STRATUS_GERMAN_CLOUD,
    ];
}

/// Whether the given name is one of the built-in clouds
pub fn is_known_cloud(name: &str) -> bool {
    KNOWN_CLOUDS.iter().any(|c| c.name == name)
}
