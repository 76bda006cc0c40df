//! Registry of supported API profiles
//!
//! A profile tag selects the set of service API versions a cloud speaks.
//! Clouds that do not declare one default to `latest`.

/// Profile assigned to clouds that do not declare one
pub const LATEST_PROFILE: &str = "latest";

/// Registry of API profile tags this tool supports
pub struct ApiProfileRegistry {
    profiles: Vec<&'static str>,
}

impl ApiProfileRegistry {
    /// Create a registry with all supported profiles
    pub fn new() -> Self {
        Self {
            profiles: vec![
                LATEST_PROFILE,
                "2019-07-01",
                "2018-06-01",
                "2018-01-01",
                "2017-03-09",
            ],
        }
    }

    /// Check if a profile tag is supported
    pub fn is_supported(&self, profile: &str) -> bool {
        self.profiles.contains(&profile)
    }

    /// Get the list of supported profile tags
    #[allow(dead_code)]
    pub fn supported_profiles(&self) -> &[&'static str] {
        &self.profiles
    }
}

impl Default for ApiProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}
