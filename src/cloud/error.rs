use crate::config::CLOUD_CONFIG_FILENAME;
use std::fmt;

/// Error types for cloud registry operations
#[derive(Debug)]
pub enum CloudError {
    /// Operation referenced a cloud name that is not registered
    NotRegistered(String),

    /// Registration collided with an existing cloud name
    AlreadyRegistered(String),

    /// Removal targeted the active cloud or a built-in cloud
    CannotUnregister { name: String, reason: String },

    /// An endpoint was read but never configured for this cloud
    EndpointNotSet(String),

    /// A suffix was read but never configured for this cloud
    SuffixNotSet(String),

    /// The resolved API profile is not in the supported set
    UnsupportedProfile(String),

    /// Configuration file could not be parsed
    Config(String),

    /// File system operation failed
    FileSystem(String),
}

impl fmt::Display for CloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudError::NotRegistered(name) => {
                write!(f, "The cloud '{}' is not registered.", name)
            }
            CloudError::AlreadyRegistered(name) => {
                write!(f, "The cloud '{}' is already registered.", name)
            }
            CloudError::CannotUnregister { name, reason } => {
                write!(
                    f,
                    "The cloud '{}' cannot be unregistered as {}.",
                    name, reason
                )
            }
            CloudError::EndpointNotSet(name) => {
                write!(
                    f,
                    "The endpoint '{}' for this cloud is not set but is used.\n\
                     {} may be corrupt or invalid.\n\
                     Resolve the error or delete this file and try again.",
                    name, CLOUD_CONFIG_FILENAME
                )
            }
            CloudError::SuffixNotSet(name) => {
                write!(
                    f,
                    "The suffix '{}' for this cloud is not set but is used.\n\
                     {} may be corrupt or invalid.\n\
                     Resolve the error or delete this file and try again.",
                    name, CLOUD_CONFIG_FILENAME
                )
            }
            CloudError::UnsupportedProfile(profile) => {
                write!(
                    f,
                    "Profile '{}' does not exist or is not supported.",
                    profile
                )
            }
            CloudError::Config(msg) => {
                write!(f, "Failed to parse configuration: {}", msg)
            }
            CloudError::FileSystem(msg) => {
                write!(f, "File system error: {}", msg)
            }
        }
    }
}

impl std::error::Error for CloudError {}

/// Result type for cloud registry operations
pub type CloudResult<T> = Result<T, CloudError>;
