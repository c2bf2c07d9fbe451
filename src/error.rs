//! Errors raised while loading and validating a project

use thiserror::Error;

/// Errors that make a project unusable before compilation starts
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Failed to read project file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse project JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse project TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported project file extension '{0}' (expected .json or .toml)")]
    UnsupportedFormat(String),

    /// Room or item data that cannot describe a real layout
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("duplicate equipment id '{0}'")]
    DuplicateId(String),
}

impl ProjectError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
