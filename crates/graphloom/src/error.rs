use std::path::PathBuf;

use graphloom_schema::SchemaError;

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Config error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Failures of [`build`](crate::build) and [`SchemaHandle::reload`](crate::SchemaHandle::reload).
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BuildError {
    /// Validation issues of a failed schema build, if any.
    #[must_use]
    pub fn issues(&self) -> &[graphloom_schema::ValidationIssue] {
        match self {
            Self::Schema(err) => err.issues(),
            Self::Config(_) => &[],
        }
    }
}
