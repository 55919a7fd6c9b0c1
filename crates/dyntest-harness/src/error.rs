//! Harness error taxonomy.
//!
//! Only setup problems surface as errors. Anything that goes wrong while a
//! unit compiles or runs is recorded as a `RunOutcome` instead.

use std::path::PathBuf;

use dyntest_core::SpecError;

/// Errors loading or validating harness configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("invalid toolchain for {language}: {reason}")]
    InvalidToolchain { language: String, reason: String },

    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// Errors writing generated units or reports to disk.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ArtifactError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArtifactError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Top-level harness errors.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
