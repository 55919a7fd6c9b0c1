//! Error taxonomy for specification-level misuse.
//!
//! Only these errors are returned synchronously to a caller. Toolchain and
//! parse problems are captured as data in `ExecutionResult` / `AggregateReport`.

/// Errors raised while building a test specification, before any emission.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("invalid seed {input:?}: expected a decimal or 0x-prefixed hex u64")]
    InvalidSeed { input: String },

    #[error("dynamic case count must be positive")]
    ZeroDynamicCases,

    #[error("dynamic case count {requested} exceeds the limit of {limit}")]
    TooManyDynamicCases { requested: usize, limit: usize },

    #[error("no target languages requested")]
    NoLanguages,

    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("invalid case name {0:?}: only ASCII letters, digits and '_' are allowed")]
    InvalidCaseName(String),

    #[error("duplicate case name: {0}")]
    DuplicateCaseName(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for specification operations.
pub type Result<T> = std::result::Result<T, SpecError>;
