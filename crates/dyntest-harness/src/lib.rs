//! dyntest-harness: runs generated units through real toolchains.
//!
//! Provides:
//! - Toolchain definitions with per-language overrides from TOML config
//! - A process-backed [`UnitRunner`] with timeouts and cancellation
//! - The [`Harness::regenerate`] pipeline that runs languages concurrently
//!   and aggregates their results
//! - Atomic writing of generated units and JSON reports

pub mod artifacts;
pub mod cancel;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod runner;
pub mod toolchain;

pub use artifacts::{write_report_json, write_units, ArtifactManifest, ManifestEntry};
pub use cancel::{CancelSignal, CancelSource};
pub use config::HarnessConfig;
pub use error::{ArtifactError, ConfigError, HarnessError, Result};
pub use pipeline::{regenerate, Harness, RegenerateRequest};
pub use runner::{ProcessRunner, RunLimits, UnitRunner};
pub use toolchain::{CommandContext, ToolchainSpec};
