//! Execution results, output parsing and cross-language aggregation.

pub mod aggregate;
pub mod execution;
pub mod parse;
pub mod render;

pub use aggregate::{
    AggregateReport, ConsistencyIssue, LanguageReport, ParityMismatch, ReportStatus,
    CANCELLED_EXIT_CODE,
};
pub use execution::{ExecutionResult, Phase, RunOutcome};
pub use parse::{ParsedOutput, ReportedSummary, TestOutcome};
pub use render::render_text;
