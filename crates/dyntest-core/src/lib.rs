//! dyntest-core: deterministic cross-language test generation.
//!
//! One seeded [`TestSuiteSpec`] is rendered by every [`Emitter`] into a
//! runnable source unit. Units print a fixed PASS/FAIL line grammar which
//! [`ParsedOutput`] reads back and [`AggregateReport`] combines into a single
//! verdict and exit code.

pub mod digest;
pub mod emit;
pub mod error;
pub mod model;
pub mod obs;
pub mod report;
pub mod stream;
pub mod telemetry;

pub use emit::{emitter_for, render_all, Emitter, GeneratedUnit, Language};
pub use error::{Result, SpecError};
pub use model::{
    Applicability, ArithOp, ArithmeticModel, Category, DivisionByZero, Expression,
    OverflowSemantics, StaticCheck, TestCase, TestSuiteSpec, MAX_DYNAMIC_CASES,
};
pub use report::{
    render_text, AggregateReport, ConsistencyIssue, ExecutionResult, LanguageReport,
    ParityMismatch, ParsedOutput, Phase, ReportStatus, RunOutcome, TestOutcome,
};
pub use stream::{operands, Seed, OPERAND_BOUND};
