//! Captured result of compiling and running one generated unit.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::parse::ParsedOutput;
use crate::emit::Language;

/// Toolchain phase a pipeline was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Compile,
    Execute,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Compile => f.write_str("compile"),
            Phase::Execute => f.write_str("execute"),
        }
    }
}

/// Terminal state of a language pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The unit ran to completion; its exit code and output are meaningful.
    Completed,
    /// The toolchain program could not be found.
    ToolchainMissing { program: String },
    /// The toolchain program exists but could not be started.
    SpawnFailed { program: String, reason: String },
    CompileFailed { exit_code: Option<i32> },
    /// The unit terminated abnormally (signal, runtime abort, task panic).
    Crashed { reason: String },
    TimedOut { phase: Phase, limit_ms: u64 },
    Cancelled { phase: Option<Phase> },
}

impl RunOutcome {
    /// Short stable tag for logs.
    pub fn tag(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::ToolchainMissing { .. } => "toolchain_missing",
            RunOutcome::SpawnFailed { .. } => "spawn_failed",
            RunOutcome::CompileFailed { .. } => "compile_failed",
            RunOutcome::Crashed { .. } => "crashed",
            RunOutcome::TimedOut { .. } => "timed_out",
            RunOutcome::Cancelled { .. } => "cancelled",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }

    /// Human-readable failure reason; `None` for `Completed`.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            RunOutcome::Completed => None,
            RunOutcome::ToolchainMissing { program } => {
                Some(format!("toolchain not found: {}", program))
            }
            RunOutcome::SpawnFailed { program, reason } => {
                Some(format!("failed to start {}: {}", program, reason))
            }
            RunOutcome::CompileFailed { exit_code } => Some(match exit_code {
                Some(code) => format!("compilation failed with exit code {}", code),
                None => "compilation terminated by signal".to_string(),
            }),
            RunOutcome::Crashed { reason } => Some(format!("crashed: {}", reason)),
            RunOutcome::TimedOut { phase, limit_ms } => {
                Some(format!("timed out during {} after {} ms", phase, limit_ms))
            }
            RunOutcome::Cancelled { phase: Some(phase) } => {
                Some(format!("cancelled during {}", phase))
            }
            RunOutcome::Cancelled { phase: None } => Some("cancelled before start".to_string()),
        }
    }
}

/// Result of one unit's pipeline. Created once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub language: Language,
    pub outcome: RunOutcome,
    /// Exit code of the last process that ran, `None` if none exited normally.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    /// Parsed view of `stdout`.
    pub parsed: ParsedOutput,
}

impl ExecutionResult {
    pub fn new(
        language: Language,
        outcome: RunOutcome,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration_ms: u64,
    ) -> Self {
        let parsed = ParsedOutput::parse(&stdout);
        Self {
            language,
            outcome,
            exit_code,
            stdout,
            stderr,
            duration_ms,
            parsed,
        }
    }

    /// A result for a pipeline that ended without producing usable output.
    pub fn failed(language: Language, outcome: RunOutcome, duration_ms: u64) -> Self {
        Self::new(language, outcome, None, String::new(), String::new(), duration_ms)
    }

    /// Result of a unit that exited with `exit_code`.
    ///
    /// A non-zero exit before any summary line was printed is a runtime crash
    /// (uncaught exception, panic outside a check), not a completed run.
    pub fn completed(language: Language, exit_code: i32, stdout: String, stderr: String, duration_ms: u64) -> Self {
        let mut result = Self::new(
            language,
            RunOutcome::Completed,
            Some(exit_code),
            stdout,
            stderr,
            duration_ms,
        );
        if exit_code != 0 && result.parsed.summary.is_none() {
            result.outcome = RunOutcome::Crashed {
                reason: format!("exited with code {} before printing a summary", exit_code),
            };
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_parses_stdout_on_creation() {
        let result = ExecutionResult::completed(
            Language::C,
            0,
            "[PASS] a\nTotal: 1 | Passed: 1 | Failed: 0\n".to_string(),
            String::new(),
            12,
        );
        assert_eq!(result.parsed.passed_count(), 1);
        assert!(result.outcome.is_completed());
        assert!(result.outcome.failure_reason().is_none());
    }

    #[test]
    fn test_nonzero_exit_without_summary_is_crash() {
        let result = ExecutionResult::completed(
            Language::Rust,
            101,
            "[PASS] string_length\n".to_string(),
            "thread 'main' panicked at dynamic_test.rs:40:5\n".to_string(),
            7,
        );
        assert_eq!(
            result.outcome,
            RunOutcome::Crashed {
                reason: "exited with code 101 before printing a summary".to_string()
            }
        );
        assert_eq!(result.exit_code, Some(101));
        assert_eq!(result.parsed.passed_count(), 1);
        assert!(result.stderr.contains("panicked"));
    }

    #[test]
    fn test_nonzero_exit_with_summary_stays_completed() {
        let result = ExecutionResult::completed(
            Language::Python,
            1,
            "[FAIL] a\nTotal: 1 | Passed: 0 | Failed: 1\n".to_string(),
            String::new(),
            4,
        );
        assert!(result.outcome.is_completed());

        let silent = ExecutionResult::completed(Language::C, 0, String::new(), String::new(), 1);
        assert!(silent.outcome.is_completed());
    }

    #[test]
    fn test_failure_reasons() {
        let missing = RunOutcome::ToolchainMissing {
            program: "javac".to_string(),
        };
        assert_eq!(missing.failure_reason().unwrap(), "toolchain not found: javac");
        assert_eq!(missing.tag(), "toolchain_missing");

        let timed_out = RunOutcome::TimedOut {
            phase: Phase::Execute,
            limit_ms: 500,
        };
        assert_eq!(
            timed_out.failure_reason().unwrap(),
            "timed out during execute after 500 ms"
        );
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let json = serde_json::to_value(RunOutcome::CompileFailed { exit_code: Some(1) }).unwrap();
        assert_eq!(json["kind"], "compile_failed");
        assert_eq!(json["exit_code"], 1);
    }
}
