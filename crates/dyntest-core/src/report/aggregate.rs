//! Cross-language aggregation of execution results.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::execution::{ExecutionResult, RunOutcome};
use super::parse::{ReportedSummary, TestOutcome};
use crate::emit::{GeneratedUnit, Language};
use crate::model::TestSuiteSpec;
use crate::obs;
use crate::stream::Seed;

/// Exit code of a cancelled run, matching the shell convention for SIGINT.
pub const CANCELLED_EXIT_CODE: i32 = 130;

/// A disagreement between what a unit printed and what it should have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyIssue {
    MissingSummary,
    /// Summary counts differ from the `[PASS]`/`[FAIL]` line counts.
    SummaryMismatch {
        reported: ReportedSummary,
        counted_passed: u32,
        counted_failed: u32,
    },
    /// Exit status disagrees with the failed count.
    ExitCodeMismatch { exit_code: i32, failed: u32 },
    /// Emitted but never reported.
    MissingTests { names: Vec<String> },
    /// Reported but never emitted.
    UnexpectedTests { names: Vec<String> },
    DuplicateTests { names: Vec<String> },
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyIssue::MissingSummary => f.write_str("summary line missing"),
            ConsistencyIssue::SummaryMismatch {
                reported,
                counted_passed,
                counted_failed,
            } => write!(
                f,
                "parser mismatch: summary says {} passed / {} failed, lines say {} / {}",
                reported.passed, reported.failed, counted_passed, counted_failed
            ),
            ConsistencyIssue::ExitCodeMismatch { exit_code, failed } => write!(
                f,
                "exit code {} inconsistent with {} failed test(s)",
                exit_code, failed
            ),
            ConsistencyIssue::MissingTests { names } => {
                write!(f, "tests not reported: {}", names.join(", "))
            }
            ConsistencyIssue::UnexpectedTests { names } => {
                write!(f, "unexpected tests reported: {}", names.join(", "))
            }
            ConsistencyIssue::DuplicateTests { names } => {
                write!(f, "tests reported more than once: {}", names.join(", "))
            }
        }
    }
}

/// Per-language section of the aggregate report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageReport {
    pub language: Language,
    pub outcome: RunOutcome,
    pub exit_code: Option<i32>,
    pub passed: u32,
    pub failed: u32,
    /// Number of cases emitted into the unit.
    pub emitted: usize,
    /// Cases skipped as inapplicable for this language.
    pub skipped: Vec<String>,
    pub outcomes: Vec<TestOutcome>,
    pub issues: Vec<ConsistencyIssue>,
    /// Why this language counts as failing, `None` when it succeeded.
    pub failure_reason: Option<String>,
    pub duration_ms: u64,
    pub content_hash: String,
}

impl LanguageReport {
    fn from_result(unit: &GeneratedUnit, result: ExecutionResult) -> Self {
        let issues = if result.outcome.is_completed() {
            consistency_issues(unit, &result)
        } else {
            Vec::new()
        };
        for issue in &issues {
            obs::emit_consistency_issue(unit.language.id(), issue);
        }

        let passed = result.parsed.passed_count();
        let failed = result.parsed.failed_count();
        let failure_reason = match result.outcome.failure_reason() {
            Some(reason) => Some(reason),
            None if !issues.is_empty() => {
                let first = issues.first().map(|i| i.to_string()).unwrap_or_default();
                Some(format!("inconsistent output: {}", first))
            }
            None if failed > 0 => Some(format!("{} test(s) failed", failed)),
            None => match result.exit_code {
                Some(0) => None,
                Some(code) => Some(format!("exited with code {}", code)),
                None => Some("no exit code recorded".to_string()),
            },
        };

        Self {
            language: unit.language,
            outcome: result.outcome,
            exit_code: result.exit_code,
            passed,
            failed,
            emitted: unit.emitted.len(),
            skipped: unit.skipped.clone(),
            outcomes: result.parsed.outcomes,
            issues,
            failure_reason,
            duration_ms: result.duration_ms,
            content_hash: unit.content_hash.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure_reason.is_none()
    }

    /// Contribution to the overall exit code.
    pub fn exit_contribution(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn outcome_of(&self, name: &str) -> Option<bool> {
        self.outcomes.iter().find(|o| o.name == name).map(|o| o.passed)
    }
}

fn consistency_issues(unit: &GeneratedUnit, result: &ExecutionResult) -> Vec<ConsistencyIssue> {
    let parsed = &result.parsed;
    let mut issues = Vec::new();

    match parsed.summary {
        None => issues.push(ConsistencyIssue::MissingSummary),
        Some(reported) if parsed.counts_mismatch() => issues.push(ConsistencyIssue::SummaryMismatch {
            reported,
            counted_passed: parsed.passed_count(),
            counted_failed: parsed.failed_count(),
        }),
        Some(_) => {}
    }

    if let Some(code) = result.exit_code {
        if (code != 0) != parsed.expects_nonzero_exit() {
            let failed = parsed
                .summary
                .map(|s| s.failed)
                .unwrap_or_else(|| parsed.failed_count());
            issues.push(ConsistencyIssue::ExitCodeMismatch {
                exit_code: code,
                failed,
            });
        }
    }

    let emitted: HashSet<&str> = unit.emitted.iter().map(String::as_str).collect();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for outcome in &parsed.outcomes {
        *seen.entry(outcome.name.as_str()).or_default() += 1;
    }

    let missing: Vec<String> = unit
        .emitted
        .iter()
        .filter(|n| !seen.contains_key(n.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        issues.push(ConsistencyIssue::MissingTests { names: missing });
    }

    let mut unexpected = Vec::new();
    let mut duplicates = Vec::new();
    let mut reported_once = HashSet::new();
    for outcome in &parsed.outcomes {
        let name = outcome.name.as_str();
        if !reported_once.insert(name) {
            continue;
        }
        if !emitted.contains(name) {
            unexpected.push(name.to_string());
        }
        if seen.get(name).copied().unwrap_or(0) > 1 {
            duplicates.push(name.to_string());
        }
    }
    if !unexpected.is_empty() {
        issues.push(ConsistencyIssue::UnexpectedTests { names: unexpected });
    }
    if !duplicates.is_empty() {
        issues.push(ConsistencyIssue::DuplicateTests { names: duplicates });
    }

    issues
}

/// A dynamic case whose outcome differs between languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParityMismatch {
    pub case: String,
    /// Reported pass/fail per language that emitted and reported the case.
    pub outcomes: BTreeMap<Language, bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Completed,
    Cancelled,
}

/// Unified cross-language report for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub seed: Seed,
    pub spec_digest: String,
    pub dynamic_cases: usize,
    pub status: ReportStatus,
    /// One entry per requested language.
    pub languages: BTreeMap<Language, LanguageReport>,
    pub parity_mismatches: Vec<ParityMismatch>,
    pub total_passed: u32,
    pub total_failed: u32,
    /// Passed cases over emitted cases, across all languages.
    pub success_rate: f64,
    pub exit_code: i32,
}

impl AggregateReport {
    /// Combine every pipeline's result into a report.
    ///
    /// `units` defines the requested languages. A unit without a matching
    /// result is reported as crashed.
    pub fn build(
        run_id: Uuid,
        spec: &TestSuiteSpec,
        units: &[GeneratedUnit],
        results: Vec<ExecutionResult>,
        status: ReportStatus,
    ) -> Self {
        let mut by_language: HashMap<Language, ExecutionResult> =
            results.into_iter().map(|r| (r.language, r)).collect();

        let mut languages = BTreeMap::new();
        for unit in units {
            let result = by_language.remove(&unit.language).unwrap_or_else(|| {
                ExecutionResult::failed(
                    unit.language,
                    RunOutcome::Crashed {
                        reason: "no execution result recorded".to_string(),
                    },
                    0,
                )
            });
            languages.insert(unit.language, LanguageReport::from_result(unit, result));
        }

        let parity_mismatches = parity_mismatches(spec, &languages);
        let total_passed: u32 = languages.values().map(|l| l.passed).sum();
        let total_failed: u32 = languages.values().map(|l| l.failed).sum();
        let total_emitted: usize = languages.values().map(|l| l.emitted).sum();
        let success_rate = if total_emitted == 0 {
            0.0
        } else {
            f64::from(total_passed) / total_emitted as f64
        };

        let exit_code = match status {
            ReportStatus::Cancelled => CANCELLED_EXIT_CODE,
            ReportStatus::Completed => languages
                .values()
                .map(LanguageReport::exit_contribution)
                .max()
                .unwrap_or(0),
        };

        obs::emit_report_built(&run_id.to_string(), total_passed, total_failed, exit_code);

        Self {
            run_id,
            generated_at: Utc::now(),
            seed: spec.seed(),
            spec_digest: spec.spec_digest().to_string(),
            dynamic_cases: spec.dynamic_count(),
            status,
            languages,
            parity_mismatches,
            total_passed,
            total_failed,
            success_rate,
            exit_code,
        }
    }

    pub fn language(&self, language: Language) -> Option<&LanguageReport> {
        self.languages.get(&language)
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

fn parity_mismatches(
    spec: &TestSuiteSpec,
    languages: &BTreeMap<Language, LanguageReport>,
) -> Vec<ParityMismatch> {
    spec.cases()
        .iter()
        .filter(|c| c.is_dynamic())
        .filter_map(|case| {
            let outcomes: BTreeMap<Language, bool> = languages
                .values()
                .filter_map(|l| l.outcome_of(&case.name).map(|passed| (l.language, passed)))
                .collect();
            let mut values = outcomes.values();
            let first = values.next()?;
            if values.all(|v| v == first) {
                None
            } else {
                Some(ParityMismatch {
                    case: case.name.clone(),
                    outcomes,
                })
            }
        })
        .collect()
}
