//! Parser for the PASS/FAIL line grammar every generated unit prints.
//!
//! ```text
//! [PASS] <name>
//! [FAIL] <name>
//! Total: N | Passed: P | Failed: F
//! ```
//!
//! Any other line is ignored. When more than one summary line is present the
//! last one wins.

use serde::{Deserialize, Serialize};

const PASS_PREFIX: &str = "[PASS] ";
const FAIL_PREFIX: &str = "[FAIL] ";

/// Outcome of one reported test line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub name: String,
    pub passed: bool,
}

/// Counts printed on the summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedSummary {
    pub passed: u32,
    pub failed: u32,
}

/// Structured view of a unit's stdout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedOutput {
    /// Test lines in the order they were printed.
    pub outcomes: Vec<TestOutcome>,
    pub summary: Option<ReportedSummary>,
}

impl ParsedOutput {
    pub fn parse(stdout: &str) -> Self {
        let mut parsed = ParsedOutput::default();
        for raw in stdout.lines() {
            let line = raw.trim_end_matches('\r');
            if let Some(name) = line.strip_prefix(PASS_PREFIX) {
                parsed.push(name, true);
            } else if let Some(name) = line.strip_prefix(FAIL_PREFIX) {
                parsed.push(name, false);
            } else if let Some(summary) = parse_summary(line) {
                parsed.summary = Some(summary);
            }
        }
        parsed
    }

    fn push(&mut self, name: &str, passed: bool) {
        let name = name.trim();
        if !name.is_empty() {
            self.outcomes.push(TestOutcome {
                name: name.to_string(),
                passed,
            });
        }
    }

    /// Number of `[PASS]` lines.
    pub fn passed_count(&self) -> u32 {
        self.outcomes.iter().filter(|o| o.passed).count() as u32
    }

    /// Number of `[FAIL]` lines.
    pub fn failed_count(&self) -> u32 {
        self.outcomes.iter().filter(|o| !o.passed).count() as u32
    }

    /// Whether the line counts disagree with the summary line.
    pub fn counts_mismatch(&self) -> bool {
        match self.summary {
            Some(s) => s.passed != self.passed_count() || s.failed != self.failed_count(),
            None => false,
        }
    }

    /// Whether a conforming unit with this output must exit non-zero.
    /// Falls back to the line counts when the summary line is missing.
    pub fn expects_nonzero_exit(&self) -> bool {
        match self.summary {
            Some(s) => s.failed > 0,
            None => self.failed_count() > 0,
        }
    }

    pub fn outcome(&self, name: &str) -> Option<&TestOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

fn parse_summary(line: &str) -> Option<ReportedSummary> {
    let passed = count_after(line, "Passed:")?;
    let failed = count_after(line, "Failed:")?;
    Some(ReportedSummary { passed, failed })
}

fn count_after(line: &str, label: &str) -> Option<u32> {
    let start = line.find(label)? + label.len();
    let digits: String = line[start..]
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
