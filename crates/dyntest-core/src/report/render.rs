//! Plain-text rendering of an [`AggregateReport`] for terminals and CI logs.

use std::fmt::Write;

use super::aggregate::{AggregateReport, ReportStatus};
use crate::digest::short;

/// Render `report` as a human-readable summary.
pub fn render_text(report: &AggregateReport) -> String {
    let mut out = String::new();
    let status = match report.status {
        ReportStatus::Completed => "completed",
        ReportStatus::Cancelled => "cancelled",
    };

    let _ = writeln!(out, "Dynamic test run {}", report.run_id);
    let _ = writeln!(
        out,
        "Seed: {} | Spec digest: {} | Dynamic cases: {} | Status: {}",
        report.seed,
        short(&report.spec_digest),
        report.dynamic_cases,
        status
    );
    out.push('\n');

    let width = report
        .languages
        .keys()
        .map(|l| l.display_name().len())
        .max()
        .unwrap_or(0);
    for lang in report.languages.values() {
        let verdict = if lang.is_success() { "PASS" } else { "FAIL" };
        let exit = lang
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<width$}  {}  passed={} failed={} skipped={} exit={} ({} ms)",
            lang.language.display_name(),
            verdict,
            lang.passed,
            lang.failed,
            lang.skipped.len(),
            exit,
            lang.duration_ms,
            width = width
        );
        if let Some(reason) = &lang.failure_reason {
            let _ = writeln!(out, "    reason: {}", reason);
        }
        for issue in &lang.issues {
            let _ = writeln!(out, "    issue: {}", issue);
        }
        for outcome in lang.outcomes.iter().filter(|o| !o.passed) {
            let _ = writeln!(out, "    failed: {}", outcome.name);
        }
    }

    if !report.parity_mismatches.is_empty() {
        out.push_str("\nParity mismatches:\n");
        for mismatch in &report.parity_mismatches {
            let detail: Vec<String> = mismatch
                .outcomes
                .iter()
                .map(|(lang, passed)| format!("{}={}", lang, if *passed { "pass" } else { "fail" }))
                .collect();
            let _ = writeln!(out, "  {}: {}", mismatch.case, detail.join(", "));
        }
    }

    let _ = writeln!(
        out,
        "\nTotal: {} | Passed: {} | Failed: {} | Success rate: {:.1}%",
        report.total_passed + report.total_failed,
        report.total_passed,
        report.total_failed,
        report.success_rate * 100.0
    );
    let _ = writeln!(out, "Exit code: {}", report.exit_code);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{emitter_for, Language};
    use crate::model::TestSuiteSpec;
    use crate::report::execution::{ExecutionResult, RunOutcome};
    use crate::stream::Seed;
    use uuid::Uuid;

    #[test]
    fn test_render_text_mentions_every_language() {
        let spec = TestSuiteSpec::generate(Seed(7), 2).unwrap();
        let units: Vec<_> = [Language::C, Language::Java]
            .iter()
            .map(|l| emitter_for(*l).render(&spec))
            .collect();
        let results = vec![ExecutionResult::failed(
            Language::Java,
            RunOutcome::ToolchainMissing {
                program: "javac".to_string(),
            },
            0,
        )];
        let report = AggregateReport::build(
            Uuid::new_v4(),
            &spec,
            &units,
            results,
            ReportStatus::Completed,
        );
        let text = render_text(&report);

        assert!(text.contains("Seed: 7"));
        assert!(text.contains("Java  FAIL"));
        assert!(text.contains("reason: toolchain not found: javac"));
        assert!(text.contains("C     FAIL"));
        assert!(text.contains("Exit code: 1"));
    }
}
