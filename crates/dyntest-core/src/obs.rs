//! Structured observability hooks for the generate/run/aggregate lifecycle.
//!
//! Events are emitted at `info!` level unless noted. Field names are stable so
//! JSON log output (`--json`) can be consumed by log pipelines.

use tracing::info;

/// RAII guard that enters a run-scoped tracing span for the duration of a run.
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run id and seed.
    pub fn enter(run_id: &str, seed: u64) -> Self {
        Self {
            _span: run_span(run_id, seed).entered(),
        }
    }
}

/// The run-scoped span, for instrumenting async work with
/// [`tracing::Instrument`].
pub fn run_span(run_id: &str, seed: u64) -> tracing::Span {
    tracing::info_span!("dyntest.run", run_id = %run_id, seed = seed)
}

/// Emit event: a test suite specification was generated.
pub fn emit_suite_generated(seed: u64, spec_digest: &str, static_cases: usize, dynamic_cases: usize) {
    info!(
        event = "suite.generated",
        seed = seed,
        spec_digest = %spec_digest,
        static_cases = static_cases,
        dynamic_cases = dynamic_cases,
    );
}

/// Emit event: a unit was rendered for one language.
pub fn emit_unit_rendered(language: &str, content_hash: &str, emitted: usize, skipped: usize) {
    info!(
        event = "unit.rendered",
        language = %language,
        content_hash = %content_hash,
        emitted = emitted,
        skipped = skipped,
    );
}

/// Emit event: a language pipeline acquired its slot and is starting.
pub fn emit_pipeline_started(language: &str) {
    info!(event = "pipeline.started", language = %language);
}

/// Emit event: a language pipeline reached a terminal outcome.
pub fn emit_pipeline_finished(language: &str, outcome: &str, duration_ms: u64, exit_code: Option<i32>) {
    info!(
        event = "pipeline.finished",
        language = %language,
        outcome = %outcome,
        duration_ms = duration_ms,
        exit_code = ?exit_code,
    );
}

/// Emit event: the aggregate report was built.
pub fn emit_report_built(run_id: &str, total_passed: u32, total_failed: u32, exit_code: i32) {
    info!(
        event = "report.built",
        run_id = %run_id,
        total_passed = total_passed,
        total_failed = total_failed,
        exit_code = exit_code,
    );
}

/// Emit event: a consistency problem in captured output (warning level).
pub fn emit_consistency_issue(language: &str, issue: &dyn std::fmt::Display) {
    tracing::warn!(event = "report.consistency_issue", language = %language, issue = %issue);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        let _span = RunSpan::enter("test-run-id", 42);
    }
}
