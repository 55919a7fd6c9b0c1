//! Lifecycle events are emitted under their stable names.

use dyntest_core::obs::{
    emit_consistency_issue, emit_pipeline_finished, emit_pipeline_started, emit_report_built,
    emit_suite_generated, emit_unit_rendered, RunSpan,
};
use dyntest_core::{render_all, ConsistencyIssue, Language, Seed, TestSuiteSpec};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_suite_generated() {
    emit_suite_generated(42, "deadbeef", 12, 5);
    assert!(logs_contain("suite.generated"));
    assert!(logs_contain("deadbeef"));
}

#[traced_test]
#[test]
fn test_emit_unit_rendered() {
    emit_unit_rendered("python", "abc123", 15, 4);
    assert!(logs_contain("unit.rendered"));
    assert!(logs_contain("abc123"));
}

#[traced_test]
#[test]
fn test_emit_pipeline_events() {
    emit_pipeline_started("c");
    emit_pipeline_finished("c", "completed", 250, Some(0));
    emit_pipeline_finished("java", "toolchain_missing", 1, None);
    assert!(logs_contain("pipeline.started"));
    assert!(logs_contain("pipeline.finished"));
    assert!(logs_contain("toolchain_missing"));
}

#[traced_test]
#[test]
fn test_emit_report_built_and_issue() {
    emit_report_built("run-1", 30, 1, 1);
    emit_consistency_issue("rust", &ConsistencyIssue::MissingSummary);
    assert!(logs_contain("report.built"));
    assert!(logs_contain("report.consistency_issue"));
    assert!(logs_contain("summary line missing"));
}

#[traced_test]
#[test]
fn test_generation_inside_run_span() {
    let span = RunSpan::enter("run-span-test", 42);
    let spec = TestSuiteSpec::generate(Seed(42), 3).unwrap();
    render_all(&spec, &[Language::Rust]);
    drop(span);

    assert_eq!(spec.dynamic_count(), 3);
    assert!(logs_contain("dyntest.run"));
    assert!(logs_contain("run-span-test"));
    assert!(logs_contain("suite.generated"));
    assert!(logs_contain("unit.rendered"));
}
