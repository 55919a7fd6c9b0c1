//! End-to-end regeneration: generate, render, run every language, aggregate.

use std::sync::Arc;

use dyntest_core::obs;
use dyntest_core::report::ReportStatus;
use dyntest_core::{
    render_all, AggregateReport, ExecutionResult, Language, RunOutcome, Seed, SpecError,
    TestSuiteSpec,
};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::cancel::CancelSignal;
use crate::config::HarnessConfig;
use crate::error::Result;
use crate::runner::{ProcessRunner, RunLimits, UnitRunner};

/// Inputs of one regeneration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegenerateRequest {
    pub seed: Seed,
    pub dynamic_cases: usize,
    /// Target languages in report order. Duplicates are ignored.
    pub languages: Vec<Language>,
}

impl RegenerateRequest {
    pub fn new(seed: Seed, dynamic_cases: usize, languages: Vec<Language>) -> Self {
        Self {
            seed,
            dynamic_cases,
            languages,
        }
    }

    fn distinct_languages(&self) -> std::result::Result<Vec<Language>, SpecError> {
        let mut out: Vec<Language> = Vec::with_capacity(self.languages.len());
        for lang in &self.languages {
            if !out.contains(lang) {
                out.push(*lang);
            }
        }
        if out.is_empty() {
            return Err(SpecError::NoLanguages);
        }
        Ok(out)
    }
}

/// Drives regenerations with a fixed configuration and runner.
pub struct Harness {
    config: HarnessConfig,
    runner: Arc<dyn UnitRunner>,
}

impl Harness {
    pub fn new(config: HarnessConfig, runner: Arc<dyn UnitRunner>) -> Self {
        Self { config, runner }
    }

    /// Harness backed by real toolchain processes.
    pub fn with_process_runner(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        let runner = ProcessRunner::from_config(&config)?;
        Ok(Self::new(config, Arc::new(runner)))
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Generate the suite, run it in every requested language and aggregate.
    ///
    /// Specification errors are returned before anything is spawned. Every
    /// other failure ends up in the report.
    pub async fn regenerate(
        &self,
        request: &RegenerateRequest,
        cancel: CancelSignal,
    ) -> Result<AggregateReport> {
        let languages = request.distinct_languages()?;
        let spec = TestSuiteSpec::generate(request.seed, request.dynamic_cases)?;
        let run_id = Uuid::new_v4();
        let span = obs::run_span(&run_id.to_string(), request.seed.value());

        async move {
            let units: Vec<_> = render_all(&spec, &languages).into_iter().map(Arc::new).collect();
            info!(
                languages = units.len(),
                max_concurrent = self.config.max_concurrent,
                "starting pipelines"
            );

            let limits = RunLimits::new(self.config.timeout());
            let sem = Arc::new(Semaphore::new(self.config.max_concurrent));

            let mut tasks = Vec::with_capacity(units.len());
            for unit in &units {
                let unit = Arc::clone(unit);
                let runner = Arc::clone(&self.runner);
                let sem = Arc::clone(&sem);
                let cancel = cancel.clone();

                let task = tokio::spawn(
                    async move {
                        let language = unit.language;
                        let _permit = tokio::select! {
                            permit = sem.acquire_owned() => permit.ok(),
                            _ = cancel.cancelled() => None,
                        };
                        if cancel.is_cancelled() {
                            return ExecutionResult::failed(
                                language,
                                RunOutcome::Cancelled { phase: None },
                                0,
                            );
                        }

                        obs::emit_pipeline_started(language.id());
                        let result = runner.compile_and_run(&unit, &limits, &cancel).await;
                        obs::emit_pipeline_finished(
                            language.id(),
                            result.outcome.tag(),
                            result.duration_ms,
                            result.exit_code,
                        );
                        result
                    }
                    .in_current_span(),
                );
                tasks.push(task);
            }

            let results: Vec<ExecutionResult> = join_all(tasks)
                .await
                .into_iter()
                .zip(&units)
                .map(|(joined, unit)| match joined {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(language = %unit.language, error = %e, "pipeline task failed");
                        ExecutionResult::failed(
                            unit.language,
                            RunOutcome::Crashed {
                                reason: format!("pipeline task failed: {}", e),
                            },
                            0,
                        )
                    }
                })
                .collect();

            let status = if cancel.is_cancelled() {
                ReportStatus::Cancelled
            } else {
                ReportStatus::Completed
            };
            let units: Vec<_> = units.iter().map(|u| u.as_ref().clone()).collect();
            Ok(AggregateReport::build(run_id, &spec, &units, results, status))
        }
        .instrument(span)
        .await
    }
}

/// Regenerate with default configuration and the builtin toolchains.
pub async fn regenerate(
    seed: Seed,
    dynamic_cases: usize,
    languages: Vec<Language>,
) -> Result<AggregateReport> {
    let harness = Harness::with_process_runner(HarnessConfig::default())?;
    harness
        .regenerate(
            &RegenerateRequest::new(seed, dynamic_cases, languages),
            CancelSignal::never(),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dyntest_core::GeneratedUnit;

    struct PanickingRunner;

    #[async_trait]
    impl UnitRunner for PanickingRunner {
        async fn compile_and_run(
            &self,
            unit: &GeneratedUnit,
            _limits: &RunLimits,
            _cancel: &CancelSignal,
        ) -> ExecutionResult {
            panic!("runner exploded for {}", unit.language);
        }
    }

    #[test]
    fn test_request_rejects_empty_languages() {
        let request = RegenerateRequest::new(Seed(1), 1, Vec::new());
        assert!(matches!(request.distinct_languages(), Err(SpecError::NoLanguages)));
    }

    #[test]
    fn test_request_dedupes_languages() {
        let request = RegenerateRequest::new(
            Seed(1),
            1,
            vec![Language::C, Language::Python, Language::C],
        );
        assert_eq!(
            request.distinct_languages().unwrap(),
            vec![Language::C, Language::Python]
        );
    }

    #[tokio::test]
    async fn test_task_panic_becomes_crash() {
        let harness = Harness::new(HarnessConfig::default(), Arc::new(PanickingRunner));
        let request = RegenerateRequest::new(Seed(3), 2, vec![Language::Python]);
        let report = harness.regenerate(&request, CancelSignal::never()).await.unwrap();

        let py = report.language(Language::Python).unwrap();
        assert!(matches!(py.outcome, RunOutcome::Crashed { .. }));
        assert!(py.failure_reason.as_deref().unwrap().contains("pipeline task failed"));
        assert_eq!(report.exit_code, 1);
    }

    #[tokio::test]
    async fn test_spec_errors_surface_before_running() {
        let harness = Harness::new(HarnessConfig::default(), Arc::new(PanickingRunner));
        let request = RegenerateRequest::new(Seed(3), 0, vec![Language::Python]);
        let err = harness.regenerate(&request, CancelSignal::never()).await.unwrap_err();
        assert!(matches!(err, crate::HarnessError::Spec(SpecError::ZeroDynamicCases)));
    }
}
