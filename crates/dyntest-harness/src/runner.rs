//! Compile-and-run execution of generated units.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dyntest_core::{ExecutionResult, GeneratedUnit, Language, Phase, RunOutcome};
use tokio::process::Command;
use tracing::debug;

use crate::cancel::CancelSignal;
use crate::config::HarnessConfig;
use crate::error::ConfigError;
use crate::toolchain::{CommandContext, ToolchainSpec};

/// Per-unit resource limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    /// Shared by the compile and run steps.
    pub timeout: Duration,
}

impl RunLimits {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Compiles and runs one generated unit.
///
/// Implementations never fail: every problem is folded into the returned
/// result's [`RunOutcome`].
#[async_trait]
pub trait UnitRunner: Send + Sync {
    async fn compile_and_run(
        &self,
        unit: &GeneratedUnit,
        limits: &RunLimits,
        cancel: &CancelSignal,
    ) -> ExecutionResult;
}

/// Runs units as child processes of the configured toolchains, each in a
/// scratch directory that is removed when the run ends.
pub struct ProcessRunner {
    toolchains: BTreeMap<Language, ToolchainSpec>,
    work_root: Option<PathBuf>,
}

impl ProcessRunner {
    /// Builtin toolchains, scratch directories under the system temp dir.
    pub fn new() -> Self {
        Self {
            toolchains: BTreeMap::new(),
            work_root: None,
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            toolchains: config.toolchain_overrides()?,
            work_root: config.work_root.clone(),
        })
    }

    pub fn with_toolchain(mut self, language: Language, spec: ToolchainSpec) -> Self {
        self.toolchains.insert(language, spec);
        self
    }

    pub fn toolchain(&self, language: Language) -> ToolchainSpec {
        self.toolchains
            .get(&language)
            .cloned()
            .unwrap_or_else(|| ToolchainSpec::builtin(language))
    }

    fn workspace(&self, language: Language) -> std::io::Result<tempfile::TempDir> {
        let prefix = format!("dyntest-{}-", language.id());
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        match &self.work_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// How a single spawned step ended.
struct StepOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

#[async_trait]
impl UnitRunner for ProcessRunner {
    async fn compile_and_run(
        &self,
        unit: &GeneratedUnit,
        limits: &RunLimits,
        cancel: &CancelSignal,
    ) -> ExecutionResult {
        let start = Instant::now();
        let language = unit.language;
        let elapsed = || start.elapsed().as_millis() as u64;

        if cancel.is_cancelled() {
            return ExecutionResult::failed(language, RunOutcome::Cancelled { phase: None }, 0);
        }

        // Dropping `workspace` removes the directory on every return path.
        let workspace = match self.workspace(language) {
            Ok(dir) => dir,
            Err(e) => {
                let reason = format!("failed to create work directory: {}", e);
                return ExecutionResult::failed(language, RunOutcome::Crashed { reason }, elapsed());
            }
        };
        let ctx = CommandContext::new(workspace.path(), unit);
        if let Err(e) = tokio::fs::write(&ctx.src, &unit.source).await {
            let reason = format!("failed to write {}: {}", ctx.src.display(), e);
            return ExecutionResult::failed(language, RunOutcome::Crashed { reason }, elapsed());
        }

        let toolchain = self.toolchain(language);
        let deadline = tokio::time::Instant::now() + limits.timeout;

        if let Some(compile) = toolchain.compile_command(&ctx) {
            let step = run_step(&compile, workspace.path(), deadline, limits, Phase::Compile, cancel).await;
            match step {
                Ok(out) if out.status.success() => {
                    debug!(language = %language, "compile succeeded");
                }
                Ok(out) => {
                    let exit_code = out.status.code();
                    return ExecutionResult::new(
                        language,
                        RunOutcome::CompileFailed { exit_code },
                        exit_code,
                        out.stdout,
                        out.stderr,
                        elapsed(),
                    );
                }
                Err(outcome) => return ExecutionResult::failed(language, outcome, elapsed()),
            }
        }

        let run = toolchain.run_command(&ctx);
        match run_step(&run, workspace.path(), deadline, limits, Phase::Execute, cancel).await {
            Ok(out) => match out.status.code() {
                Some(code) => ExecutionResult::completed(language, code, out.stdout, out.stderr, elapsed()),
                None => ExecutionResult::new(
                    language,
                    RunOutcome::Crashed {
                        reason: describe_abnormal_exit(&out.status),
                    },
                    None,
                    out.stdout,
                    out.stderr,
                    elapsed(),
                ),
            },
            Err(outcome) => ExecutionResult::failed(language, outcome, elapsed()),
        }
    }
}

/// Process group of one spawned step. Dropping it kills every process left
/// in the group, including tools the step started itself (compiler passes,
/// linkers, shell children) which `kill_on_drop` alone would orphan.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pgid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        // ESRCH: every member already exited.
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pgid = pgid, error = %e, "failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

/// Spawn `argv` in `dir` and wait for it, bounded by `deadline` and `cancel`.
/// The step runs in its own process group, which is killed when the step
/// ends on any path.
async fn run_step(
    argv: &[String],
    dir: &Path,
    deadline: tokio::time::Instant,
    limits: &RunLimits,
    phase: Phase,
    cancel: &CancelSignal,
) -> Result<StepOutput, RunOutcome> {
    let (program, args) = argv.split_first().ok_or_else(|| RunOutcome::SpawnFailed {
        program: String::new(),
        reason: "empty command".to_string(),
    })?;
    debug!(program = %program, phase = %phase, "spawning");

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let child = command.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound => RunOutcome::ToolchainMissing {
            program: program.clone(),
        },
        _ => RunOutcome::SpawnFailed {
            program: program.clone(),
            reason: e.to_string(),
        },
    })?;
    // The leader's pid doubles as the group id.
    let _group = ProcessGroup::new(child.id());

    tokio::select! {
        waited = tokio::time::timeout_at(deadline, child.wait_with_output()) => match waited {
            Ok(Ok(output)) => Ok(StepOutput {
                status: output.status,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(RunOutcome::Crashed {
                reason: format!("failed to wait for {}: {}", program, e),
            }),
            Err(_) => Err(RunOutcome::TimedOut {
                phase,
                limit_ms: limits.timeout.as_millis() as u64,
            }),
        },
        _ = cancel.cancelled() => Err(RunOutcome::Cancelled { phase: Some(phase) }),
    }
}

#[cfg(unix)]
fn describe_abnormal_exit(status: &ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => format!("terminated by signal {}", signal),
        None => format!("abnormal exit: {}", status),
    }
}

#[cfg(not(unix))]
fn describe_abnormal_exit(status: &ExitStatus) -> String {
    format!("abnormal exit: {}", status)
}
