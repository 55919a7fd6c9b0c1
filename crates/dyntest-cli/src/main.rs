//! dyntest - cross-language dynamic test generator and harness
//!
//! ## Commands
//!
//! - `run`: generate a suite, run it in every language, print the report
//! - `generate`: write the generated units to a directory
//! - `show`: print the test suite specification as JSON
//! - `languages`: list supported languages and their arithmetic models

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use dyntest_core::obs::RunSpan;
use dyntest_core::{render_all, render_text, Language, Seed, TestSuiteSpec};
use dyntest_harness::{
    write_report_json, write_units, CancelSource, Harness, HarnessConfig, RegenerateRequest,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "dyntest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate equivalent test programs in several languages and run them uniformly", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// TOML configuration file
    #[arg(long, global = true, env = "DYNTEST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Seed and case count. Neither has a default.
#[derive(Args)]
struct SuiteArgs {
    /// Seed for the dynamic cases (decimal or 0x-prefixed hex)
    #[arg(long, env = "DYNTEST_SEED")]
    seed: Option<Seed>,

    /// Number of dynamic-arithmetic cases
    #[arg(long, env = "DYNTEST_CASES")]
    cases: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate, compile, run and aggregate
    Run {
        #[command(flatten)]
        suite: SuiteArgs,

        /// Comma-separated target languages
        #[arg(long, env = "DYNTEST_LANGUAGES")]
        languages: Option<String>,

        /// Per-unit timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Maximum number of languages running at once
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Parent directory for per-unit scratch directories
        #[arg(long)]
        work_root: Option<PathBuf>,

        /// Also write the report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Write generated units and a manifest to a directory
    Generate {
        #[command(flatten)]
        suite: SuiteArgs,

        /// Comma-separated target languages
        #[arg(long, env = "DYNTEST_LANGUAGES")]
        languages: Option<String>,

        /// Output directory; replaced as a whole
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Print the test suite specification as JSON
    Show {
        #[command(flatten)]
        suite: SuiteArgs,
    },

    /// List supported languages
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    dyntest_core::telemetry::init_tracing(cli.json, level);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            suite,
            languages,
            timeout_secs,
            max_concurrent,
            work_root,
            report,
        } => {
            let mut config = config;
            if let Some(secs) = timeout_secs {
                config.timeout_secs = secs;
            }
            if let Some(max) = max_concurrent {
                config.max_concurrent = max;
            }
            if work_root.is_some() {
                config.work_root = work_root;
            }
            let code = cmd_run(config, &suite, languages.as_deref(), report.as_deref()).await?;
            std::process::exit(code);
        }
        Commands::Generate {
            suite,
            languages,
            out,
        } => cmd_generate(&config, &suite, languages.as_deref(), &out),
        Commands::Show { suite } => cmd_show(&config, &suite),
        Commands::Languages => cmd_languages(),
    }
}

fn load_config(path: Option<&Path>) -> Result<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(HarnessConfig::default()),
    }
}

/// Seed and case count from flags, falling back to the config file.
fn resolve_suite(config: &HarnessConfig, suite: &SuiteArgs) -> Result<(Seed, usize)> {
    let seed = suite
        .seed
        .or(config.seed)
        .ok_or_else(|| anyhow!("No seed given: pass --seed, set DYNTEST_SEED, or set `seed` in the config"))?;
    let cases = suite.cases.or(config.dynamic_cases).ok_or_else(|| {
        anyhow!("No case count given: pass --cases, set DYNTEST_CASES, or set `dynamic_cases` in the config")
    })?;
    Ok((seed, cases))
}

fn resolve_languages(config: &HarnessConfig, flag: Option<&str>) -> Result<Vec<Language>> {
    let languages = match flag {
        Some(list) => Language::parse_list(list)?,
        None => config.languages()?.unwrap_or_else(|| Language::ALL.to_vec()),
    };
    if languages.is_empty() {
        anyhow::bail!("No target languages given");
    }
    Ok(languages)
}

async fn cmd_run(
    config: HarnessConfig,
    suite: &SuiteArgs,
    languages: Option<&str>,
    report_path: Option<&Path>,
) -> Result<i32> {
    let (seed, cases) = resolve_suite(&config, suite)?;
    let languages = resolve_languages(&config, languages)?;
    let request = RegenerateRequest::new(seed, cases, languages);

    let harness = Harness::with_process_runner(config).context("Invalid harness configuration")?;

    let source = CancelSource::new();
    let signal = source.signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            source.cancel();
        }
    });

    info!(seed = %seed, cases = cases, "starting run");
    let report = harness.regenerate(&request, signal).await?;

    print!("{}", render_text(&report));
    if let Some(path) = report_path {
        write_report_json(path, &report)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        println!("Report written to {}", path.display());
    }
    Ok(report.exit_code)
}

fn cmd_generate(
    config: &HarnessConfig,
    suite: &SuiteArgs,
    languages: Option<&str>,
    out: &Path,
) -> Result<()> {
    let (seed, cases) = resolve_suite(config, suite)?;
    let languages = resolve_languages(config, languages)?;
    let _span = RunSpan::enter("generate", seed.value());
    let spec = TestSuiteSpec::generate(seed, cases)?;
    let units = render_all(&spec, &languages);

    let manifest = write_units(out, &spec, &units)
        .with_context(|| format!("Failed to write units to {}", out.display()))?;

    println!("Spec digest: {}", manifest.spec_digest);
    for entry in &manifest.units {
        println!(
            "  {:<6} {}  ({} emitted, {} skipped)",
            entry.language.id(),
            out.join(&entry.path).display(),
            entry.emitted.len(),
            entry.skipped.len()
        );
    }
    Ok(())
}

fn cmd_show(config: &HarnessConfig, suite: &SuiteArgs) -> Result<()> {
    let (seed, cases) = resolve_suite(config, suite)?;
    let spec = TestSuiteSpec::generate(seed, cases)?;
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}

fn cmd_languages() -> Result<()> {
    println!(
        "{:<8} {:<8} {:<12} {:<10} FILE",
        "ID", "NAME", "OVERFLOW", "DIV-ZERO"
    );
    for lang in Language::ALL {
        let model = lang.arithmetic_model();
        let division = serde_json::to_value(model.division_by_zero)?;
        println!(
            "{:<8} {:<8} {:<12} {:<10} {}",
            lang.id(),
            lang.display_name(),
            model.overflow.tag(),
            division.as_str().unwrap_or("-"),
            lang.file_name()
        );
    }
    Ok(())
}
