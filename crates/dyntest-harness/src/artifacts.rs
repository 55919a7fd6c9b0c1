//! On-disk artifacts: generated units, their manifest, and JSON reports.
//!
//! Layout of a generated output directory:
//!
//! ```text
//! <out>/manifest.json
//! <out>/<language>/<file>
//! ```
//!
//! The directory is replaced as a whole on every write, never merged. The
//! previous generation is renamed aside before the new one is renamed in, so
//! there is a brief window in which `<out>` does not exist; it never holds a
//! mix of both. If the new generation cannot be moved in, the previous one is
//! restored.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dyntest_core::{AggregateReport, GeneratedUnit, Seed, TestSuiteSpec};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ArtifactError;

pub const MANIFEST_FILE: &str = "manifest.json";

type Result<T> = std::result::Result<T, ArtifactError>;

/// One written unit, keyed by (language, spec digest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub language: dyntest_core::Language,
    /// Path relative to the output directory.
    pub path: PathBuf,
    pub content_hash: String,
    pub emitted: Vec<String>,
    pub skipped: Vec<String>,
}

/// Index of a generated output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub generator_version: String,
    pub generated_at: DateTime<Utc>,
    pub seed: Seed,
    pub spec_digest: String,
    pub dynamic_cases: usize,
    pub units: Vec<ManifestEntry>,
}

impl ArtifactManifest {
    pub fn new(spec: &TestSuiteSpec, units: &[GeneratedUnit]) -> Self {
        let units = units
            .iter()
            .map(|u| ManifestEntry {
                language: u.language,
                path: Path::new(u.language.id()).join(&u.file_name),
                content_hash: u.content_hash.clone(),
                emitted: u.emitted.clone(),
                skipped: u.skipped.clone(),
            })
            .collect();
        Self {
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now(),
            seed: spec.seed(),
            spec_digest: spec.spec_digest().to_string(),
            dynamic_cases: spec.dynamic_count(),
            units,
        }
    }

    pub fn load(out_dir: &Path) -> Result<Self> {
        let path = out_dir.join(MANIFEST_FILE);
        let raw = fs::read(&path).map_err(|e| ArtifactError::io(&path, e))?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Write `units` and a manifest to `out_dir`, replacing whatever was there.
pub fn write_units(
    out_dir: &Path,
    spec: &TestSuiteSpec,
    units: &[GeneratedUnit],
) -> Result<ArtifactManifest> {
    let parent = parent_dir(out_dir);
    fs::create_dir_all(&parent).map_err(|e| ArtifactError::io(&parent, e))?;

    // Stage next to the target so the final rename stays on one filesystem.
    let staging = tempfile::Builder::new()
        .prefix(".dyntest-staging-")
        .tempdir_in(&parent)
        .map_err(|e| ArtifactError::io(&parent, e))?;

    let manifest = ArtifactManifest::new(spec, units);
    for (unit, entry) in units.iter().zip(&manifest.units) {
        let path = staging.path().join(&entry.path);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| ArtifactError::io(dir, e))?;
        }
        fs::write(&path, &unit.source).map_err(|e| ArtifactError::io(&path, e))?;
    }
    let manifest_path = staging.path().join(MANIFEST_FILE);
    let json = serde_json::to_vec_pretty(&manifest)?;
    fs::write(&manifest_path, json).map_err(|e| ArtifactError::io(&manifest_path, e))?;

    // After the swap the staging guard points at nothing; its cleanup is a no-op.
    swap_into_place(staging.path(), out_dir, &parent)?;

    info!(
        out_dir = %out_dir.display(),
        units = manifest.units.len(),
        spec_digest = %spec.spec_digest(),
        "wrote generated units"
    );
    Ok(manifest)
}

/// Replace `out_dir` with `staged`. On failure `out_dir` is left as it was.
fn swap_into_place(staged: &Path, out_dir: &Path, parent: &Path) -> Result<()> {
    let retired = if out_dir.exists() {
        let retired = parent.join(format!(".dyntest-retired-{}", Uuid::new_v4()));
        fs::rename(out_dir, &retired).map_err(|e| ArtifactError::io(out_dir, e))?;
        Some(retired)
    } else {
        None
    };

    if let Err(e) = fs::rename(staged, out_dir) {
        if let Some(retired) = &retired {
            if let Err(restore) = fs::rename(retired, out_dir) {
                warn!(
                    retired = %retired.display(),
                    error = %restore,
                    "failed to restore previous generation"
                );
            }
        }
        return Err(ArtifactError::io(out_dir, e));
    }

    if let Some(retired) = retired {
        fs::remove_dir_all(&retired).map_err(|e| ArtifactError::io(&retired, e))?;
    }
    Ok(())
}

/// Write `report` as pretty JSON, atomically.
pub fn write_report_json(path: &Path, report: &AggregateReport) -> Result<()> {
    let parent = parent_dir(path);
    fs::create_dir_all(&parent).map_err(|e| ArtifactError::io(&parent, e))?;

    let content = serde_json::to_vec_pretty(report)?;
    let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| ArtifactError::io(&parent, e))?;
    tmp.write_all(&content)
        .map_err(|e| ArtifactError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| ArtifactError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dyntest_core::{render_all, Language};

    fn generate(seed: u64) -> (TestSuiteSpec, Vec<GeneratedUnit>) {
        let spec = TestSuiteSpec::generate(Seed(seed), 3).unwrap();
        let units = render_all(&spec, &[Language::Python, Language::Java]);
        (spec, units)
    }

    #[test]
    fn test_write_units_layout() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let (spec, units) = generate(42);

        let manifest = write_units(&out, &spec, &units).unwrap();
        assert_eq!(manifest.units.len(), 2);

        let py = fs::read_to_string(out.join("python").join("dynamic_test.py")).unwrap();
        assert_eq!(py, units[0].source);
        assert!(out.join("java").join("DynamicTest.java").is_file());

        let loaded = ArtifactManifest::load(&out).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.spec_digest, spec.spec_digest());
        assert_eq!(loaded.units[0].content_hash, units[0].content_hash);
    }

    #[test]
    fn test_failed_swap_restores_previous_generation() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let (spec, units) = generate(42);
        write_units(&out, &spec, &units).unwrap();
        let before = fs::read_to_string(out.join(MANIFEST_FILE)).unwrap();

        let missing = dir.path().join("never-staged");
        let err = swap_into_place(&missing, &out, dir.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));

        assert_eq!(fs::read_to_string(out.join(MANIFEST_FILE)).unwrap(), before);
        let retired = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".dyntest-retired-"))
            .count();
        assert_eq!(retired, 0);
    }

    #[test]
    fn test_rewrite_replaces_instead_of_merging() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let (spec, units) = generate(1);
        write_units(&out, &spec, &units).unwrap();
        fs::write(out.join("stale.txt"), "old").unwrap();

        let spec2 = TestSuiteSpec::generate(Seed(2), 3).unwrap();
        let units2 = render_all(&spec2, &[Language::C]);
        write_units(&out, &spec2, &units2).unwrap();

        assert!(!out.join("stale.txt").exists());
        assert!(!out.join("python").exists());
        assert!(out.join("c").join("dynamic_test.c").is_file());
        assert_eq!(ArtifactManifest::load(&out).unwrap().seed, Seed(2));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".dyntest-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_write_report_json() {
        let dir = tempfile::tempdir().unwrap();
        let (spec, units) = generate(5);
        let report = AggregateReport::build(
            Uuid::new_v4(),
            &spec,
            &units,
            Vec::new(),
            dyntest_core::ReportStatus::Completed,
        );
        let path = dir.path().join("reports").join("report.json");
        write_report_json(&path, &report).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["exit_code"], 1);
        assert!(raw["languages"]["python"].is_object());
        assert!(raw["languages"]["java"].is_object());
    }
}
