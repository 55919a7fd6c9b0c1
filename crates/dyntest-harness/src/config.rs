//! Harness configuration, loaded from an optional TOML file.
//!
//! ```toml
//! seed = 42
//! dynamic_cases = 50
//! languages = ["python", "c", "java"]
//! timeout_secs = 120
//! max_concurrent = 2
//! work_root = "/tmp/dyntest"
//!
//! [toolchains.python]
//! run = ["pypy3", "{src}"]
//! ```
//!
//! Seed and case count have no defaults; the caller must supply them either
//! here or on the command line.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dyntest_core::{Language, Seed};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::toolchain::ToolchainSpec;

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_CONCURRENT: usize = 2;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    #[serde(default)]
    pub seed: Option<Seed>,

    #[serde(default)]
    pub dynamic_cases: Option<usize>,

    #[serde(default)]
    pub languages: Option<Vec<String>>,

    /// Wall-clock limit per unit, compile and run together.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of language pipelines allowed to run at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Parent directory for per-unit scratch directories; system temp if unset.
    #[serde(default)]
    pub work_root: Option<PathBuf>,

    /// Per-language overrides keyed by language id.
    #[serde(default)]
    pub toolchains: BTreeMap<String, ToolchainSpec>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            seed: None,
            dynamic_cases: None,
            languages: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            work_root: None,
            toolchains: BTreeMap::new(),
        }
    }
}

impl HarnessConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs",
                reason: "must be positive".to_string(),
            });
        }
        if self.max_concurrent == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_concurrent",
                reason: "must be positive".to_string(),
            });
        }
        if let Some(languages) = &self.languages {
            for id in languages {
                id.parse::<Language>()?;
            }
        }
        self.toolchain_overrides().map(|_| ())
    }

    /// Configured languages, parsed and de-duplicated in order.
    pub fn languages(&self) -> Result<Option<Vec<Language>>, ConfigError> {
        match &self.languages {
            Some(ids) => Ok(Some(Language::parse_list(&ids.join(","))?)),
            None => Ok(None),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validated overrides keyed by language.
    pub fn toolchain_overrides(&self) -> Result<BTreeMap<Language, ToolchainSpec>, ConfigError> {
        let mut out = BTreeMap::new();
        for (id, spec) in &self.toolchains {
            let language: Language = id.parse()?;
            spec.validate(language)?;
            out.insert(language, spec.clone());
        }
        Ok(out)
    }

    /// Toolchain for `language`: the override if configured, else the builtin.
    pub fn toolchain_for(&self, language: Language) -> Result<ToolchainSpec, ConfigError> {
        Ok(self
            .toolchain_overrides()?
            .remove(&language)
            .unwrap_or_else(|| ToolchainSpec::builtin(language)))
    }
}
