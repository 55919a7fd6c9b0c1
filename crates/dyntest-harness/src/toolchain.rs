//! Toolchain definitions: how a generated unit is compiled and run.
//!
//! Commands are argv templates. Each argument may contain placeholders that
//! are expanded per unit:
//!
//! | placeholder | expands to                                   |
//! |-------------|----------------------------------------------|
//! | `{src}`     | absolute path of the written source file     |
//! | `{bin}`     | absolute path for a compiled executable      |
//! | `{dir}`     | the unit's private working directory         |
//! | `{main}`    | source file stem (the Java main class)       |

use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};

use dyntest_core::{GeneratedUnit, Language};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Compile and run commands for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainSpec {
    /// Compile step; interpreted languages have none.
    #[serde(default)]
    pub compile: Option<Vec<String>>,

    /// Run step (first element is the executable).
    pub run: Vec<String>,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

impl ToolchainSpec {
    /// Toolchain used when configuration does not override it.
    pub fn builtin(language: Language) -> Self {
        match language {
            Language::Python => Self {
                compile: None,
                run: argv(&["python3", "{src}"]),
            },
            Language::C => Self {
                compile: Some(argv(&["cc", "-std=c99", "-O0", "-fwrapv", "-o", "{bin}", "{src}"])),
                run: argv(&["{bin}"]),
            },
            Language::Cpp => Self {
                compile: Some(argv(&["c++", "-std=c++17", "-O0", "-fwrapv", "-o", "{bin}", "{src}"])),
                run: argv(&["{bin}"]),
            },
            Language::Java => Self {
                compile: Some(argv(&["javac", "-d", "{dir}", "{src}"])),
                run: argv(&["java", "-cp", "{dir}", "{main}"]),
            },
            Language::Rust => Self {
                compile: Some(argv(&[
                    "rustc",
                    "--edition",
                    "2021",
                    "-C",
                    "overflow-checks=on",
                    "-o",
                    "{bin}",
                    "{src}",
                ])),
                run: argv(&["{bin}"]),
            },
        }
    }

    /// Interpreted toolchain with a single run command.
    pub fn interpreted(run: Vec<String>) -> Self {
        Self { compile: None, run }
    }

    pub fn compiled(compile: Vec<String>, run: Vec<String>) -> Self {
        Self {
            compile: Some(compile),
            run,
        }
    }

    /// Reject commands that cannot be spawned.
    pub fn validate(&self, language: Language) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidToolchain {
            language: language.id().to_string(),
            reason: reason.to_string(),
        };
        if self.run.first().map_or(true, |p| p.trim().is_empty()) {
            return Err(invalid("run command is empty"));
        }
        if let Some(compile) = &self.compile {
            if compile.first().map_or(true, |p| p.trim().is_empty()) {
                return Err(invalid("compile command is empty"));
            }
        }
        Ok(())
    }

    pub fn compile_command(&self, ctx: &CommandContext) -> Option<Vec<String>> {
        self.compile.as_ref().map(|c| ctx.expand(c))
    }

    pub fn run_command(&self, ctx: &CommandContext) -> Vec<String> {
        ctx.expand(&self.run)
    }
}

/// Paths a unit's commands are expanded against.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub dir: PathBuf,
    pub src: PathBuf,
    pub bin: PathBuf,
    pub main: String,
}

impl CommandContext {
    pub fn new(dir: &Path, unit: &GeneratedUnit) -> Self {
        let main = Path::new(&unit.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| unit.file_name.clone());
        Self {
            dir: dir.to_path_buf(),
            src: dir.join(&unit.file_name),
            bin: dir.join(format!("{}{}", main, EXE_SUFFIX)),
            main,
        }
    }

    fn expand(&self, template: &[String]) -> Vec<String> {
        let dir = self.dir.to_string_lossy();
        let src = self.src.to_string_lossy();
        let bin = self.bin.to_string_lossy();
        template
            .iter()
            .map(|arg| {
                arg.replace("{src}", &src)
                    .replace("{bin}", &bin)
                    .replace("{dir}", &dir)
                    .replace("{main}", &self.main)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dyntest_core::{emitter_for, Seed, TestSuiteSpec};

    fn unit(language: Language) -> GeneratedUnit {
        let spec = TestSuiteSpec::generate(Seed(1), 1).unwrap();
        emitter_for(language).render(&spec)
    }

    #[test]
    fn test_builtin_toolchains_are_valid() {
        for lang in Language::ALL {
            ToolchainSpec::builtin(lang).validate(lang).unwrap();
        }
        assert!(ToolchainSpec::builtin(Language::Python).compile.is_none());
        assert!(ToolchainSpec::builtin(Language::C)
            .compile
            .unwrap()
            .contains(&"-fwrapv".to_string()));
        assert!(ToolchainSpec::builtin(Language::Rust)
            .compile
            .unwrap()
            .contains(&"overflow-checks=on".to_string()));
    }

    #[test]
    fn test_validate_rejects_empty_commands() {
        let empty_run = ToolchainSpec::interpreted(Vec::new());
        assert!(matches!(
            empty_run.validate(Language::Python),
            Err(ConfigError::InvalidToolchain { .. })
        ));

        let blank_compile = ToolchainSpec::compiled(vec!["  ".to_string()], vec!["x".to_string()]);
        assert!(blank_compile.validate(Language::C).is_err());
    }

    #[test]
    fn test_placeholder_expansion() {
        let dir = Path::new("/work/unit");
        let ctx = CommandContext::new(dir, &unit(Language::Java));
        assert_eq!(ctx.main, "DynamicTest");

        let spec = ToolchainSpec::builtin(Language::Java);
        assert_eq!(
            spec.compile_command(&ctx).unwrap(),
            vec![
                "javac".to_string(),
                "-d".to_string(),
                "/work/unit".to_string(),
                "/work/unit/DynamicTest.java".to_string(),
            ]
        );
        assert_eq!(
            spec.run_command(&ctx),
            vec!["java", "-cp", "/work/unit", "DynamicTest"]
        );
    }

    #[test]
    fn test_bin_placeholder_inside_argument() {
        let ctx = CommandContext::new(Path::new("/w"), &unit(Language::C));
        let spec = ToolchainSpec::compiled(
            vec!["cc".to_string(), "-o{bin}".to_string(), "{src}".to_string()],
            vec!["{bin}".to_string()],
        );
        let compile = spec.compile_command(&ctx).unwrap();
        assert_eq!(compile[1], format!("-o/w/dynamic_test{}", EXE_SUFFIX));
        assert_eq!(compile[2], "/w/dynamic_test.c");
    }

    #[test]
    fn test_toolchain_toml_shape() {
        let spec: ToolchainSpec = toml::from_str("run = [\"pypy3\", \"{src}\"]").unwrap();
        assert_eq!(spec, ToolchainSpec::interpreted(vec!["pypy3".to_string(), "{src}".to_string()]));
        assert!(toml::from_str::<ToolchainSpec>("run = [\"x\"]\nlink = [\"y\"]").is_err());
    }
}
