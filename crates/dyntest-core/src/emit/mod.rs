//! Language emitters.
//!
//! Every emitter renders the same [`TestSuiteSpec`] into one runnable source
//! unit. The unit prints exactly one `[PASS] <name>` or `[FAIL] <name>` line
//! per emitted case, in specification order, then a summary line
//! `Total: N | Passed: P | Failed: F`, and exits `0` iff nothing failed.
//!
//! Cases whose applicability does not admit the emitter's arithmetic model are
//! skipped and recorded on the unit; they are never rewritten to "fit".

mod c;
mod cpp;
mod java;
mod python;
mod rust;
pub mod source;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::digest::sha256_hex;
use crate::error::SpecError;
use crate::model::{ArithmeticModel, Expression, StaticCheck, TestCase, TestSuiteSpec};
use crate::obs;

pub use c::CEmitter;
pub use cpp::CppEmitter;
pub use java::JavaEmitter;
pub use python::PythonEmitter;
pub use rust::RustEmitter;

/// Supported target languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    C,
    Cpp,
    Java,
    Rust,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Python,
        Language::C,
        Language::Cpp,
        Language::Java,
        Language::Rust,
    ];

    /// Stable identifier used on the command line, in config and in reports.
    pub fn id(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Rust => "rust",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::C => "C",
            Language::Cpp => "C++",
            Language::Java => "Java",
            Language::Rust => "Rust",
        }
    }

    /// File name the generated unit must be written under.
    pub fn file_name(&self) -> &'static str {
        match self {
            Language::Python => "dynamic_test.py",
            Language::C => "dynamic_test.c",
            Language::Cpp => "dynamic_test.cpp",
            Language::Java => "DynamicTest.java",
            Language::Rust => "dynamic_test.rs",
        }
    }

    pub fn emitter(&self) -> &'static dyn Emitter {
        emitter_for(*self)
    }

    pub fn arithmetic_model(&self) -> ArithmeticModel {
        self.emitter().arithmetic_model()
    }

    /// Parse a comma-separated list, dropping duplicates but keeping order.
    pub fn parse_list(input: &str) -> Result<Vec<Language>, SpecError> {
        let mut out = Vec::new();
        for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let lang: Language = part.parse()?;
            if !out.contains(&lang) {
                out.push(lang);
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Language {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" | "python3" => Ok(Language::Python),
            "c" => Ok(Language::C),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            "java" => Ok(Language::Java),
            "rust" | "rs" => Ok(Language::Rust),
            other => Err(SpecError::UnknownLanguage(other.to_string())),
        }
    }
}

/// Emitter for `language`.
pub fn emitter_for(language: Language) -> &'static dyn Emitter {
    match language {
        Language::Python => &PythonEmitter,
        Language::C => &CEmitter,
        Language::Cpp => &CppEmitter,
        Language::Java => &JavaEmitter,
        Language::Rust => &RustEmitter,
    }
}

/// Source fragment evaluating one case to a boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snippet {
    /// A single boolean expression.
    Expr(String),
    /// Statements forming the body of a helper function returning the boolean.
    Block(Vec<String>),
}

/// A case ready for assembly into a unit.
#[derive(Debug, Clone)]
pub struct PreparedCase<'a> {
    pub case: &'a TestCase,
    pub snippet: Snippet,
}

impl PreparedCase<'_> {
    pub fn name(&self) -> &str {
        &self.case.name
    }

    /// Name of the helper function for a `Block` snippet.
    pub fn helper_name(&self) -> String {
        format!("case_{}", self.case.name)
    }
}

/// Renders a test suite into one language.
pub trait Emitter: Send + Sync {
    fn language(&self) -> Language;

    fn arithmetic_model(&self) -> ArithmeticModel;

    /// How `check` is written in this language, `None` if it cannot be.
    fn static_check(&self, check: StaticCheck) -> Option<Snippet>;

    /// Integer literal for `value` suitable as an operand of a binary operator.
    fn int_literal(&self, value: i32) -> String {
        if value < 0 {
            format!("({})", value)
        } else {
            value.to_string()
        }
    }

    /// Stitch prepared cases into a complete source file.
    fn assemble(&self, spec: &TestSuiteSpec, cases: &[PreparedCase<'_>], skipped: &[String])
        -> String;

    /// Fragment for `case`, `None` when it is inapplicable or inexpressible.
    fn prepare<'a>(&self, case: &'a TestCase) -> Option<PreparedCase<'a>> {
        if !case.applies_to(&self.arithmetic_model()) {
            return None;
        }
        let snippet = match &case.expression {
            Expression::Arithmetic {
                lhs,
                op,
                rhs,
                result,
            } => Snippet::Expr(format!(
                "{} {} {} == {}",
                self.int_literal(*lhs),
                op.symbol(),
                self.int_literal(*rhs),
                self.int_literal(*result)
            )),
            Expression::Static { check } => self.static_check(*check)?,
        };
        Some(PreparedCase { case, snippet })
    }

    /// Render `spec` into a unit. Pure with respect to `spec`.
    fn render(&self, spec: &TestSuiteSpec) -> GeneratedUnit {
        let language = self.language();
        let mut prepared = Vec::with_capacity(spec.cases().len());
        let mut skipped = Vec::new();

        for case in spec.cases() {
            match self.prepare(case) {
                Some(p) => prepared.push(p),
                None => {
                    debug!(language = %language, case = %case.name, "skipping inapplicable case");
                    skipped.push(case.name.clone());
                }
            }
        }

        let source = self.assemble(spec, &prepared, &skipped);
        let emitted = prepared.iter().map(|p| p.case.name.clone()).collect();
        let unit = GeneratedUnit::new(language, spec.spec_digest(), source, emitted, skipped);
        obs::emit_unit_rendered(
            language.id(),
            &unit.content_hash,
            unit.emitted.len(),
            unit.skipped.len(),
        );
        unit
    }
}

/// Rendered source for one (suite, language) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedUnit {
    pub language: Language,
    pub file_name: String,
    pub spec_digest: String,
    /// SHA-256 of `source`.
    pub content_hash: String,
    /// Case names emitted, in order.
    pub emitted: Vec<String>,
    /// Case names skipped as inapplicable, in order.
    pub skipped: Vec<String>,
    #[serde(skip)]
    pub source: String,
}

impl GeneratedUnit {
    pub fn new(
        language: Language,
        spec_digest: &str,
        source: String,
        emitted: Vec<String>,
        skipped: Vec<String>,
    ) -> Self {
        Self {
            language,
            file_name: language.file_name().to_string(),
            spec_digest: spec_digest.to_string(),
            content_hash: sha256_hex(source.as_bytes()),
            emitted,
            skipped,
            source,
        }
    }
}

/// Render `spec` for every language in `languages`, in order.
pub fn render_all(spec: &TestSuiteSpec, languages: &[Language]) -> Vec<GeneratedUnit> {
    languages
        .iter()
        .map(|lang| emitter_for(*lang).render(spec))
        .collect()
}

/// Header comment lines shared by every emitter.
pub(crate) fn header_lines(
    spec: &TestSuiteSpec,
    language: Language,
    emitted: usize,
    skipped: &[String],
) -> Vec<String> {
    let mut lines = vec![
        format!("Dynamic Test Suite - {}", language.display_name()),
        format!("Seed: {}", spec.seed()),
        format!("Spec digest: {}", spec.spec_digest()),
        format!("Cases: {} emitted, {} skipped", emitted, skipped.len()),
    ];
    if !skipped.is_empty() {
        lines.push(format!("Skipped (inapplicable): {}", skipped.join(", ")));
    }
    lines
}
