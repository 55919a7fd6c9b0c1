use super::source::SourceBuilder;
use super::{header_lines, Emitter, Language, PreparedCase, Snippet};
use crate::model::{ArithmeticModel, DivisionByZero, OverflowSemantics, StaticCheck, TestSuiteSpec};

/// Rust, built with `-C overflow-checks=on`: `i32` overflow panics and so does
/// integer division by zero.
pub struct RustEmitter;

fn block(lines: &[&str]) -> Option<Snippet> {
    Some(Snippet::Block(lines.iter().map(|l| l.to_string()).collect()))
}

fn expr(text: &str) -> Option<Snippet> {
    Some(Snippet::Expr(text.to_string()))
}

impl Emitter for RustEmitter {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn arithmetic_model(&self) -> ArithmeticModel {
        ArithmeticModel {
            overflow: OverflowSemantics::Checked,
            division_by_zero: DivisionByZero::Raises,
        }
    }

    fn static_check(&self, check: StaticCheck) -> Option<Snippet> {
        match check {
            StaticCheck::IntMaxWraps | StaticCheck::IntMinWraps | StaticCheck::IntMaxPromotes => {
                None
            }
            StaticCheck::IntMaxChecked => block(&[
                "let value = std::hint::black_box(i32::MAX);",
                "panic::catch_unwind(|| value + 1).is_err()",
            ]),
            StaticCheck::IntMinChecked => block(&[
                "let value = std::hint::black_box(i32::MIN);",
                "panic::catch_unwind(|| value - 1).is_err()",
            ]),
            StaticCheck::StringConcat => {
                expr("format!(\"{} {}\", \"Hello\", \"World\") == \"Hello World\"")
            }
            StaticCheck::StringLength => expr("\"Test\".len() == 4"),
            StaticCheck::ArraySum => block(&[
                "let values: Vec<i32> = (0..1000).collect();",
                "values.iter().sum::<i32>() == 499500",
            ]),
            StaticCheck::DivisionByZeroDetected => block(&[
                "let zero = std::hint::black_box(0i32);",
                "panic::catch_unwind(|| 1 / zero).is_err()",
            ]),
            StaticCheck::InvalidParseRejected => expr("\"invalid\".parse::<i32>().is_err()"),
            StaticCheck::BitwiseMasks => block(&[
                "let a: u32 = 0xF0F0_F0F0;",
                "let b: u32 = 0x0F0F_0F0F;",
                "(a & b) == 0 && (a | b) == 0xFFFF_FFFF",
            ]),
            StaticCheck::FloatPrecision => expr("((0.1_f64 + 0.2) - 0.3).abs() < 1e-10"),
        }
    }

    fn int_literal(&self, value: i32) -> String {
        match value {
            i32::MIN => "i32::MIN".to_string(),
            v if v < 0 => format!("({})", v),
            v => v.to_string(),
        }
    }

    fn assemble(&self, spec: &TestSuiteSpec, cases: &[PreparedCase<'_>], skipped: &[String]) -> String {
        let mut src = SourceBuilder::new("    ");
        for line in header_lines(spec, self.language(), cases.len(), skipped) {
            src.line(format!("// {}", line));
        }
        src.blank()
            .line("#![allow(unused_parens, clippy::eq_op)]")
            .blank()
            .line("use std::panic;")
            .line("use std::process;")
            .blank();

        src.line("#[derive(Default)]")
            .line("struct Tally {")
            .indent()
            .line("passed: u32,")
            .line("failed: u32,")
            .dedent()
            .line("}")
            .blank();

        src.line("impl Tally {")
            .indent()
            .line("fn check<F: FnOnce() -> bool + panic::UnwindSafe>(&mut self, name: &str, condition: F) {")
            .indent()
            .line("if panic::catch_unwind(condition).unwrap_or(false) {")
            .indent()
            .line("println!(\"[PASS] {}\", name);")
            .line("self.passed += 1;")
            .dedent()
            .line("} else {")
            .indent()
            .line("println!(\"[FAIL] {}\", name);")
            .line("self.failed += 1;")
            .dedent()
            .line("}")
            .dedent()
            .line("}")
            .dedent()
            .line("}")
            .blank();

        for case in cases {
            if let Snippet::Block(body) = &case.snippet {
                src.line(format!("fn {}() -> bool {{", case.helper_name()))
                    .indent()
                    .lines(body)
                    .dedent()
                    .line("}")
                    .blank();
            }
        }

        src.line("fn main() {").indent();
        src.line("panic::set_hook(Box::new(|_| {}));")
            .line("let mut tally = Tally::default();")
            .line("println!(\"Running dynamic tests (Rust)...\");");
        for case in cases {
            let call = match &case.snippet {
                Snippet::Expr(e) => e.clone(),
                Snippet::Block(_) => format!("{}()", case.helper_name()),
            };
            let condition = if case.case.expected {
                call
            } else {
                format!("!({})", call)
            };
            src.line(format!("tally.check(\"{}\", || {});", case.name(), condition));
        }
        src.line("println!();")
            .line("println!(")
            .indent()
            .line("\"Total: {} | Passed: {} | Failed: {}\",")
            .line("tally.passed + tally.failed,")
            .line("tally.passed,")
            .line("tally.failed")
            .dedent()
            .line(");")
            .line("process::exit(if tally.failed == 0 { 0 } else { 1 });")
            .dedent()
            .line("}");
        src.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Seed;

    #[test]
    fn test_rust_unit_shape() {
        let spec = TestSuiteSpec::generate(Seed(42), 3).unwrap();
        let unit = RustEmitter.render(&spec);
        let src = &unit.source;

        assert_eq!(unit.file_name, "dynamic_test.rs");
        assert!(src.contains("#![allow(unused_parens, clippy::eq_op)]"));
        assert!(src.contains("    tally.check(\"dynamic_1\", || 312 + 629 == 941);"));
        assert!(src.contains("fn case_int_max_checked() -> bool {"));
        assert!(src.contains("panic::set_hook(Box::new(|_| {}));"));
        assert!(!src.contains("\"int_max_wraps\""));
        assert!(!src.contains("\"int_max_promotes\""));
        assert!(src.ends_with("process::exit(if tally.failed == 0 { 0 } else { 1 });\n}\n"));
    }
}
