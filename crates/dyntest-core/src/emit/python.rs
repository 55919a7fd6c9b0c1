use super::source::SourceBuilder;
use super::{header_lines, Emitter, Language, PreparedCase, Snippet};
use crate::model::{ArithmeticModel, DivisionByZero, OverflowSemantics, StaticCheck, TestSuiteSpec};

/// Python 3. Integers are arbitrary precision; division by zero raises.
pub struct PythonEmitter;

impl Emitter for PythonEmitter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn arithmetic_model(&self) -> ArithmeticModel {
        ArithmeticModel {
            overflow: OverflowSemantics::Unbounded,
            division_by_zero: DivisionByZero::Raises,
        }
    }

    fn static_check(&self, check: StaticCheck) -> Option<Snippet> {
        let expr = |s: &str| Some(Snippet::Expr(s.to_string()));
        match check {
            StaticCheck::IntMaxPromotes => expr("2147483647 + 1 == 2147483648"),
            StaticCheck::IntMaxWraps
            | StaticCheck::IntMinWraps
            | StaticCheck::IntMaxChecked
            | StaticCheck::IntMinChecked => None,
            StaticCheck::StringConcat => expr("\"Hello\" + \" \" + \"World\" == \"Hello World\""),
            StaticCheck::StringLength => expr("len(\"Test\") == 4"),
            StaticCheck::ArraySum => Some(Snippet::Block(vec![
                "values = list(range(1000))".to_string(),
                "return sum(values) == 499500".to_string(),
            ])),
            StaticCheck::DivisionByZeroDetected => {
                expr("raises(ZeroDivisionError, lambda: 1 // 0)")
            }
            StaticCheck::InvalidParseRejected => expr("raises(ValueError, lambda: int(\"invalid\"))"),
            StaticCheck::BitwiseMasks => expr(
                "(0xF0F0F0F0 & 0x0F0F0F0F) == 0 and (0xF0F0F0F0 | 0x0F0F0F0F) == 0xFFFFFFFF",
            ),
            StaticCheck::FloatPrecision => expr("abs((0.1 + 0.2) - 0.3) < 1e-10"),
        }
    }

    fn assemble(&self, spec: &TestSuiteSpec, cases: &[PreparedCase<'_>], skipped: &[String]) -> String {
        let mut src = SourceBuilder::new("    ");
        src.line("#!/usr/bin/env python3").line("\"\"\"");
        src.lines(header_lines(spec, self.language(), cases.len(), skipped));
        src.line("\"\"\"").blank().line("import sys").blank().blank();

        src.line("passed = 0").line("failed = 0").blank().blank();

        src.line("def check(name, condition):")
            .indent()
            .line("global passed, failed")
            .line("try:")
            .indent()
            .line("ok = condition() is True")
            .dedent()
            .line("except Exception:")
            .indent()
            .line("ok = False")
            .dedent()
            .line("if ok:")
            .indent()
            .line("print(\"[PASS] \" + name)")
            .line("passed += 1")
            .dedent()
            .line("else:")
            .indent()
            .line("print(\"[FAIL] \" + name)")
            .line("failed += 1")
            .dedent()
            .dedent()
            .blank()
            .blank();

        src.line("def raises(exc_type, fn):")
            .indent()
            .line("try:")
            .indent()
            .line("fn()")
            .dedent()
            .line("except exc_type:")
            .indent()
            .line("return True")
            .dedent()
            .line("return False")
            .dedent()
            .blank()
            .blank();

        for case in cases {
            if let Snippet::Block(body) = &case.snippet {
                src.line(format!("def {}():", case.helper_name()))
                    .indent()
                    .lines(body)
                    .dedent()
                    .blank()
                    .blank();
            }
        }

        src.line("print(\"Running dynamic tests (Python)...\")");
        for case in cases {
            let call = match &case.snippet {
                Snippet::Expr(e) => e.clone(),
                Snippet::Block(_) => format!("{}()", case.helper_name()),
            };
            let condition = if case.case.expected {
                call
            } else {
                format!("not ({})", call)
            };
            src.line(format!("check(\"{}\", lambda: {})", case.name(), condition));
        }

        src.line("print(\"\")")
            .line("print(\"Total: %d | Passed: %d | Failed: %d\" % (passed + failed, passed, failed))")
            .line("sys.exit(0 if failed == 0 else 1)");
        src.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Seed;

    #[test]
    fn test_python_unit_shape() {
        let spec = TestSuiteSpec::generate(Seed(42), 3).unwrap();
        let unit = PythonEmitter.render(&spec);
        let src = &unit.source;

        assert_eq!(unit.file_name, "dynamic_test.py");
        assert!(src.starts_with("#!/usr/bin/env python3\n"));
        assert!(src.contains("check(\"dynamic_1\", lambda: 312 + 629 == 941)"));
        assert!(src.contains("check(\"int_max_promotes\", lambda: 2147483647 + 1 == 2147483648)"));
        assert!(src.contains("def case_array_sum():\n    values = list(range(1000))"));
        assert!(src.contains("check(\"array_sum\", lambda: case_array_sum())"));
        assert!(!src.contains("check(\"int_max_wraps\""));
        assert!(src.contains("Skipped (inapplicable): int_max_wraps, int_min_wraps"));
        assert!(src.ends_with("sys.exit(0 if failed == 0 else 1)\n"));
    }

    #[test]
    fn test_negative_operands_are_parenthesised() {
        let spec = TestSuiteSpec::generate(Seed(42), 2).unwrap();
        let src = PythonEmitter.render(&spec).source;
        assert!(src.contains("check(\"dynamic_2\", lambda: 888 - (-977) == 1865)"));
    }
}
