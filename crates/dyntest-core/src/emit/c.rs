use super::source::SourceBuilder;
use super::{header_lines, Emitter, Language, PreparedCase, Snippet};
use crate::model::{ArithmeticModel, DivisionByZero, OverflowSemantics, StaticCheck, TestSuiteSpec};

/// C99. Wrap-around holds only because the builtin toolchain compiles with
/// `-fwrapv`; integer division by zero is undefined.
pub struct CEmitter;

fn block(lines: &[&str]) -> Option<Snippet> {
    Some(Snippet::Block(lines.iter().map(|l| l.to_string()).collect()))
}

impl Emitter for CEmitter {
    fn language(&self) -> Language {
        Language::C
    }

    fn arithmetic_model(&self) -> ArithmeticModel {
        ArithmeticModel {
            overflow: OverflowSemantics::Wrapping32,
            division_by_zero: DivisionByZero::Undefined,
        }
    }

    fn static_check(&self, check: StaticCheck) -> Option<Snippet> {
        match check {
            StaticCheck::IntMaxWraps => block(&[
                "int32_t value = INT32_MAX;",
                "value = value + 1;",
                "return value == INT32_MIN;",
            ]),
            StaticCheck::IntMinWraps => block(&[
                "int32_t value = INT32_MIN;",
                "value = value - 1;",
                "return value == INT32_MAX;",
            ]),
            StaticCheck::IntMaxPromotes
            | StaticCheck::IntMaxChecked
            | StaticCheck::IntMinChecked
            | StaticCheck::DivisionByZeroDetected => None,
            StaticCheck::StringConcat => block(&[
                "char buffer[32];",
                "snprintf(buffer, sizeof buffer, \"%s %s\", \"Hello\", \"World\");",
                "return strcmp(buffer, \"Hello World\") == 0;",
            ]),
            StaticCheck::StringLength => Some(Snippet::Expr("strlen(\"Test\") == 4".to_string())),
            StaticCheck::ArraySum => block(&[
                "int values[1000];",
                "int sum = 0;",
                "for (int i = 0; i < 1000; i++) {",
                "    values[i] = i;",
                "}",
                "for (int i = 0; i < 1000; i++) {",
                "    sum += values[i];",
                "}",
                "return sum == 499500;",
            ]),
            StaticCheck::InvalidParseRejected => block(&[
                "const char *text = \"invalid\";",
                "char *end = NULL;",
                "(void)strtol(text, &end, 10);",
                "return end == text;",
            ]),
            StaticCheck::BitwiseMasks => block(&[
                "uint32_t a = 0xF0F0F0F0u;",
                "uint32_t b = 0x0F0F0F0Fu;",
                "return (a & b) == 0u && (a | b) == 0xFFFFFFFFu;",
            ]),
            StaticCheck::FloatPrecision => block(&[
                "double diff = (0.1 + 0.2) - 0.3;",
                "if (diff < 0) {",
                "    diff = -diff;",
                "}",
                "return diff < 1e-10;",
            ]),
        }
    }

    fn int_literal(&self, value: i32) -> String {
        match value {
            i32::MIN => "INT32_MIN".to_string(),
            v if v < 0 => format!("({})", v),
            v => v.to_string(),
        }
    }

    fn assemble(&self, spec: &TestSuiteSpec, cases: &[PreparedCase<'_>], skipped: &[String]) -> String {
        let mut src = SourceBuilder::new("    ");
        src.line("/*");
        for line in header_lines(spec, self.language(), cases.len(), skipped) {
            src.line(format!(" * {}", line));
        }
        src.line(" */").blank();

        src.lines([
            "#include <stdint.h>",
            "#include <stdio.h>",
            "#include <stdlib.h>",
            "#include <string.h>",
        ])
        .blank();

        src.line("static int passed = 0;")
            .line("static int failed = 0;")
            .blank();

        src.line("static void check(const char *name, int condition) {")
            .indent()
            .line("if (condition) {")
            .indent()
            .line("printf(\"[PASS] %s\\n\", name);")
            .line("passed++;")
            .dedent()
            .line("} else {")
            .indent()
            .line("printf(\"[FAIL] %s\\n\", name);")
            .line("failed++;")
            .dedent()
            .line("}")
            .dedent()
            .line("}")
            .blank();

        for case in cases {
            if let Snippet::Block(body) = &case.snippet {
                src.line(format!("static int {}(void) {{", case.helper_name()))
                    .indent()
                    .lines(body)
                    .dedent()
                    .line("}")
                    .blank();
            }
        }

        src.line("int main(void) {").indent();
        src.line("printf(\"Running dynamic tests (C)...\\n\");");
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
            src.line(format!("check(\"{}\", {});", case.name(), condition));
        }
        src.line("printf(\"\\nTotal: %d | Passed: %d | Failed: %d\\n\", passed + failed, passed, failed);")
            .line("return failed == 0 ? 0 : 1;")
            .dedent()
            .line("}");
        src.finish()
    }
}
