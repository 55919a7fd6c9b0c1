use super::source::SourceBuilder;
use super::{header_lines, Emitter, Language, PreparedCase, Snippet};
use crate::model::{ArithmeticModel, DivisionByZero, OverflowSemantics, StaticCheck, TestSuiteSpec};

/// C++17. Same integer model as C (`-fwrapv`, division by zero undefined),
/// but library failures surface as exceptions.
pub struct CppEmitter;

fn block(lines: &[&str]) -> Option<Snippet> {
    Some(Snippet::Block(lines.iter().map(|l| l.to_string()).collect()))
}

fn expr(text: &str) -> Option<Snippet> {
    Some(Snippet::Expr(text.to_string()))
}

impl Emitter for CppEmitter {
    fn language(&self) -> Language {
        Language::Cpp
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
                "std::int32_t value = INT32_MAX;",
                "value = value + 1;",
                "return value == INT32_MIN;",
            ]),
            StaticCheck::IntMinWraps => block(&[
                "std::int32_t value = INT32_MIN;",
                "value = value - 1;",
                "return value == INT32_MAX;",
            ]),
            StaticCheck::IntMaxPromotes
            | StaticCheck::IntMaxChecked
            | StaticCheck::IntMinChecked
            | StaticCheck::DivisionByZeroDetected => None,
            StaticCheck::StringConcat => {
                expr("std::string(\"Hello\") + \" \" + \"World\" == \"Hello World\"")
            }
            StaticCheck::StringLength => expr("std::string(\"Test\").size() == 4"),
            StaticCheck::ArraySum => block(&[
                "std::vector<int> values(1000);",
                "std::iota(values.begin(), values.end(), 0);",
                "return std::accumulate(values.begin(), values.end(), 0) == 499500;",
            ]),
            StaticCheck::InvalidParseRejected => block(&[
                "try {",
                "    (void)std::stoi(\"invalid\");",
                "} catch (const std::invalid_argument &) {",
                "    return true;",
                "}",
                "return false;",
            ]),
            StaticCheck::BitwiseMasks => block(&[
                "std::uint32_t a = 0xF0F0F0F0u;",
                "std::uint32_t b = 0x0F0F0F0Fu;",
                "return (a & b) == 0u && (a | b) == 0xFFFFFFFFu;",
            ]),
            StaticCheck::FloatPrecision => expr("std::fabs((0.1 + 0.2) - 0.3) < 1e-10"),
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
        for line in header_lines(spec, self.language(), cases.len(), skipped) {
            src.line(format!("// {}", line));
        }
        src.blank();

        src.lines([
            "#include <cmath>",
            "#include <cstdint>",
            "#include <functional>",
            "#include <iostream>",
            "#include <numeric>",
            "#include <stdexcept>",
            "#include <string>",
            "#include <vector>",
        ])
        .blank();

        src.line("static int passed = 0;")
            .line("static int failed = 0;")
            .blank();

        src.line("static void check(const char *name, const std::function<bool()> &condition) {")
            .indent()
            .line("bool ok = false;")
            .line("try {")
            .indent()
            .line("ok = condition();")
            .dedent()
            .line("} catch (...) {")
            .indent()
            .line("ok = false;")
            .dedent()
            .line("}")
            .line("if (ok) {")
            .indent()
            .line("std::cout << \"[PASS] \" << name << \"\\n\";")
            .line("passed++;")
            .dedent()
            .line("} else {")
            .indent()
            .line("std::cout << \"[FAIL] \" << name << \"\\n\";")
            .line("failed++;")
            .dedent()
            .line("}")
            .dedent()
            .line("}")
            .blank();

        for case in cases {
            if let Snippet::Block(body) = &case.snippet {
                src.line(format!("static bool {}() {{", case.helper_name()))
                    .indent()
                    .lines(body)
                    .dedent()
                    .line("}")
                    .blank();
            }
        }

        src.line("int main() {").indent();
        src.line("std::cout << \"Running dynamic tests (C++)...\\n\";");
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
            src.line(format!(
                "check(\"{}\", [] {{ return {}; }});",
                case.name(),
                condition
            ));
        }
        src.line("std::cout << \"\\nTotal: \" << (passed + failed) << \" | Passed: \" << passed << \" | Failed: \" << failed << std::endl;")
            .line("return failed == 0 ? 0 : 1;")
            .dedent()
            .line("}");
        src.finish()
    }
}
