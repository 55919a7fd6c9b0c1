use super::source::SourceBuilder;
use super::{header_lines, Emitter, Language, PreparedCase, Snippet};
use crate::model::{ArithmeticModel, DivisionByZero, OverflowSemantics, StaticCheck, TestSuiteSpec};

/// Java. `int` wraps at 32 bits; integer division by zero throws
/// `ArithmeticException`.
pub struct JavaEmitter;

/// Class name; must match [`Language::file_name`].
pub(crate) const MAIN_CLASS: &str = "DynamicTest";

fn block(lines: &[&str]) -> Option<Snippet> {
    Some(Snippet::Block(lines.iter().map(|l| l.to_string()).collect()))
}

impl Emitter for JavaEmitter {
    fn language(&self) -> Language {
        Language::Java
    }

    fn arithmetic_model(&self) -> ArithmeticModel {
        ArithmeticModel {
            overflow: OverflowSemantics::Wrapping32,
            division_by_zero: DivisionByZero::Raises,
        }
    }

    fn static_check(&self, check: StaticCheck) -> Option<Snippet> {
        match check {
            StaticCheck::IntMaxWraps => block(&[
                "int value = Integer.MAX_VALUE;",
                "value = value + 1;",
                "return value == Integer.MIN_VALUE;",
            ]),
            StaticCheck::IntMinWraps => block(&[
                "int value = Integer.MIN_VALUE;",
                "value = value - 1;",
                "return value == Integer.MAX_VALUE;",
            ]),
            StaticCheck::IntMaxPromotes | StaticCheck::IntMaxChecked | StaticCheck::IntMinChecked => {
                None
            }
            StaticCheck::StringConcat => Some(Snippet::Expr(
                "(\"Hello\" + \" \" + \"World\").equals(\"Hello World\")".to_string(),
            )),
            StaticCheck::StringLength => Some(Snippet::Expr("\"Test\".length() == 4".to_string())),
            StaticCheck::ArraySum => block(&[
                "int[] values = new int[1000];",
                "int sum = 0;",
                "for (int i = 0; i < values.length; i++) {",
                "    values[i] = i;",
                "    sum += values[i];",
                "}",
                "return sum == 499500;",
            ]),
            StaticCheck::DivisionByZeroDetected => block(&[
                "int zero = 0;",
                "try {",
                "    int quotient = 1 / zero;",
                "    return quotient < 0;",
                "} catch (ArithmeticException e) {",
                "    return true;",
                "}",
            ]),
            StaticCheck::InvalidParseRejected => block(&[
                "try {",
                "    Integer.parseInt(\"invalid\");",
                "    return false;",
                "} catch (NumberFormatException e) {",
                "    return true;",
                "}",
            ]),
            StaticCheck::BitwiseMasks => block(&[
                "int a = 0xF0F0F0F0;",
                "int b = 0x0F0F0F0F;",
                "return (a & b) == 0 && (a | b) == 0xFFFFFFFF;",
            ]),
            StaticCheck::FloatPrecision => Some(Snippet::Expr(
                "Math.abs((0.1 + 0.2) - 0.3) < 1e-10".to_string(),
            )),
        }
    }

    fn int_literal(&self, value: i32) -> String {
        match value {
            i32::MIN => "Integer.MIN_VALUE".to_string(),
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
            .line("import java.util.function.BooleanSupplier;")
            .blank();

        src.line(format!("public class {} {{", MAIN_CLASS)).indent();
        src.line("private static int passed = 0;")
            .line("private static int failed = 0;")
            .blank();

        src.line("private static void check(String name, BooleanSupplier condition) {")
            .indent()
            .line("boolean ok;")
            .line("try {")
            .indent()
            .line("ok = condition.getAsBoolean();")
            .dedent()
            .line("} catch (RuntimeException e) {")
            .indent()
            .line("ok = false;")
            .dedent()
            .line("}")
            .line("if (ok) {")
            .indent()
            .line("System.out.println(\"[PASS] \" + name);")
            .line("passed++;")
            .dedent()
            .line("} else {")
            .indent()
            .line("System.out.println(\"[FAIL] \" + name);")
            .line("failed++;")
            .dedent()
            .line("}")
            .dedent()
            .line("}")
            .blank();

        for case in cases {
            if let Snippet::Block(body) = &case.snippet {
                src.line(format!("private static boolean {}() {{", case.helper_name()))
                    .indent()
                    .lines(body)
                    .dedent()
                    .line("}")
                    .blank();
            }
        }

        src.line("public static void main(String[] args) {").indent();
        src.line("System.out.println(\"Running dynamic tests (Java)...\");");
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
            src.line(format!("check(\"{}\", () -> {});", case.name(), condition));
        }
        src.line("System.out.println();")
            .line("System.out.println(\"Total: \" + (passed + failed) + \" | Passed: \" + passed + \" | Failed: \" + failed);")
            .line("System.exit(failed == 0 ? 0 : 1);")
            .dedent()
            .line("}")
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
    fn test_java_unit_shape() {
        let spec = TestSuiteSpec::generate(Seed(42), 2).unwrap();
        let unit = JavaEmitter.render(&spec);
        let src = &unit.source;

        assert_eq!(unit.file_name, format!("{}.java", MAIN_CLASS));
        assert!(src.contains("public class DynamicTest {"));
        assert!(src.contains("        check(\"dynamic_2\", () -> 888 - (-977) == 1865);"));
        assert!(src.contains("private static boolean case_division_by_zero_detected() {"));
        assert!(src.contains("catch (ArithmeticException e)"));
        assert!(src.contains("System.exit(failed == 0 ? 0 : 1);"));
        assert!(!src.contains("\"int_max_checked\""));
    }
}
