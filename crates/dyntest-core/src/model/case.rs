//! Language-neutral description of a single test case.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::semantics::{Applicability, ArithmeticModel, DivisionByZero, OverflowSemantics};

/// Case category. Only dynamic-arithmetic cases take part in cross-language
/// parity checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "static-edge-case")]
    StaticEdgeCase,
    #[serde(rename = "dynamic-arithmetic")]
    DynamicArithmetic,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::StaticEdgeCase => "static-edge-case",
            Category::DynamicArithmetic => "dynamic-arithmetic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary operator of a dynamic-arithmetic case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

impl ArithOp {
    /// Operator for the dynamic case at `index`.
    pub fn for_index(index: u64) -> Self {
        match index % 3 {
            0 => ArithOp::Add,
            1 => ArithOp::Sub,
            _ => ArithOp::Mul,
        }
    }

    /// Source-level operator symbol; identical in every target language.
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
        }
    }

    /// Reference semantics: 32-bit two's-complement wrap-around.
    pub fn wrapping(&self, lhs: i32, rhs: i32) -> i32 {
        match self {
            ArithOp::Add => lhs.wrapping_add(rhs),
            ArithOp::Sub => lhs.wrapping_sub(rhs),
            ArithOp::Mul => lhs.wrapping_mul(rhs),
        }
    }

    pub fn checked(&self, lhs: i32, rhs: i32) -> Option<i32> {
        match self {
            ArithOp::Add => lhs.checked_add(rhs),
            ArithOp::Sub => lhs.checked_sub(rhs),
            ArithOp::Mul => lhs.checked_mul(rhs),
        }
    }

    /// Value of `lhs op rhs` under `semantics`; `None` when a checked
    /// language would trap.
    pub fn evaluate(&self, lhs: i32, rhs: i32, semantics: OverflowSemantics) -> Option<i64> {
        match semantics {
            OverflowSemantics::Wrapping32 => Some(i64::from(self.wrapping(lhs, rhs))),
            OverflowSemantics::Checked => self.checked(lhs, rhs).map(i64::from),
            OverflowSemantics::Unbounded => {
                let (a, b) = (i64::from(lhs), i64::from(rhs));
                Some(match self {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                })
            }
        }
    }
}

/// Fixed edge-case checks. Each emitter knows how to express every variant
/// in its own language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticCheck {
    /// `INT32_MAX + 1 == INT32_MIN`
    IntMaxWraps,
    /// `INT32_MIN - 1 == INT32_MAX`
    IntMinWraps,
    /// `2147483647 + 1 == 2147483648`
    IntMaxPromotes,
    /// `INT32_MAX + 1` is reported as overflow.
    IntMaxChecked,
    /// `INT32_MIN - 1` is reported as overflow.
    IntMinChecked,
    StringConcat,
    StringLength,
    /// Sum of `0..1000` is `499500`.
    ArraySum,
    DivisionByZeroDetected,
    InvalidParseRejected,
    BitwiseMasks,
    FloatPrecision,
}

impl StaticCheck {
    /// The full static catalogue, in emission order.
    pub const ALL: [StaticCheck; 12] = [
        StaticCheck::IntMaxWraps,
        StaticCheck::IntMinWraps,
        StaticCheck::IntMaxPromotes,
        StaticCheck::IntMaxChecked,
        StaticCheck::IntMinChecked,
        StaticCheck::StringConcat,
        StaticCheck::StringLength,
        StaticCheck::ArraySum,
        StaticCheck::DivisionByZeroDetected,
        StaticCheck::InvalidParseRejected,
        StaticCheck::BitwiseMasks,
        StaticCheck::FloatPrecision,
    ];

    pub fn case_name(&self) -> &'static str {
        match self {
            StaticCheck::IntMaxWraps => "int_max_wraps",
            StaticCheck::IntMinWraps => "int_min_wraps",
            StaticCheck::IntMaxPromotes => "int_max_promotes",
            StaticCheck::IntMaxChecked => "int_max_checked",
            StaticCheck::IntMinChecked => "int_min_checked",
            StaticCheck::StringConcat => "string_concat",
            StaticCheck::StringLength => "string_length",
            StaticCheck::ArraySum => "array_sum",
            StaticCheck::DivisionByZeroDetected => "division_by_zero_detected",
            StaticCheck::InvalidParseRejected => "invalid_parse_rejected",
            StaticCheck::BitwiseMasks => "bitwise_masks",
            StaticCheck::FloatPrecision => "float_precision",
        }
    }

    pub fn group(&self) -> &'static str {
        match self {
            StaticCheck::IntMaxWraps
            | StaticCheck::IntMinWraps
            | StaticCheck::IntMaxPromotes
            | StaticCheck::IntMaxChecked
            | StaticCheck::IntMinChecked
            | StaticCheck::FloatPrecision => "Arithmetic",
            StaticCheck::StringConcat | StaticCheck::StringLength => "Strings",
            StaticCheck::ArraySum => "Arrays",
            StaticCheck::DivisionByZeroDetected | StaticCheck::InvalidParseRejected => {
                "Exceptions"
            }
            StaticCheck::BitwiseMasks => "Bitwise",
        }
    }

    pub fn applicability(&self) -> Applicability {
        match self {
            StaticCheck::IntMaxWraps | StaticCheck::IntMinWraps => {
                Applicability::overflow(OverflowSemantics::Wrapping32)
            }
            StaticCheck::IntMaxPromotes => Applicability::overflow(OverflowSemantics::Unbounded),
            StaticCheck::IntMaxChecked | StaticCheck::IntMinChecked => {
                Applicability::overflow(OverflowSemantics::Checked)
            }
            StaticCheck::DivisionByZeroDetected => Applicability::division_error(),
            _ => Applicability::universal(),
        }
    }

    /// Outcome of the check in a correct implementation of `model`.
    /// `None` when the check is not applicable to `model`.
    pub fn reference_outcome(&self, model: &ArithmeticModel) -> Option<bool> {
        if !self.applicability().admits(model) {
            return None;
        }
        Some(match self {
            StaticCheck::DivisionByZeroDetected => {
                model.division_by_zero == DivisionByZero::Raises
            }
            _ => true,
        })
    }
}

/// What a case evaluates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    /// `lhs op rhs == result`, `result` computed with wrap-around semantics.
    Arithmetic {
        lhs: i32,
        op: ArithOp,
        rhs: i32,
        result: i32,
    },
    /// A fixed boolean check.
    Static { check: StaticCheck },
}

/// One test case of a suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique within a suite; `[A-Za-z0-9_]+`.
    pub name: String,
    pub category: Category,
    /// Display grouping, e.g. `Arithmetic` or `Strings`.
    pub group: String,
    pub expression: Expression,
    /// The boolean the expression must evaluate to for the case to pass.
    pub expected: bool,
    pub applicability: Applicability,
}

impl TestCase {
    /// Build the static case for `check`.
    pub fn from_static(check: StaticCheck) -> Self {
        Self {
            name: check.case_name().to_string(),
            category: Category::StaticEdgeCase,
            group: check.group().to_string(),
            expression: Expression::Static { check },
            expected: true,
            applicability: check.applicability(),
        }
    }

    /// Build a dynamic-arithmetic case. The expected result is computed with
    /// wrap-around semantics; if the operation overflows, the case is only
    /// applicable to wrapping languages.
    pub fn arithmetic(name: impl Into<String>, lhs: i32, op: ArithOp, rhs: i32) -> Self {
        let applicability = match op.checked(lhs, rhs) {
            Some(_) => Applicability::universal(),
            None => Applicability::overflow(OverflowSemantics::Wrapping32),
        };
        Self {
            name: name.into(),
            category: Category::DynamicArithmetic,
            group: "Dynamic".to_string(),
            expression: Expression::Arithmetic {
                lhs,
                op,
                rhs,
                result: op.wrapping(lhs, rhs),
            },
            expected: true,
            applicability,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.category == Category::DynamicArithmetic
    }

    pub fn applies_to(&self, model: &ArithmeticModel) -> bool {
        self.applicability.admits(model)
    }

    /// Whether a correct implementation of `model` passes this case.
    /// `None` when the case is not applicable to `model`.
    pub fn reference_outcome(&self, model: &ArithmeticModel) -> Option<bool> {
        if !self.applies_to(model) {
            return None;
        }
        match &self.expression {
            Expression::Arithmetic {
                lhs,
                op,
                rhs,
                result,
            } => {
                let holds = op
                    .evaluate(*lhs, *rhs, model.overflow)
                    .map(|v| v == i64::from(*result))
                    .unwrap_or(false);
                Some(holds == self.expected)
            }
            Expression::Static { check } => check
                .reference_outcome(model)
                .map(|holds| holds == self.expected),
        }
    }
}

/// Whether `name` can be embedded verbatim in every target language.
pub fn is_valid_case_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAVA_LIKE: ArithmeticModel = ArithmeticModel {
        overflow: OverflowSemantics::Wrapping32,
        division_by_zero: DivisionByZero::Raises,
    };
    const PYTHON_LIKE: ArithmeticModel = ArithmeticModel {
        overflow: OverflowSemantics::Unbounded,
        division_by_zero: DivisionByZero::Raises,
    };

    #[test]
    fn test_operator_rotation() {
        assert_eq!(ArithOp::for_index(0), ArithOp::Add);
        assert_eq!(ArithOp::for_index(1), ArithOp::Sub);
        assert_eq!(ArithOp::for_index(2), ArithOp::Mul);
        assert_eq!(ArithOp::for_index(3), ArithOp::Add);
    }

    #[test]
    fn test_arithmetic_case_uses_wrapping_result() {
        let case = TestCase::arithmetic("dynamic_1", 769, ArithOp::Add, -327);
        assert_eq!(
            case.expression,
            Expression::Arithmetic {
                lhs: 769,
                op: ArithOp::Add,
                rhs: -327,
                result: 442
            }
        );
        assert!(case.applicability.is_universal());
        assert!(case.is_dynamic());
    }

    #[test]
    fn test_overflowing_case_is_wrapping_only() {
        let case = TestCase::arithmetic("dynamic_x", i32::MAX, ArithOp::Add, 1);
        match case.expression {
            Expression::Arithmetic { result, .. } => assert_eq!(result, i32::MIN),
            _ => panic!("expected arithmetic expression"),
        }
        assert!(case.applies_to(&JAVA_LIKE));
        assert!(!case.applies_to(&PYTHON_LIKE));
        assert_eq!(case.reference_outcome(&JAVA_LIKE), Some(true));
        assert_eq!(case.reference_outcome(&PYTHON_LIKE), None);
    }

    #[test]
    fn test_unbounded_evaluation_differs_on_overflow() {
        assert_eq!(
            ArithOp::Mul.evaluate(70_000, 70_000, OverflowSemantics::Unbounded),
            Some(4_900_000_000)
        );
        assert_eq!(
            ArithOp::Mul.evaluate(70_000, 70_000, OverflowSemantics::Checked),
            None
        );
        assert_eq!(
            ArithOp::Mul.evaluate(70_000, 70_000, OverflowSemantics::Wrapping32),
            Some(i64::from(70_000i32.wrapping_mul(70_000)))
        );
    }

    #[test]
    fn test_static_catalogue_names_are_unique_and_valid() {
        let mut names: Vec<_> = StaticCheck::ALL.iter().map(|c| c.case_name()).collect();
        assert!(names.iter().all(|n| is_valid_case_name(n)));
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), StaticCheck::ALL.len());
    }

    #[test]
    fn test_static_case_applicability() {
        let wraps = TestCase::from_static(StaticCheck::IntMaxWraps);
        assert!(wraps.applies_to(&JAVA_LIKE));
        assert!(!wraps.applies_to(&PYTHON_LIKE));

        let promotes = TestCase::from_static(StaticCheck::IntMaxPromotes);
        assert!(!promotes.applies_to(&JAVA_LIKE));
        assert!(promotes.applies_to(&PYTHON_LIKE));

        let concat = TestCase::from_static(StaticCheck::StringConcat);
        assert_eq!(concat.category, Category::StaticEdgeCase);
        assert_eq!(concat.group, "Strings");
        assert!(concat.applicability.is_universal());
    }

    #[test]
    fn test_case_name_validation() {
        assert!(is_valid_case_name("dynamic_12"));
        assert!(!is_valid_case_name(""));
        assert!(!is_valid_case_name("has space"));
        assert!(!is_valid_case_name("quote\""));
    }

    #[test]
    fn test_category_serializes_with_hyphens() {
        let json = serde_json::to_string(&Category::DynamicArithmetic).unwrap();
        assert_eq!(json, r#""dynamic-arithmetic""#);
    }
}
