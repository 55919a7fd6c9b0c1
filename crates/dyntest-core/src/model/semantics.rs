//! Arithmetic models and per-case applicability.
//!
//! Cases never name languages. A case states which arithmetic behaviour it
//! depends on; each emitter resolves that against its own language's model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a language's default signed 32-bit integer type behaves on overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OverflowSemantics {
    /// Two's-complement wrap-around at 32 bits.
    #[serde(rename = "wrapping-32")]
    Wrapping32,
    /// Overflow is detected and reported (panic or `None`).
    #[serde(rename = "checked")]
    Checked,
    /// Integers grow without bound.
    #[serde(rename = "unbounded")]
    Unbounded,
}

impl OverflowSemantics {
    pub fn tag(&self) -> &'static str {
        match self {
            OverflowSemantics::Wrapping32 => "wrapping-32",
            OverflowSemantics::Checked => "checked",
            OverflowSemantics::Unbounded => "unbounded",
        }
    }
}

impl fmt::Display for OverflowSemantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// What integer division by zero does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivisionByZero {
    /// Raises an error the program can observe (exception, panic, `None`).
    Raises,
    /// Undefined behaviour; cannot be tested portably.
    Undefined,
}

/// Arithmetic behaviour of one target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArithmeticModel {
    pub overflow: OverflowSemantics,
    pub division_by_zero: DivisionByZero,
}

/// Which arithmetic models a case is meaningful under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Applicability {
    /// Required overflow semantics, `None` when the case never overflows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overflow: Option<OverflowSemantics>,
    /// Whether the case needs division by zero to raise an observable error.
    #[serde(default)]
    pub needs_division_error: bool,
}

impl Applicability {
    /// Applicable under every model.
    pub fn universal() -> Self {
        Self::default()
    }

    /// Applicable only where overflow behaves as `semantics`.
    pub fn overflow(semantics: OverflowSemantics) -> Self {
        Self {
            overflow: Some(semantics),
            needs_division_error: false,
        }
    }

    /// Applicable only where division by zero raises.
    pub fn division_error() -> Self {
        Self {
            overflow: None,
            needs_division_error: true,
        }
    }

    pub fn is_universal(&self) -> bool {
        self.overflow.is_none() && !self.needs_division_error
    }

    /// Whether a language with `model` can run this case with the expected result.
    pub fn admits(&self, model: &ArithmeticModel) -> bool {
        if let Some(required) = self.overflow {
            if required != model.overflow {
                return false;
            }
        }
        !self.needs_division_error || model.division_by_zero == DivisionByZero::Raises
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WRAP_UB: ArithmeticModel = ArithmeticModel {
        overflow: OverflowSemantics::Wrapping32,
        division_by_zero: DivisionByZero::Undefined,
    };
    const BIGINT: ArithmeticModel = ArithmeticModel {
        overflow: OverflowSemantics::Unbounded,
        division_by_zero: DivisionByZero::Raises,
    };

    #[test]
    fn test_universal_admits_everything() {
        assert!(Applicability::universal().admits(&WRAP_UB));
        assert!(Applicability::universal().admits(&BIGINT));
        assert!(Applicability::universal().is_universal());
    }

    #[test]
    fn test_overflow_requirement() {
        let wrap = Applicability::overflow(OverflowSemantics::Wrapping32);
        assert!(wrap.admits(&WRAP_UB));
        assert!(!wrap.admits(&BIGINT));
        assert!(!wrap.is_universal());
    }

    #[test]
    fn test_division_requirement() {
        let div = Applicability::division_error();
        assert!(!div.admits(&WRAP_UB));
        assert!(div.admits(&BIGINT));
    }

    #[test]
    fn test_semantics_tags_serialize() {
        let json = serde_json::to_string(&OverflowSemantics::Wrapping32).unwrap();
        assert_eq!(json, r#""wrapping-32""#);
        assert_eq!(OverflowSemantics::Checked.to_string(), "checked");
        assert_eq!(OverflowSemantics::Unbounded.tag(), "unbounded");
    }
}
