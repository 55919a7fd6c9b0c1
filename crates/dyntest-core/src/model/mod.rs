//! Language-neutral test specification model.

pub mod case;
pub mod semantics;
pub mod suite;

pub use case::{is_valid_case_name, ArithOp, Category, Expression, StaticCheck, TestCase};
pub use semantics::{Applicability, ArithmeticModel, DivisionByZero, OverflowSemantics};
pub use suite::{TestSuiteSpec, MAX_DYNAMIC_CASES};
