//! Test suite specification: the static catalogue plus seeded dynamic cases.

use std::collections::HashSet;

use serde::Serialize;

use super::case::{is_valid_case_name, ArithOp, StaticCheck, TestCase};
use crate::digest::json_digest;
use crate::error::{Result, SpecError};
use crate::obs;
use crate::stream::{operands, Seed};

/// Upper limit on dynamic cases per suite.
pub const MAX_DYNAMIC_CASES: usize = 10_000;

/// Ordered, immutable set of test cases shared by every emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSuiteSpec {
    seed: Seed,
    dynamic_cases: usize,
    cases: Vec<TestCase>,
    spec_digest: String,
}

#[derive(Serialize)]
struct DigestInput<'a> {
    seed: Seed,
    cases: &'a [TestCase],
}

impl TestSuiteSpec {
    /// Generate the full suite for `seed`: the static catalogue followed by
    /// `dynamic_cases` cases drawn from the operand stream.
    pub fn generate(seed: Seed, dynamic_cases: usize) -> Result<Self> {
        if dynamic_cases == 0 {
            return Err(SpecError::ZeroDynamicCases);
        }
        if dynamic_cases > MAX_DYNAMIC_CASES {
            return Err(SpecError::TooManyDynamicCases {
                requested: dynamic_cases,
                limit: MAX_DYNAMIC_CASES,
            });
        }

        let mut cases: Vec<TestCase> = StaticCheck::ALL
            .iter()
            .map(|check| TestCase::from_static(*check))
            .collect();

        for index in 0..dynamic_cases as u64 {
            let (lhs, rhs) = operands(seed, index);
            let op = ArithOp::for_index(index);
            cases.push(TestCase::arithmetic(
                format!("dynamic_{}", index + 1),
                lhs,
                op,
                rhs,
            ));
        }

        let spec = Self::from_cases(seed, cases)?;
        obs::emit_suite_generated(
            seed.value(),
            &spec.spec_digest,
            spec.static_count(),
            spec.dynamic_cases,
        );
        Ok(spec)
    }

    /// Build a suite from an explicit case list, validating names.
    pub fn from_cases(seed: Seed, cases: Vec<TestCase>) -> Result<Self> {
        let mut seen = HashSet::new();
        for case in &cases {
            if !is_valid_case_name(&case.name) {
                return Err(SpecError::InvalidCaseName(case.name.clone()));
            }
            if !seen.insert(case.name.as_str()) {
                return Err(SpecError::DuplicateCaseName(case.name.clone()));
            }
        }

        let spec_digest = json_digest(&DigestInput {
            seed,
            cases: &cases,
        })?;
        let dynamic_cases = cases.iter().filter(|c| c.is_dynamic()).count();

        Ok(Self {
            seed,
            dynamic_cases,
            cases,
            spec_digest,
        })
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn dynamic_count(&self) -> usize {
        self.dynamic_cases
    }

    pub fn static_count(&self) -> usize {
        self.cases.len() - self.dynamic_cases
    }

    /// SHA-256 over the seed and the ordered cases.
    pub fn spec_digest(&self) -> &str {
        &self.spec_digest
    }

    pub fn case(&self, name: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.name == name)
    }
}
