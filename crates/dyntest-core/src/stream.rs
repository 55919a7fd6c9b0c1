//! Deterministic operand stream for dynamic-arithmetic cases.
//!
//! `operands(seed, index)` is a pure function: the same seed and index always
//! produce the same pair, in every process and on every platform. Each index is
//! hashed independently (counter-based SplitMix64), so there is no hidden
//! generator state to keep in sync between regenerations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpecError;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
const MIX_CONST1: u64 = 0xBF58_476D_1CE4_E5B9;
const MIX_CONST2: u64 = 0x94D0_49BB_1331_11EB;

/// Largest operand magnitude produced by the stream.
pub const OPERAND_BOUND: i32 = 1000;

const OPERAND_SPAN: u64 = (OPERAND_BOUND as u64) * 2 + 1;

/// Seed for a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(pub u64);

impl Seed {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Seed(value)
    }
}

impl FromStr for Seed {
    type Err = SpecError;

    /// Accepts decimal (`42`) or `0x`-prefixed hex (`0x2a`). Surrounding
    /// whitespace and `_` separators are tolerated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.trim().chars().filter(|c| *c != '_').collect();
        let parsed = match cleaned
            .strip_prefix("0x")
            .or_else(|| cleaned.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => cleaned.parse::<u64>(),
        };
        parsed.map(Seed).map_err(|_| SpecError::InvalidSeed {
            input: s.to_string(),
        })
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(MIX_CONST1);
    x ^= x >> 27;
    x = x.wrapping_mul(MIX_CONST2);
    x ^ (x >> 31)
}

/// Draw operand `lane` of the pair for `(seed, index)`, uniform over
/// `-OPERAND_BOUND..=OPERAND_BOUND` via rejection sampling.
fn draw_operand(seed: u64, index: u64, lane: u64) -> i32 {
    let threshold = u64::MAX - u64::MAX % OPERAND_SPAN;
    let base = seed
        .wrapping_add(index.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA))
        .wrapping_add(lane.wrapping_mul(MIX_CONST2));

    let mut counter = 0u64;
    loop {
        let candidate = splitmix64(base.wrapping_add(counter.wrapping_mul(GOLDEN_GAMMA)));
        if candidate < threshold {
            return (candidate % OPERAND_SPAN) as i32 - OPERAND_BOUND;
        }
        counter += 1;
    }
}

/// Operand pair for the dynamic case at `index` under `seed`.
pub fn operands(seed: Seed, index: u64) -> (i32, i32) {
    (draw_operand(seed.0, index, 0), draw_operand(seed.0, index, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operands_are_stable_across_calls() {
        for index in 0..64 {
            assert_eq!(operands(Seed(42), index), operands(Seed(42), index));
        }
    }

    #[test]
    fn test_operands_within_bound() {
        for seed in [0u64, 1, 42, u64::MAX] {
            for index in 0..500 {
                let (a, b) = operands(Seed(seed), index);
                assert!((-OPERAND_BOUND..=OPERAND_BOUND).contains(&a));
                assert!((-OPERAND_BOUND..=OPERAND_BOUND).contains(&b));
            }
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a: Vec<_> = (0..16).map(|i| operands(Seed(1), i)).collect();
        let b: Vec<_> = (0..16).map(|i| operands(Seed(2), i)).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_stream_is_pinned() {
        // Regenerated units are diffed against earlier output, so the mapping
        // from (seed, index) to operands must never drift.
        assert_eq!(operands(Seed(42), 0), (312, 629));
        assert_eq!(operands(Seed(42), 1), (888, -977));
        assert_eq!(operands(Seed(42), 2), (-832, 372));
        assert_eq!(splitmix64(0), 0);
    }

    #[test]
    fn test_operands_cover_both_signs() {
        let pairs: Vec<_> = (0..200).map(|i| operands(Seed(7), i)).collect();
        assert!(pairs.iter().any(|(a, _)| *a < 0));
        assert!(pairs.iter().any(|(a, _)| *a > 0));
    }

    #[test]
    fn test_seed_parse() {
        assert_eq!("42".parse::<Seed>().unwrap(), Seed(42));
        assert_eq!(" 0x2a ".parse::<Seed>().unwrap(), Seed(42));
        assert_eq!("1_000".parse::<Seed>().unwrap(), Seed(1000));
        assert!("forty-two".parse::<Seed>().is_err());
        assert!("-1".parse::<Seed>().is_err());
        assert!("".parse::<Seed>().is_err());
    }
}
