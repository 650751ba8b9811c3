//! Sequences defined by recurrences over earlier terms.

use super::{ArithmeticError, preceding};
use crate::error::RuleError;
use crate::rule::{Lookup, Rule};

/// `F(n) = F(n - 1) + F(n - 2)` with `F(0) = 0`, `F(1) = 1`.
///
/// `F(93)` is the last term that fits in a `u64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fibonacci;

impl Fibonacci {
    pub const SEEDS: [u64; 2] = [0, 1];
}

impl Rule<u64> for Fibonacci {
    fn generate(&self, index: usize, seq: &dyn Lookup<u64>) -> Result<u64, RuleError> {
        let sum = preceding(seq, index, 1)?
            .checked_add(preceding(seq, index, 2)?)
            .ok_or(ArithmeticError::overflow("addition"))?;
        Ok(sum)
    }
}

/// Hofstadter's Q sequence, `Q(n) = Q(n - Q(n - 1)) + Q(n - Q(n - 2))`.
///
/// Indices are shifted by one: index `i` holds `Q(i + 1)`. The rule reads
/// indices that depend on earlier values, so evaluation order jumps around
/// instead of walking down one step at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct HofstadterQ;

impl HofstadterQ {
    pub const SEEDS: [u64; 2] = [1, 1];
}

impl Rule<u64> for HofstadterQ {
    fn generate(&self, index: usize, seq: &dyn Lookup<u64>) -> Result<u64, RuleError> {
        let i = i64::try_from(index)?;
        let a = i - i64::try_from(preceding(seq, index, 1)?)?;
        let b = i - i64::try_from(preceding(seq, index, 2)?)?;
        // A step past index 0 surfaces as a domain error from `get`.
        let sum = seq
            .get(a)?
            .checked_add(seq.get(b)?)
            .ok_or(ArithmeticError::overflow("addition"))?;
        Ok(sum)
    }
}

#[cfg(test)]
#[path = "recurrence_test.rs"]
mod recurrence_test;
