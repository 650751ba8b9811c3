//! Counting sequences.

use super::{ArithmeticError, preceding};
use crate::error::RuleError;
use crate::rule::{Lookup, Rule};

/// `n! = n * (n - 1)!` with `0! = 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Factorial;

impl Factorial {
    pub const SEEDS: [u64; 1] = [1];
}

impl Rule<u64> for Factorial {
    fn generate(&self, index: usize, seq: &dyn Lookup<u64>) -> Result<u64, RuleError> {
        let n = u64::try_from(index)?;
        let product = preceding(seq, index, 1)?
            .checked_mul(n)
            .ok_or(ArithmeticError::overflow("multiplication"))?;
        Ok(product)
    }
}

/// Catalan numbers, `C(n) = sum of C(k) * C(n - 1 - k) for k in 0..n`.
///
/// Every term reads all earlier terms, which makes this a good workload for
/// wide rather than deep dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalan;

impl Catalan {
    pub const SEEDS: [u64; 1] = [1];
}

impl Rule<u64> for Catalan {
    fn generate(&self, index: usize, seq: &dyn Lookup<u64>) -> Result<u64, RuleError> {
        let mut sum: u64 = 0;
        for k in 0..index {
            let term = seq
                .get(k)?
                .checked_mul(seq.get(index - 1 - k)?)
                .ok_or(ArithmeticError::overflow("multiplication"))?;
            sum = sum
                .checked_add(term)
                .ok_or(ArithmeticError::overflow("addition"))?;
        }
        Ok(sum)
    }
}

#[cfg(test)]
#[path = "combinatorics_test.rs"]
mod combinatorics_test;
