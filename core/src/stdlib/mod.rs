//! Standard rules
//!
//! Ready-made rules for well-known integer sequences over `u64`:
//! - Recurrences: [`Fibonacci`], [`HofstadterQ`]
//! - Combinatorics: [`Factorial`], [`Catalan`]
//!
//! Each rule is a unit struct with a `SEEDS` constant, so it works with both
//! sequence types:
//!
//! ```
//! use lazyseq_core::SharedSequence;
//! use lazyseq_core::stdlib::Fibonacci;
//!
//! let fib = SharedSequence::with_rule(Fibonacci::SEEDS, Fibonacci);
//! assert_eq!(fib.get(90).unwrap(), 2_880_067_194_370_816_120);
//! ```
//!
//! Values that no longer fit in a `u64` fail with [`ArithmeticError`] wrapped
//! in [`Error::Generator`](crate::Error::Generator).

use thiserror::Error;

use crate::error::RuleError;
use crate::rule::Lookup;
use crate::sequence::LazySequence;

pub mod combinatorics;
pub mod recurrence;

pub use combinatorics::{Catalan, Factorial};
pub use recurrence::{Fibonacci, HofstadterQ};

/// Failure of a standard rule's arithmetic.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("{operation} overflowed u64")]
    Overflow { operation: &'static str },
}

impl ArithmeticError {
    pub(crate) const fn overflow(operation: &'static str) -> Self {
        ArithmeticError::Overflow { operation }
    }
}

/// Reads the term `back` places before `index`.
///
/// With fewer seeds than a rule expects this steps past index 0, which
/// fails as a domain error of the sequence being read.
pub(crate) fn preceding(
    seq: &dyn Lookup<u64>,
    index: usize,
    back: i64,
) -> Result<u64, RuleError> {
    let position = i64::try_from(index)? - back;
    Ok(seq.get(position)?)
}

/// `0, 1, 1, 2, 3, 5, ...`
pub fn fibonacci() -> LazySequence<u64> {
    LazySequence::with_rule(Fibonacci::SEEDS, Fibonacci)
}

/// `1, 1, 2, 6, 24, ...`, where index `n` holds `n!`.
pub fn factorial() -> LazySequence<u64> {
    LazySequence::with_rule(Factorial::SEEDS, Factorial)
}

/// `1, 1, 2, 5, 14, ...`
pub fn catalan() -> LazySequence<u64> {
    LazySequence::with_rule(Catalan::SEEDS, Catalan)
}

/// `1, 1, 2, 3, 3, 4, ...`, shifted so that index 0 holds `Q(1)`.
pub fn hofstadter_q() -> LazySequence<u64> {
    LazySequence::with_rule(HofstadterQ::SEEDS, HofstadterQ)
}
