//! Generator rules and the view they get of their own sequence.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, ReadError, RuleError};
use crate::index::SequenceIndex;

/// Identity of one sequence instance.
///
/// Lets a sequence tell failures of its own nested reads apart from errors a
/// rule got from some other sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequenceId(u64);

impl SequenceId {
    /// A fresh identity, distinct from every other one in the process.
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        SequenceId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Read access to a sequence from inside one of its rules.
///
/// [`LazySequence`](crate::LazySequence) implements this, and so does the
/// per-read view a [`SharedSequence`](crate::SharedSequence) hands to its
/// rules, so the same rule works for either.
pub trait Lookup<T> {
    /// Reads the value at `position`, computing it on a miss.
    fn lookup(&self, position: usize) -> Result<T, Error>;

    /// The largest valid index, if the sequence is bounded.
    fn bound(&self) -> Option<usize>;

    /// The sequence reads are made against.
    fn origin(&self) -> SequenceId;
}

impl<T> dyn Lookup<T> + '_ {
    /// Reads the value at `index`.
    ///
    /// Accepts any primitive integer; negative or out-of-bound indices fail
    /// with [`Error::Domain`]. Propagating the failure with `?` reports it
    /// unchanged from the sequence's own `get`.
    pub fn get<I: SequenceIndex>(&self, index: I) -> Result<T, ReadError> {
        let result = match index.to_position() {
            Some(position) => self.lookup(position),
            None => Err(Error::Domain {
                index: index.to_i128(),
                bound: self.bound(),
            }),
        };
        result.map_err(|error| ReadError::new(self.origin(), error))
    }
}

/// Computes the value at an index from other indices of the same sequence.
///
/// Rules are only invoked for indices past the seeds, at most once per index
/// unless a previous attempt failed. They are expected to be pure.
///
/// Any `Fn(usize, &dyn Lookup<T>) -> Result<T, RuleError>` is a rule:
///
/// ```
/// use lazyseq_core::LazySequence;
///
/// let squares = LazySequence::new([0u64], |i, _| Ok((i * i) as u64));
/// assert_eq!(squares.get(12).unwrap(), 144);
/// ```
pub trait Rule<T> {
    fn generate(&self, index: usize, seq: &dyn Lookup<T>) -> Result<T, RuleError>;
}

impl<T, F> Rule<T> for F
where
    F: Fn(usize, &dyn Lookup<T>) -> Result<T, RuleError>,
{
    #[inline]
    fn generate(&self, index: usize, seq: &dyn Lookup<T>) -> Result<T, RuleError> {
        self(index, seq)
    }
}
