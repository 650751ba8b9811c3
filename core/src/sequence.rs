//! Single-threaded lazy sequences.

use alloc::collections::BTreeMap;
use core::cell::RefCell;
use core::fmt;

use crate::cell::{CellState, CellStatus, CellStore};
use crate::chain::EvaluationChain;
use crate::error::{Error, RuleError};
use crate::index::SequenceIndex;
use crate::options::{Extent, SequenceOptions};
use crate::rule::{Lookup, Rule, SequenceId};

/// A memoizing sequence whose elements are defined in terms of each other.
///
/// Indices below the seed count hold the seeds. Every other index is computed
/// by the rule the first time it is read, directly or from inside the rule
/// while computing another index, and cached from then on.
///
/// Reads go through a shared reference, so a rule can read its own sequence
/// while it is being evaluated. The sequence is not `Sync`; see
/// [`SharedSequence`](crate::SharedSequence) for concurrent readers.
///
/// # Example
///
/// ```
/// use lazyseq_core::LazySequence;
///
/// let fib = LazySequence::new([0u64, 1], |i, seq| Ok(seq.get(i - 1)? + seq.get(i - 2)?));
/// assert_eq!(fib.get(10).unwrap(), 55);
/// assert_eq!(fib.get(7).unwrap(), 13);
/// assert!(fib.get(-1).is_err());
/// ```
pub struct LazySequence<T> {
    cells: RefCell<CellStore<T>>,
    chain: RefCell<EvaluationChain>,
    rule: Box<dyn Rule<T>>,
    options: SequenceOptions,
    id: SequenceId,
}

static_assertions::assert_not_impl_any!(LazySequence<u64>: Sync);

impl<T: Clone> LazySequence<T> {
    /// Create an unbounded sequence from seeds and a closure.
    ///
    /// Never invokes the rule.
    pub fn new(
        seeds: impl IntoIterator<Item = T>,
        rule: impl Fn(usize, &dyn Lookup<T>) -> Result<T, RuleError> + 'static,
    ) -> Self {
        Self::with_rule(seeds, rule)
    }

    /// Like [`new`](Self::new), for any [`Rule`] implementation.
    pub fn with_rule(seeds: impl IntoIterator<Item = T>, rule: impl Rule<T> + 'static) -> Self {
        Self::from_parts(
            SequenceOptions::default(),
            CellStore::seeded(seeds),
            Box::new(rule),
        )
    }

    /// Create a sequence whose valid indices are `0..=max_index`.
    ///
    /// Fails with [`Error::Configuration`] if `max_index` would cut off a seed.
    pub fn bounded(
        seeds: impl IntoIterator<Item = T>,
        max_index: usize,
        rule: impl Fn(usize, &dyn Lookup<T>) -> Result<T, RuleError> + 'static,
    ) -> Result<Self, Error> {
        Self::with_options(SequenceOptions::new().with_bound(max_index), seeds, rule)
    }

    /// Create a sequence with explicit options.
    pub fn with_options(
        options: SequenceOptions,
        seeds: impl IntoIterator<Item = T>,
        rule: impl Rule<T> + 'static,
    ) -> Result<Self, Error> {
        let cells = CellStore::seeded(seeds);
        options.validate(cells.seed_count())?;
        Ok(Self::from_parts(options, cells, Box::new(rule)))
    }

    fn from_parts(options: SequenceOptions, cells: CellStore<T>, rule: Box<dyn Rule<T>>) -> Self {
        Self {
            cells: RefCell::new(cells),
            chain: RefCell::new(EvaluationChain::new()),
            rule,
            options,
            id: SequenceId::fresh(),
        }
    }

    /// Returns the value at `index`, computing and caching it if needed.
    ///
    /// # Errors
    ///
    /// - [`Error::Domain`] if `index` is negative or past the bound.
    /// - [`Error::Cycle`] if computing `index` requires `index` itself.
    /// - [`Error::Generator`] if the rule fails. The cell stays empty, so a
    ///   later call retries.
    /// - [`Error::DepthExceeded`] if the read needs more than `max_depth`
    ///   nested evaluations.
    pub fn get<I: SequenceIndex>(&self, index: I) -> Result<T, Error> {
        let position = self.options.position(index)?;
        self.resolve(position)
    }

    /// Computes every index up to and including `max_index`, in ascending
    /// order, stopping at the first error.
    ///
    /// Warming a sequence this way keeps rules that read the previous few
    /// indices from recursing more than one level deep.
    pub fn force_through<I: SequenceIndex>(&self, max_index: I) -> Result<(), Error> {
        let last = self.options.position(max_index)?;
        let first = self.seed_count();
        for position in first..=last {
            self.resolve(position)?;
        }
        Ok(())
    }

    fn resolve(&self, index: usize) -> Result<T, Error> {
        match self.cells.borrow().state(index) {
            CellState::Computed(value) => {
                tracing::trace!(index, "cache hit");
                return Ok(value.clone());
            }
            CellState::Computing => {
                let chain = self.chain.borrow().cycle_through(index, &[]);
                tracing::debug!(index, ?chain, "cycle detected");
                return Err(Error::Cycle { index, chain });
            }
            CellState::Empty => {}
        }

        let evaluation = Evaluation::begin(self, index)?;
        let result = self.rule.generate(index, self);
        evaluation.finish(result)
    }

    /// Snapshot of every computed cell, seeds included, keyed by index.
    pub fn snapshot(&self) -> BTreeMap<usize, T> {
        self.cells
            .borrow()
            .computed()
            .map(|(index, value)| (index, value.clone()))
            .collect()
    }
}

impl<T> LazySequence<T> {
    pub fn seed_count(&self) -> usize {
        self.cells.borrow().seed_count()
    }

    pub fn options(&self) -> &SequenceOptions {
        &self.options
    }

    pub fn extent(&self) -> Extent {
        self.options.extent()
    }

    pub fn bound(&self) -> Option<usize> {
        self.options.bound
    }

    pub fn has_bound(&self) -> bool {
        self.options.bound.is_some()
    }

    /// Evaluation state of `index`, without computing anything.
    pub fn status(&self, index: usize) -> CellStatus {
        self.cells.borrow().state(index).status()
    }

    pub fn is_computed(&self, index: usize) -> bool {
        self.status(index) == CellStatus::Computed
    }

    /// Number of computed cells, seeds included.
    pub fn computed_count(&self) -> usize {
        self.cells.borrow().computed_count()
    }

    /// Swaps in a different rule.
    ///
    /// Computed cells are kept; only indices that are still empty will use
    /// the new rule. Useful for retrying after a rule failed.
    pub fn replace_rule(&mut self, rule: impl Rule<T> + 'static) {
        self.rule = Box::new(rule);
    }
}

impl<T: Clone> Lookup<T> for LazySequence<T> {
    fn lookup(&self, position: usize) -> Result<T, Error> {
        self.get(position)
    }

    fn bound(&self) -> Option<usize> {
        self.options.bound
    }

    fn origin(&self) -> SequenceId {
        self.id
    }
}

impl<T> fmt::Debug for LazySequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySequence")
            .field("seed_count", &self.seed_count())
            .field("computed", &self.computed_count())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// An index whose rule is running.
///
/// Dropping it without a stored value (rule error, early return, or a panic
/// in the rule) puts the cell back to `Empty`.
struct Evaluation<'s, T> {
    seq: &'s LazySequence<T>,
    index: usize,
}

impl<'s, T: Clone> Evaluation<'s, T> {
    fn begin(seq: &'s LazySequence<T>, index: usize) -> Result<Self, Error> {
        let mut chain = seq.chain.borrow_mut();
        chain.enter(index, seq.options.max_depth)?;
        tracing::trace!(index, depth = chain.depth(), "evaluating");
        drop(chain);
        seq.cells.borrow_mut().begin(index);
        Ok(Self { seq, index })
    }

    fn finish(self, result: Result<T, RuleError>) -> Result<T, Error> {
        match result {
            Ok(value) => {
                self.seq
                    .cells
                    .borrow_mut()
                    .complete(self.index, value.clone());
                tracing::debug!(index = self.index, "computed");
                Ok(value)
            }
            Err(error) => {
                let error = Error::from_rule(self.seq.id, self.index, error);
                tracing::debug!(index = self.index, %error, "evaluation failed");
                Err(error)
            }
        }
    }
}

impl<T> Drop for Evaluation<'_, T> {
    fn drop(&mut self) {
        if let Ok(mut cells) = self.seq.cells.try_borrow_mut() {
            cells.reset(self.index);
        }
        if let Ok(mut chain) = self.seq.chain.try_borrow_mut() {
            chain.leave(self.index);
        }
    }
}

#[cfg(test)]
#[path = "sequence_test.rs"]
mod sequence_test;
