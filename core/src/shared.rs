//! Lazy sequences shared between threads.
//!
//! A [`SharedSequence`] keeps its cells behind a mutex and runs rules with the
//! lock released. Each top-level [`SharedSequence::get`] starts a new
//! evaluation chain, represented by a resolver that the rule receives in
//! place of the sequence. That is how the sequence tells the two reasons a
//! cell can be `Computing` apart:
//!
//! - the cell belongs to the reader's own chain: the rule needs its own
//!   value, which is a cycle;
//! - the cell belongs to another chain: another thread is computing it, and
//!   the reader blocks until it is done.
//!
//! If blocking would make a set of chains wait on each other forever, the
//! reader fails with [`Error::Cycle`] instead.

use alloc::collections::BTreeMap;
use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;

use crate::cell::{CellState, CellStatus, CellStore};
use crate::chain::EvaluationChain;
use crate::error::{Error, RuleError};
use crate::index::SequenceIndex;
use crate::options::{Extent, SequenceOptions};
use crate::rule::{Lookup, Rule, SequenceId};

/// Identifies one top-level read and everything it evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ChainId(u64);

struct State<T> {
    cells: CellStore<T>,
    /// Chain evaluating each `Computing` cell.
    owners: HashMap<usize, ChainId>,
    /// Index each blocked chain is waiting on.
    waiting: HashMap<ChainId, usize>,
}

impl<T> State<T> {
    /// Indices leading from `index` back to a cell owned by `chain`, if
    /// waiting on `index` would close a loop of blocked chains.
    ///
    /// The returned path starts at `index` and ends at the cell `chain` owns.
    fn wait_cycle(&self, chain: ChainId, index: usize) -> Option<Vec<usize>> {
        let mut path = vec![index];
        let mut owner = *self.owners.get(&index)?;
        // Every hop visits a distinct blocked chain.
        for _ in 0..=self.waiting.len() {
            let next = *self.waiting.get(&owner)?;
            path.push(next);
            owner = *self.owners.get(&next)?;
            if owner == chain {
                return Some(path);
            }
        }
        None
    }
}

/// A lazy sequence that can be read from several threads at once.
///
/// Each index is still computed at most once: a reader that finds the index
/// being computed by another thread waits for the value instead of computing
/// it again.
///
/// # Example
///
/// ```
/// use lazyseq_core::SharedSequence;
/// use std::sync::Arc;
/// use std::thread;
///
/// let fib = Arc::new(SharedSequence::new([0u64, 1], |i, seq| {
///     Ok(seq.get(i - 1)? + seq.get(i - 2)?)
/// }));
///
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let fib = Arc::clone(&fib);
///         thread::spawn(move || fib.get(50).unwrap())
///     })
///     .collect();
/// for handle in handles {
///     assert_eq!(handle.join().unwrap(), 12_586_269_025);
/// }
/// ```
pub struct SharedSequence<T> {
    state: Mutex<State<T>>,
    resolved: Condvar,
    rule: Box<dyn Rule<T> + Send + Sync>,
    options: SequenceOptions,
    id: SequenceId,
    next_chain: AtomicU64,
}

static_assertions::assert_impl_all!(SharedSequence<u64>: Send, Sync);

impl<T: Clone> SharedSequence<T> {
    /// Create an unbounded sequence from seeds and a closure.
    pub fn new(
        seeds: impl IntoIterator<Item = T>,
        rule: impl Fn(usize, &dyn Lookup<T>) -> Result<T, RuleError> + Send + Sync + 'static,
    ) -> Self {
        Self::with_rule(seeds, rule)
    }

    pub fn with_rule(
        seeds: impl IntoIterator<Item = T>,
        rule: impl Rule<T> + Send + Sync + 'static,
    ) -> Self {
        Self::from_parts(
            SequenceOptions::default(),
            CellStore::seeded(seeds),
            Box::new(rule),
        )
    }

    /// Create a sequence whose valid indices are `0..=max_index`.
    pub fn bounded(
        seeds: impl IntoIterator<Item = T>,
        max_index: usize,
        rule: impl Fn(usize, &dyn Lookup<T>) -> Result<T, RuleError> + Send + Sync + 'static,
    ) -> Result<Self, Error> {
        Self::with_options(SequenceOptions::new().with_bound(max_index), seeds, rule)
    }

    pub fn with_options(
        options: SequenceOptions,
        seeds: impl IntoIterator<Item = T>,
        rule: impl Rule<T> + Send + Sync + 'static,
    ) -> Result<Self, Error> {
        let cells = CellStore::seeded(seeds);
        options.validate(cells.seed_count())?;
        Ok(Self::from_parts(options, cells, Box::new(rule)))
    }

    fn from_parts(
        options: SequenceOptions,
        cells: CellStore<T>,
        rule: Box<dyn Rule<T> + Send + Sync>,
    ) -> Self {
        Self {
            state: Mutex::new(State {
                cells,
                owners: HashMap::new(),
                waiting: HashMap::new(),
            }),
            resolved: Condvar::new(),
            rule,
            options,
            id: SequenceId::fresh(),
            next_chain: AtomicU64::new(0),
        }
    }

    /// Returns the value at `index`, computing and caching it if needed.
    ///
    /// Blocks while another thread is computing `index` or one of its
    /// dependencies. Errors are the same as for
    /// [`LazySequence::get`](crate::LazySequence::get).
    pub fn get<I: SequenceIndex>(&self, index: I) -> Result<T, Error> {
        let position = self.options.position(index)?;
        self.resolver().resolve(position)
    }

    /// Computes every index up to and including `max_index` in ascending
    /// order, stopping at the first error.
    pub fn force_through<I: SequenceIndex>(&self, max_index: I) -> Result<(), Error> {
        let last = self.options.position(max_index)?;
        let resolver = self.resolver();
        for position in self.seed_count()..=last {
            resolver.resolve(position)?;
        }
        Ok(())
    }

    /// Snapshot of every computed cell, seeds included, keyed by index.
    pub fn snapshot(&self) -> BTreeMap<usize, T> {
        self.lock()
            .cells
            .computed()
            .map(|(index, value)| (index, value.clone()))
            .collect()
    }

    fn resolver(&self) -> Resolver<'_, T> {
        Resolver {
            seq: self,
            id: ChainId(self.next_chain.fetch_add(1, Ordering::Relaxed)),
            chain: RefCell::new(EvaluationChain::new()),
        }
    }
}

impl<T> SharedSequence<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // Rules never run under the lock, so a poisoned lock still holds
        // consistent cells.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed_count(&self) -> usize {
        self.lock().cells.seed_count()
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

    pub fn status(&self, index: usize) -> CellStatus {
        self.lock().cells.state(index).status()
    }

    pub fn is_computed(&self, index: usize) -> bool {
        self.status(index) == CellStatus::Computed
    }

    pub fn computed_count(&self) -> usize {
        self.lock().cells.computed_count()
    }
}

impl<T> fmt::Debug for SharedSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSequence")
            .field("seed_count", &self.seed_count())
            .field("computed", &self.computed_count())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// One evaluation chain of a [`SharedSequence`].
///
/// Rules of a shared sequence receive the resolver of the read that
/// triggered them, so nested reads are attributed to the same chain.
pub(crate) struct Resolver<'s, T> {
    seq: &'s SharedSequence<T>,
    id: ChainId,
    chain: RefCell<EvaluationChain>,
}

impl<'s, T: Clone> Resolver<'s, T> {
    /// Reads the value at `index` as part of this chain.
    fn get<I: SequenceIndex>(&self, index: I) -> Result<T, Error> {
        let position = self.seq.options.position(index)?;
        self.resolve(position)
    }

    fn resolve(&self, index: usize) -> Result<T, Error> {
        let seq = self.seq;
        let mut state = seq.lock();
        loop {
            let computing = match state.cells.state(index) {
                CellState::Computed(value) => {
                    tracing::trace!(index, "cache hit");
                    return Ok(value.clone());
                }
                CellState::Computing => true,
                CellState::Empty => false,
            };
            if !computing {
                break;
            }

            if state.owners.get(&index) == Some(&self.id) {
                let chain = self.chain.borrow().cycle_through(index, &[]);
                tracing::debug!(index, ?chain, "cycle detected");
                return Err(Error::Cycle { index, chain });
            }
            if let Some(path) = state.wait_cycle(self.id, index) {
                let start = *path.last().unwrap_or(&index);
                let chain = self.chain.borrow().cycle_through(start, &path);
                tracing::debug!(index, ?chain, "cycle across threads detected");
                return Err(Error::Cycle {
                    index: start,
                    chain,
                });
            }

            state.waiting.insert(self.id, index);
            tracing::trace!(index, "waiting for another thread");
            state = seq
                .resolved
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            state.waiting.remove(&self.id);
        }

        let depth = {
            let mut chain = self.chain.borrow_mut();
            chain.enter(index, seq.options.max_depth)?;
            chain.depth()
        };
        tracing::trace!(index, depth, "evaluating");
        state.cells.begin(index);
        state.owners.insert(index, self.id);
        drop(state);

        let claim = Claim {
            resolver: self,
            index,
        };
        let result = seq.rule.generate(index, self);
        claim.finish(result)
    }
}

impl<T: Clone> Lookup<T> for Resolver<'_, T> {
    fn lookup(&self, position: usize) -> Result<T, Error> {
        self.get(position)
    }

    fn bound(&self) -> Option<usize> {
        self.seq.options.bound
    }

    fn origin(&self) -> SequenceId {
        self.seq.id
    }
}

/// A cell claimed by a resolver.
///
/// Dropping it without a stored value puts the cell back to `Empty` and
/// wakes any thread waiting on it, so one of them can take over.
struct Claim<'r, 's, T> {
    resolver: &'r Resolver<'s, T>,
    index: usize,
}

impl<T: Clone> Claim<'_, '_, T> {
    fn finish(self, result: Result<T, RuleError>) -> Result<T, Error> {
        match result {
            Ok(value) => {
                let mut state = self.resolver.seq.lock();
                state.cells.complete(self.index, value.clone());
                state.owners.remove(&self.index);
                drop(state);
                self.resolver.seq.resolved.notify_all();
                tracing::debug!(index = self.index, "computed");
                Ok(value)
            }
            Err(error) => {
                let error = Error::from_rule(self.resolver.seq.id, self.index, error);
                tracing::debug!(index = self.index, %error, "evaluation failed");
                Err(error)
            }
        }
    }
}

impl<T> Drop for Claim<'_, '_, T> {
    fn drop(&mut self) {
        let seq = self.resolver.seq;
        let mut state = seq.lock();
        if matches!(state.cells.state(self.index), CellState::Computing) {
            state.cells.reset(self.index);
            state.owners.remove(&self.index);
            drop(state);
            seq.resolved.notify_all();
        } else {
            drop(state);
        }
        if let Ok(mut chain) = self.resolver.chain.try_borrow_mut() {
            chain.leave(self.index);
        }
    }
}

#[cfg(test)]
#[path = "shared_test.rs"]
mod shared_test;
