//! Sequence configuration.

use crate::error::{ConfigError, Error};
use crate::index::SequenceIndex;

/// Default limit on nested evaluations for one read.
///
/// Cold reads of deeply chained rules recurse once per unresolved index;
/// this keeps them from overflowing the thread's stack.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Options fixed at construction time.
///
/// # Example
///
/// ```
/// use lazyseq_core::{Extent, SequenceOptions};
///
/// let options = SequenceOptions::default().with_bound(100).with_max_depth(64);
/// assert_eq!(options.extent(), Extent::Bounded { max_index: 100 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceOptions {
    /// Largest valid index, or `None` for an unbounded sequence.
    pub bound: Option<usize>,
    /// Maximum number of nested evaluations a single read may trigger.
    pub max_depth: usize,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceOptions {
    /// Unbounded, with [`DEFAULT_MAX_DEPTH`].
    pub const fn new() -> Self {
        Self {
            bound: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub const fn with_bound(mut self, max_index: usize) -> Self {
        self.bound = Some(max_index);
        self
    }

    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub const fn extent(&self) -> Extent {
        match self.bound {
            Some(max_index) => Extent::Bounded { max_index },
            None => Extent::Unbounded,
        }
    }

    /// Checks the options against the seeds they will be used with.
    pub(crate) fn validate(&self, seed_count: usize) -> Result<(), Error> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth.into());
        }
        if let Some(bound) = self.bound {
            if seed_count > 0 && bound < seed_count - 1 {
                return Err(ConfigError::BoundBelowSeeds { bound, seed_count }.into());
            }
        }
        Ok(())
    }

    /// Resolves a caller-supplied index to a position inside the domain.
    pub(crate) fn position<I: SequenceIndex>(&self, index: I) -> Result<usize, Error> {
        match index.to_position() {
            Some(position) if self.extent().contains(position) => Ok(position),
            _ => Err(Error::Domain {
                index: index.to_i128(),
                bound: self.bound,
            }),
        }
    }
}

/// The logical length of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extent {
    /// Indices `0..=max_index` are valid.
    Bounded { max_index: usize },
    /// Any non-negative index is valid.
    Unbounded,
}

impl Extent {
    pub const fn is_bounded(&self) -> bool {
        matches!(self, Extent::Bounded { .. })
    }

    pub const fn max_index(&self) -> Option<usize> {
        match self {
            Extent::Bounded { max_index } => Some(*max_index),
            Extent::Unbounded => None,
        }
    }

    /// Number of valid indices. `None` when unbounded, or when the bound is
    /// `usize::MAX` and the count does not fit.
    pub const fn len(&self) -> Option<usize> {
        match self {
            Extent::Bounded { max_index } => max_index.checked_add(1),
            Extent::Unbounded => None,
        }
    }

    pub const fn contains(&self, position: usize) -> bool {
        match self {
            Extent::Bounded { max_index } => position <= *max_index,
            Extent::Unbounded => true,
        }
    }
}
