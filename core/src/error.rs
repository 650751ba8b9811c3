//! Public error types for lazy sequences.
//!
//! Every failure surfaced by [`LazySequence::get`](crate::LazySequence::get)
//! and [`SharedSequence::get`](crate::SharedSequence::get) is an [`Error`].
//! Errors raised inside a rule by a nested read of the same sequence travel
//! back out unchanged, so the caller always sees the index that actually
//! triggered the failure. Any other error a rule returns, including errors
//! from other sequences, is reported as [`Error::Generator`].

use core::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::rule::SequenceId;

/// Error type returned by rules.
///
/// Boxed so rules can use `?` on their own error types as well as on nested
/// `get` calls.
pub type RuleError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Public error type for all sequence operations.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The index is negative or beyond the configured bound.
    ///
    /// Raised before the cache is consulted, so it never mutates it.
    #[error("index {index} is outside the sequence domain{}", DisplayBound(.bound))]
    #[diagnostic(
        code(lazyseq::domain),
        help("valid indices are non-negative and no greater than the configured bound")
    )]
    Domain { index: i128, bound: Option<usize> },

    /// The value at `index` is needed to compute itself.
    ///
    /// `chain` lists the indices from the first evaluation of `index` up to
    /// the repeated request, e.g. `[5, 6, 5]`.
    #[error("index {index} depends on itself: {}", DisplayChain(.chain))]
    #[diagnostic(
        code(lazyseq::cycle),
        help("every chain of reads must eventually reach a seed or an index that does not depend on its caller")
    )]
    Cycle { index: usize, chain: Vec<usize> },

    /// The rule failed for a reason unrelated to cycles.
    #[error("rule failed at index {index}")]
    #[diagnostic(code(lazyseq::generator))]
    Generator {
        index: usize,
        #[source]
        source: RuleError,
    },

    /// Computing `index` needed more nested evaluations than allowed.
    #[error("evaluation of index {index} exceeds maximum depth of {max_depth}")]
    #[diagnostic(
        code(lazyseq::depth),
        help("warm the sequence with `force_through` or raise `max_depth`")
    )]
    DepthExceeded { index: usize, max_depth: usize },

    /// Invalid construction arguments.
    #[error("invalid sequence configuration: {0}")]
    #[diagnostic(code(lazyseq::configuration))]
    Configuration(#[from] ConfigError),
}

/// Reasons a sequence cannot be constructed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("bound {bound} is below the last seed index ({seed_count} seeds)")]
    BoundBelowSeeds { bound: usize, seed_count: usize },

    #[error("maximum evaluation depth must be at least 1")]
    ZeroDepth,
}

/// Coarse classification of an [`Error`].
///
/// Handy for presentation layers that map errors to exit codes or status
/// values without matching on the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Domain,
    Cycle,
    Generator,
    DepthExceeded,
    Configuration,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Domain { .. } => ErrorKind::Domain,
            Error::Cycle { .. } => ErrorKind::Cycle,
            Error::Generator { .. } => ErrorKind::Generator,
            Error::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            Error::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// The sequence index the error is attached to, if any.
    ///
    /// Domain errors return `None` when the requested index does not fit in
    /// `usize` (e.g. it is negative).
    pub fn index(&self) -> Option<usize> {
        match self {
            Error::Domain { index, .. } => usize::try_from(*index).ok(),
            Error::Cycle { index, .. }
            | Error::Generator { index, .. }
            | Error::DepthExceeded { index, .. } => Some(*index),
            Error::Configuration(_) => None,
        }
    }

    /// Maps an error returned by a rule of sequence `origin` evaluating
    /// `index`.
    ///
    /// Failures of the rule's own nested reads pass through unchanged.
    /// Anything else is the rule's failure and gets the index attached.
    pub(crate) fn from_rule(origin: SequenceId, index: usize, error: RuleError) -> Self {
        match error.downcast::<ReadError>() {
            Ok(read) if read.origin == origin => read.error,
            Ok(read) => Error::Generator {
                index,
                source: Box::new(read.error),
            },
            Err(source) => Error::Generator { index, source },
        }
    }
}

/// Failure of a read made from inside a rule.
///
/// Returned by `get` on the [`Lookup`](crate::Lookup) view a rule receives.
/// It remembers which sequence was read, so that propagating it with `?`
/// reports the underlying [`Error`] unchanged from that sequence and nowhere
/// else.
#[derive(Debug)]
pub struct ReadError {
    origin: SequenceId,
    error: Error,
}

impl ReadError {
    pub(crate) fn new(origin: SequenceId, error: Error) -> Self {
        Self { origin, error }
    }

    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn into_error(self) -> Error {
        self.error
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

struct DisplayBound<'a>(&'a Option<usize>);

impl fmt::Display for DisplayBound<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self.0 {
            Some(bound) => write!(f, " (maximum index is {})", bound),
            None => Ok(()),
        }
    }
}

struct DisplayChain<'a>(&'a [usize]);

impl fmt::Display for DisplayChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}
