//! Lazyseq - lazily evaluated, memoizing, self-referential sequences
//!
//! # Overview
//!
//! A lazy sequence is an indexed collection whose elements are defined in
//! terms of other elements of the same collection. You give it a few seed
//! values and a rule; each element is computed the first time it is read and
//! cached from then on. Common uses include:
//!
//! - Recurrences (Fibonacci, Hofstadter Q, partition numbers)
//! - Dynamic programming tables filled on demand
//! - Expensive derived values that are only sometimes needed
//!
//! # Quick Start
//!
//! ```
//! use lazyseq::LazySequence;
//!
//! let fib = LazySequence::new([0u64, 1], |i, seq| Ok(seq.get(i - 1)? + seq.get(i - 2)?));
//!
//! assert_eq!(fib.get(10).unwrap(), 55);
//! // Already cached: no rule calls.
//! assert_eq!(fib.get(7).unwrap(), 13);
//! ```
//!
//! # Errors
//!
//! Every read returns a `Result`. Reads fail for negative or out-of-bound
//! indices, rules that need their own value, rules that return an error, and
//! reads that would nest deeper than the configured limit. A failed read
//! never leaves a value cached, so it is always safe to retry.
//!
//! ```
//! use lazyseq::{ErrorKind, LazySequence};
//!
//! let seq = LazySequence::<u64>::new(Vec::new(), |i, seq| Ok(seq.get(i)?));
//! assert_eq!(seq.get(0).unwrap_err().kind(), ErrorKind::Cycle);
//! assert_eq!(seq.get(-1).unwrap_err().kind(), ErrorKind::Domain);
//! ```
//!
//! Errors implement [`miette::Diagnostic`]; [`render_error`] and
//! [`render_error_to`] print them with codes and help text.
//!
//! # Threads
//!
//! [`LazySequence`] is for a single thread. [`SharedSequence`] can be read
//! from many threads; each index is still computed once, and a reader that
//! finds an index in progress on another thread waits for it.
//!
//! ```
//! use lazyseq::SharedSequence;
//! use lazyseq::stdlib::Factorial;
//!
//! let fact = SharedSequence::with_rule(Factorial::SEEDS, Factorial);
//! std::thread::scope(|scope| {
//!     scope.spawn(|| assert_eq!(fact.get(10).unwrap(), 3_628_800));
//!     scope.spawn(|| assert_eq!(fact.get(12).unwrap(), 479_001_600));
//! });
//! ```

// Error rendering utilities
pub mod error_renderer;
pub use error_renderer::{CharSet, RenderConfig, render_error, render_error_to};

// Re-export public API from lazyseq_core
pub use lazyseq_core::{
    CellState, CellStatus, ConfigError, DEFAULT_MAX_DEPTH, Error, ErrorKind, Extent,
    LazySequence, Lookup, ReadError, Rule, RuleError, SequenceId, SequenceIndex, SequenceOptions,
    SharedSequence,
};

pub use lazyseq_core::stdlib;
