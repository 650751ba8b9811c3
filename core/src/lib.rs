//! Lazily evaluated, memoizing, self-referential sequences.
//!
//! A sequence is defined by a few seed values and a rule that computes the
//! value at any later index from other indices of the same sequence. Values
//! are computed on first read and cached; rules may read any index, and
//! reading an index that is still being computed fails with a cycle error
//! instead of recursing forever.
//!
//! - [`LazySequence`] is the single-threaded sequence.
//! - [`SharedSequence`] can be read from several threads at once.
//! - [`stdlib`] has ready-made rules for well-known sequences.

// Used throughout instead of std:: paths where both work.
extern crate alloc;

mod cell;
mod chain;
pub mod error;
mod index;
pub mod options;
mod rule;
mod sequence;
mod shared;
pub mod stdlib;

pub use cell::{CellState, CellStatus};
pub use error::{ConfigError, Error, ErrorKind, ReadError, RuleError};
pub use index::SequenceIndex;
pub use options::{DEFAULT_MAX_DEPTH, Extent, SequenceOptions};
pub use rule::{Lookup, Rule, SequenceId};
pub use sequence::LazySequence;
pub use shared::SharedSequence;
