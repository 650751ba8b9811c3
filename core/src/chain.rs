//! The stack of indices currently being evaluated by one logical read.

use smallvec::SmallVec;

use crate::error::Error;

/// Indices whose rules are running, outermost first.
///
/// Each entry is an ancestor of the next one: the rule for `frames[n]` is
/// the one that asked for `frames[n + 1]`.
#[derive(Debug, Default)]
pub(crate) struct EvaluationChain {
    frames: SmallVec<[usize; 16]>,
}

impl EvaluationChain {
    pub const fn new() -> Self {
        Self {
            frames: SmallVec::new_const(),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Starts evaluating `index`, refusing if that would exceed `max_depth`.
    pub fn enter(&mut self, index: usize, max_depth: usize) -> Result<(), Error> {
        if self.frames.len() >= max_depth {
            return Err(Error::DepthExceeded { index, max_depth });
        }
        self.frames.push(index);
        Ok(())
    }

    pub fn leave(&mut self, index: usize) {
        let popped = self.frames.pop();
        debug_assert_eq!(popped, Some(index), "evaluation chain out of order");
    }

    /// Path from the frame evaluating `index` to a new request for `index`.
    ///
    /// Returns `[index, ..., index]`, or just the frames from `index` onward
    /// followed by `tail` when the cycle continues through other chains.
    pub fn cycle_through(&self, index: usize, tail: &[usize]) -> Vec<usize> {
        let start = self
            .frames
            .iter()
            .position(|&frame| frame == index)
            .unwrap_or(self.frames.len());
        let mut chain = Vec::with_capacity(self.frames.len() - start + tail.len() + 1);
        chain.extend_from_slice(&self.frames[start..]);
        if tail.is_empty() {
            chain.push(index);
        } else {
            chain.extend_from_slice(tail);
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_enter_and_leave() {
        let mut chain = EvaluationChain::new();
        chain.enter(4, 10).unwrap();
        chain.enter(3, 10).unwrap();
        assert_eq!(chain.depth(), 2);
        chain.leave(3);
        chain.leave(4);
        assert_eq!(chain.depth(), 0);
    }

    #[test]
    fn test_depth_limit() {
        let mut chain = EvaluationChain::new();
        chain.enter(9, 2).unwrap();
        chain.enter(8, 2).unwrap();
        match chain.enter(7, 2) {
            Err(Error::DepthExceeded { index, max_depth }) => {
                assert_eq!(index, 7);
                assert_eq!(max_depth, 2);
            }
            other => panic!("expected depth error, got {other:?}"),
        }
        assert_eq!(chain.depth(), 2);
    }

    #[test]
    fn test_cycle_path() {
        let mut chain = EvaluationChain::new();
        for index in [9, 5, 6, 7] {
            chain.enter(index, 100).unwrap();
        }
        assert_eq!(chain.cycle_through(5, &[]), vec![5, 6, 7, 5]);
        assert_eq!(chain.cycle_through(7, &[]), vec![7, 7]);
    }

    #[test]
    fn test_cycle_path_through_other_chains() {
        let mut chain = EvaluationChain::new();
        chain.enter(2, 100).unwrap();
        assert_eq!(chain.cycle_through(2, &[1, 2]), vec![2, 1, 2]);
    }
}
