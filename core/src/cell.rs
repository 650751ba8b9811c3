//! The cell store: per-index evaluation state.

use alloc::collections::BTreeMap;

/// Evaluation state of a single index.
///
/// Cells move `Empty -> Computing -> Computed` exactly once. A failed
/// evaluation moves `Computing` back to `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState<T> {
    Empty,
    /// Held only while the rule for this index is running.
    Computing,
    Computed(T),
}

/// Value-less view of a [`CellState`], returned by inspection methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellStatus {
    Empty,
    Computing,
    Computed,
}

impl<T> CellState<T> {
    pub fn status(&self) -> CellStatus {
        match self {
            CellState::Empty => CellStatus::Empty,
            CellState::Computing => CellStatus::Computing,
            CellState::Computed(_) => CellStatus::Computed,
        }
    }
}

/// Ordered mapping from index to [`CellState`].
///
/// Absent keys are `Empty`, so a sparse sequence (one where only a few high
/// indices are ever read) costs memory proportional to what was touched.
#[derive(Debug)]
pub(crate) struct CellStore<T> {
    cells: BTreeMap<usize, CellState<T>>,
    seed_count: usize,
}

impl<T> CellStore<T> {
    /// Creates a store whose first cells are already `Computed` with `seeds`.
    pub fn seeded(seeds: impl IntoIterator<Item = T>) -> Self {
        let cells: BTreeMap<_, _> = seeds
            .into_iter()
            .enumerate()
            .map(|(index, value)| (index, CellState::Computed(value)))
            .collect();
        let seed_count = cells.len();
        Self { cells, seed_count }
    }

    pub fn seed_count(&self) -> usize {
        self.seed_count
    }

    pub fn state(&self, index: usize) -> CellState<&T> {
        match self.cells.get(&index) {
            None | Some(CellState::Empty) => CellState::Empty,
            Some(CellState::Computing) => CellState::Computing,
            Some(CellState::Computed(value)) => CellState::Computed(value),
        }
    }

    /// Marks an empty cell as being computed.
    pub fn begin(&mut self, index: usize) {
        let previous = self.cells.insert(index, CellState::Computing);
        debug_assert!(
            matches!(previous, None | Some(CellState::Empty)),
            "cell {index} was not empty"
        );
    }

    pub fn complete(&mut self, index: usize, value: T) {
        let previous = self.cells.insert(index, CellState::Computed(value));
        debug_assert!(
            matches!(previous, Some(CellState::Computing)),
            "cell {index} was not being computed"
        );
    }

    /// Returns a computing cell to `Empty`. Computed cells are left alone.
    pub fn reset(&mut self, index: usize) {
        if matches!(self.cells.get(&index), Some(CellState::Computing)) {
            self.cells.remove(&index);
        }
    }

    /// Computed cells in ascending index order.
    pub fn computed(&self) -> impl Iterator<Item = (usize, &T)> {
        self.cells.iter().filter_map(|(index, cell)| match cell {
            CellState::Computed(value) => Some((*index, value)),
            _ => None,
        })
    }

    pub fn computed_count(&self) -> usize {
        self.computed().count()
    }
}
