// SelectionSpan module
// The user's pending new-item time-span selection

use crate::models::cell::Cell;

/// A pending time-span selection drawn on empty grid background.
///
/// The anchor stays fixed at the pointer-down cell; the trailing end follows
/// the pointer. Observers only ever see the direction-normalized pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSpan {
    anchor: Cell,
    trailing: Cell,
    pub all_day: bool,
}

impl SelectionSpan {
    pub fn new(cell: Cell, all_day: bool) -> Self {
        Self {
            anchor: cell,
            trailing: cell,
            all_day,
        }
    }

    /// Move the trailing end to the cell currently under the pointer.
    pub fn drag_to(&mut self, cell: Cell) {
        self.trailing = cell;
    }

    /// Normalized start cell (start <= end in column-major order).
    pub fn start(&self) -> Cell {
        self.anchor.min(self.trailing)
    }

    /// Normalized end cell.
    pub fn end(&self) -> Cell {
        self.anchor.max(self.trailing)
    }

    pub fn is_single_cell(&self) -> bool {
        self.anchor == self.trailing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_normalizes_backward_drag() {
        let mut span = SelectionSpan::new(Cell::new(3, 20), false);
        span.drag_to(Cell::new(1, 40));
        assert_eq!(span.start(), Cell::new(1, 40));
        assert_eq!(span.end(), Cell::new(3, 20));
    }

    #[test]
    fn test_selection_anchor_stays_fixed() {
        let mut span = SelectionSpan::new(Cell::new(2, 10), false);
        span.drag_to(Cell::new(2, 30));
        span.drag_to(Cell::new(2, 5));
        assert_eq!(span.start(), Cell::new(2, 5));
        assert_eq!(span.end(), Cell::new(2, 10));
    }

    #[test]
    fn test_single_cell_selection() {
        let span = SelectionSpan::new(Cell::new(0, 0), true);
        assert!(span.is_single_cell());
        assert_eq!(span.start(), span.end());
    }
}
