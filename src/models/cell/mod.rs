// Grid cell and pixel geometry primitives
// Shared by the coordinate mapper, placement and interaction code

/// A discrete grid cell: column = visible day index, row = time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub column: usize,
    pub row: usize,
}

impl Cell {
    pub fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    /// Signed (column, row) delta from `other` to `self`.
    pub fn delta_from(&self, other: Cell) -> (i64, i64) {
        (
            self.column as i64 - other.column as i64,
            self.row as i64 - other.row as i64,
        )
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    /// Column-major ordering, used to direction-normalize selections.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.column, self.row).cmp(&(other.column, other.row))
    }
}

/// A continuous point in viewport pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned pixel rectangle (min corner + size).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, p: PixelPoint) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_delta() {
        let a = Cell::new(3, 10);
        let b = Cell::new(1, 14);
        assert_eq!(a.delta_from(b), (2, -4));
        assert_eq!(b.delta_from(a), (-2, 4));
    }

    #[test]
    fn test_cell_ordering_is_column_major() {
        assert!(Cell::new(1, 90) < Cell::new(2, 0));
        assert!(Cell::new(2, 5) < Cell::new(2, 6));
    }

    #[test]
    fn test_rect_contains_half_open() {
        let r = PixelRect::new(10.0, 20.0, 30.0, 40.0);
        assert!(r.contains(PixelPoint::new(10.0, 20.0)));
        assert!(!r.contains(PixelPoint::new(40.0, 20.0)));
        assert!(!r.contains(PixelPoint::new(10.0, 60.0)));
    }
}
