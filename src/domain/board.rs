/// Puzzle board: occupancy grid, placement check, piece lock, and
/// line-clear compaction.

use super::piece::PieceKind;

pub const SCORE_PER_LINE: [u32; 4] = [10, 25, 50, 100];

/// Score awarded for clearing `n` lines simultaneously.
pub fn score_for_clear(n: usize) -> u32 {
    if n == 0 {
        0
    } else {
        SCORE_PER_LINE[n.min(4) - 1]
    }
}

pub struct Board {
    cells: Vec<Option<PieceKind>>,
    cols: i32,
    rows: i32,
}

impl Board {
    pub fn new(cols: i32, rows: i32) -> Self {
        Board {
            cells: vec![None; (cols * rows) as usize],
            cols,
            rows,
        }
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<PieceKind> {
        if x < 0 || x >= self.cols || y < 0 || y >= self.rows {
            return None;
        }
        self.cells[(y * self.cols + x) as usize]
    }

    #[cfg(test)]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Pure placement check: true when every block lands on an empty
    /// in-bounds cell. Reads board state, never mutates it.
    pub fn can_place(&self, kind: PieceKind, rot: usize, x: i32, y: i32) -> bool {
        for (bx, by) in kind.blocks(rot) {
            let gx = x + bx;
            let gy = y + by;
            if gx < 0 || gx >= self.cols || gy < 0 || gy >= self.rows {
                return false;
            }
            if self.cells[(gy * self.cols + gx) as usize].is_some() {
                return false;
            }
        }
        true
    }

    /// Stamp the piece's blocks into the grid. Out-of-bounds blocks are
    /// dropped silently (the caller validated placement already).
    pub fn lock(&mut self, kind: PieceKind, rot: usize, x: i32, y: i32) {
        for (bx, by) in kind.blocks(rot) {
            let gx = x + bx;
            let gy = y + by;
            if gx >= 0 && gx < self.cols && gy >= 0 && gy < self.rows {
                self.cells[(gy * self.cols + gx) as usize] = Some(kind);
            }
        }
    }

    /// Remove full rows, shift survivors down preserving their order, and
    /// top up with empty rows. Returns the cleared count and the pre-shift
    /// row indices (top first) for effects.
    pub fn clear_lines(&mut self) -> (usize, Vec<i32>) {
        let mut cleared_rows = Vec::new();
        let mut kept: Vec<Vec<Option<PieceKind>>> = Vec::with_capacity(self.rows as usize);

        for y in 0..self.rows {
            let row: Vec<Option<PieceKind>> =
                (0..self.cols).map(|x| self.cell(x, y)).collect();
            if row.iter().all(|c| c.is_some()) {
                cleared_rows.push(y);
            } else {
                kept.push(row);
            }
        }

        let cleared = cleared_rows.len();
        if cleared > 0 {
            let mut rebuilt: Vec<Vec<Option<PieceKind>>> =
                vec![vec![None; self.cols as usize]; cleared];
            rebuilt.append(&mut kept);
            self.cells = rebuilt.into_iter().flatten().collect();
        }

        (cleared, cleared_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(b: &mut Board, y: i32) {
        for x in 0..b.cols() {
            b.lock(PieceKind::O, 0, x - 1, y - 1); // O occupies (1,1)..(2,2)
        }
    }

    fn set_cell(b: &mut Board, x: i32, y: i32) {
        b.cells[(y * b.cols + x) as usize] = Some(PieceKind::I);
    }

    #[test]
    fn can_place_is_pure() {
        let b = Board::new(10, 20);
        let before = b.occupied_count();
        for _ in 0..3 {
            assert!(b.can_place(PieceKind::T, 0, 3, 0));
        }
        assert_eq!(b.occupied_count(), before);
    }

    #[test]
    fn can_place_rejects_out_of_bounds_and_overlap() {
        let mut b = Board::new(10, 20);
        assert!(!b.can_place(PieceKind::I, 0, -1, 0));
        assert!(!b.can_place(PieceKind::I, 0, 7, 0)); // right edge
        assert!(!b.can_place(PieceKind::I, 1, 0, 17)); // vertical I past bottom
        b.lock(PieceKind::O, 0, 3, 0);
        assert!(!b.can_place(PieceKind::O, 0, 3, 0));
    }

    #[test]
    fn single_line_clear_scenario() {
        // Fill the bottom row except one cell, then complete it.
        let mut b = Board::new(10, 20);
        for x in 0..9 {
            set_cell(&mut b, x, 19);
        }
        set_cell(&mut b, 5, 18); // stray block above the line
        let before = b.occupied_count();
        assert_eq!(before, 10);

        set_cell(&mut b, 9, 19);
        let (cleared, rows) = b.clear_lines();
        assert_eq!(cleared, 1);
        assert_eq!(rows, vec![19]);
        assert_eq!(score_for_clear(cleared), 10);

        // 10 cells removed with the row; the stray block dropped one row.
        assert_eq!(b.occupied_count(), 1);
        assert_eq!(b.cell(5, 19), Some(PieceKind::I));
        assert_eq!(b.cell(5, 18), None);
    }

    #[test]
    fn row_count_invariant_after_clear() {
        let mut b = Board::new(10, 20);
        fill_row(&mut b, 19);
        fill_row(&mut b, 18);
        let (cleared, _) = b.clear_lines();
        assert_eq!(cleared, 2);
        assert_eq!(b.cells.len(), 200);
        assert_eq!(b.occupied_count(), 0);
    }

    #[test]
    fn compaction_preserves_survivor_order() {
        let mut b = Board::new(4, 6);
        // Row 3: full (clears). Rows 2 and 4: distinct partial patterns.
        set_cell(&mut b, 0, 2);
        for x in 0..4 {
            set_cell(&mut b, x, 3);
        }
        set_cell(&mut b, 3, 4);

        let (cleared, rows) = b.clear_lines();
        assert_eq!(cleared, 1);
        assert_eq!(rows, vec![3]);
        // Row 2 shifted into row 3; row 4 untouched below the cleared line.
        assert_eq!(b.cell(0, 3), Some(PieceKind::I));
        assert_eq!(b.cell(3, 4), Some(PieceKind::I));
        assert_eq!(b.cell(0, 2), None);
    }

    #[test]
    fn simultaneous_clear_scores() {
        assert_eq!(score_for_clear(0), 0);
        assert_eq!(score_for_clear(1), 10);
        assert_eq!(score_for_clear(2), 25);
        assert_eq!(score_for_clear(3), 50);
        assert_eq!(score_for_clear(4), 100);
    }
}
