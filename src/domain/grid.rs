/// Grid primitives shared by the cell-based games: directions, bounds,
/// and free-cell spawn placement with graceful degradation.

use std::collections::HashSet;

use rand::Rng;

pub type Cell = (i32, i32);

pub const DIRS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

pub fn in_bounds(x: i32, y: i32, cols: i32, rows: i32) -> bool {
    x >= 0 && x < cols && y >= 0 && y < rows
}

/// Spawn bounds inset by `margin` cells from every edge.
/// Boards too small for the margin fall back to the whole board.
fn spawn_bounds(cols: i32, rows: i32, margin: i32) -> (i32, i32, i32, i32) {
    if cols <= margin * 2 + 1 || rows <= margin * 2 + 1 {
        (0, cols - 1, 0, rows - 1)
    } else {
        (margin, cols - 1 - margin, margin, rows - 1 - margin)
    }
}

const SPAWN_ATTEMPTS: usize = 4000;

/// Pick a free cell for a spawn. Degrades in stages:
///   1. random samples inside the safety margin,
///   2. deterministic scan inside the margin,
///   3. random samples over the whole board,
///   4. scan over the whole board,
/// and finally `None` if every cell is occupied (caller skips the spawn).
pub fn spawn_free_cell(
    cols: i32,
    rows: i32,
    margin: i32,
    occupied: &HashSet<Cell>,
    rng: &mut impl Rng,
) -> Option<Cell> {
    if cols <= 0 || rows <= 0 {
        return None;
    }
    let (min_x, max_x, min_y, max_y) = spawn_bounds(cols, rows, margin);

    for _ in 0..SPAWN_ATTEMPTS {
        let p = (rng.random_range(min_x..=max_x), rng.random_range(min_y..=max_y));
        if !occupied.contains(&p) {
            return Some(p);
        }
    }

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if !occupied.contains(&(x, y)) {
                return Some((x, y));
            }
        }
    }

    // Safety area is full; anywhere on the board beats not spawning at all.
    for _ in 0..SPAWN_ATTEMPTS {
        let p = (rng.random_range(0..cols), rng.random_range(0..rows));
        if !occupied.contains(&p) {
            return Some(p);
        }
    }

    for y in 0..rows {
        for x in 0..cols {
            if !occupied.contains(&(x, y)) {
                return Some((x, y));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_avoids_occupied_cells() {
        let mut rng = rand::rng();
        let mut occ = HashSet::new();
        occ.insert((5, 5));
        for _ in 0..50 {
            let p = spawn_free_cell(20, 15, 3, &occ, &mut rng).unwrap();
            assert_ne!(p, (5, 5));
            assert!(in_bounds(p.0, p.1, 20, 15));
        }
    }

    #[test]
    fn spawn_respects_margin_when_room_allows() {
        let mut rng = rand::rng();
        let occ = HashSet::new();
        for _ in 0..200 {
            let (x, y) = spawn_free_cell(20, 15, 3, &occ, &mut rng).unwrap();
            assert!(x >= 3 && x <= 16, "x={x} outside margin");
            assert!(y >= 3 && y <= 11, "y={y} outside margin");
        }
    }

    #[test]
    fn spawn_falls_outside_margin_when_interior_full() {
        // Fill everything inside the margin; placement must still succeed
        // somewhere on the board edge.
        let mut rng = rand::rng();
        let mut occ = HashSet::new();
        for y in 3..=11 {
            for x in 3..=16 {
                occ.insert((x, y));
            }
        }
        let (x, y) = spawn_free_cell(20, 15, 3, &occ, &mut rng).unwrap();
        assert!(!occ.contains(&(x, y)));
        assert!(x < 3 || x > 16 || y < 3 || y > 11);
    }

    #[test]
    fn spawn_returns_none_on_full_board() {
        let mut rng = rand::rng();
        let mut occ = HashSet::new();
        for y in 0..4 {
            for x in 0..4 {
                occ.insert((x, y));
            }
        }
        assert_eq!(spawn_free_cell(4, 4, 1, &occ, &mut rng), None);
    }

    #[test]
    fn tiny_board_ignores_margin() {
        let mut rng = rand::rng();
        let occ = HashSet::new();
        // 5x5 with margin 3 cannot be inset; whole board is the spawn area.
        let p = spawn_free_cell(5, 5, 3, &occ, &mut rng);
        assert!(p.is_some());
    }

    #[test]
    fn opposite_roundtrip() {
        for d in [Dir::Up, Dir::Down, Dir::Left, Dir::Right] {
            assert_eq!(d.opposite().opposite(), d);
        }
    }
}
