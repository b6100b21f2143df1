/// Static maze for the chase game.
///
/// A 20x15 hand-drawn base pattern is tiled 3 wide by 2 tall, then doorway
/// seams are carved between the tiles so every copy is reachable. The wall
/// layout never changes during play; pellets live in a separate set owned
/// by the game session.

use std::collections::HashSet;

use rand::Rng;

use super::grid::{Cell, DIRS};

const BASE: [&str; 15] = [
    "####################",
    "#........##........#",
    "#.####...##...####.#",
    "#.#  #........#  #.#",
    "#.####.######.####.#",
    "#..................#",
    "#.####.##..##.####.#",
    "#......##..##......#",
    "######.##..##.######",
    "#........##........#",
    "#.####...##...####.#",
    "#...##........##...#",
    "###.##.######.##.###",
    "#........##........#",
    "####################",
];

const TILE_X: usize = 3;
const TILE_Y: usize = 2;

// Row / column offsets within a tile where seam doorways are carved.
const VERTICAL_DOORS: [usize; 2] = [5, 9];
const HORIZONTAL_DOORS: [usize; 2] = [6, 13];

pub struct Maze {
    grid: Vec<Vec<char>>,
    width: i32,
    height: i32,
}

impl Maze {
    /// The full cabinet maze: BASE tiled 3x2 with carved seams.
    pub fn cabinet() -> Self {
        let bh = BASE.len();
        let bw = BASE[0].len();

        let mut grid: Vec<Vec<char>> = Vec::with_capacity(bh * TILE_Y);
        for _ty in 0..TILE_Y {
            for row in BASE.iter() {
                let mut cells: Vec<char> = Vec::with_capacity(bw * TILE_X);
                for _tx in 0..TILE_X {
                    cells.extend(row.chars());
                }
                grid.push(cells);
            }
        }

        // Vertical seams: carve door pairs through the shared wall columns.
        for tx in 1..TILE_X {
            let seam_left = tx * bw - 1;
            let seam_right = tx * bw;
            for ty in 0..TILE_Y {
                for off in VERTICAL_DOORS {
                    let y = ty * bh + off;
                    grid[y][seam_left] = '.';
                    grid[y][seam_right] = '.';
                }
            }
        }

        // Horizontal seams.
        for ty in 1..TILE_Y {
            let seam_up = ty * bh - 1;
            let seam_down = ty * bh;
            for tx in 0..TILE_X {
                for off in HORIZONTAL_DOORS {
                    let x = tx * bw + off;
                    grid[seam_up][x] = '.';
                    grid[seam_down][x] = '.';
                }
            }
        }

        Self::from_grid(grid)
    }

    /// Build a maze from raw rows ('#' wall, '.' pellet, ' ' open).
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Self {
        Self::from_grid(rows.iter().map(|r| r.chars().collect()).collect())
    }

    fn from_grid(grid: Vec<Vec<char>>) -> Self {
        let height = grid.len() as i32;
        let width = grid.first().map_or(0, |r| r.len()) as i32;
        Maze { grid, width, height }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Out-of-bounds counts as wall.
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) {
            return true;
        }
        self.grid[y as usize][x as usize] == '#'
    }

    pub fn open_dirs(&self, x: i32, y: i32) -> Vec<(i32, i32)> {
        DIRS.iter()
            .copied()
            .filter(|&(dx, dy)| !self.is_wall(x + dx, y + dy))
            .collect()
    }

    /// The pellet layout as carved into the maze pattern.
    pub fn pellet_cells(&self) -> HashSet<Cell> {
        let mut set = HashSet::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.grid[y as usize][x as usize] == '.' {
                    set.insert((x, y));
                }
            }
        }
        set
    }

    /// Random interior open cell not in `exclude`. Random probing first,
    /// deterministic interior scan if probing keeps missing.
    pub fn random_open_cell(&self, exclude: &HashSet<Cell>, rng: &mut impl Rng) -> Cell {
        for _ in 0..2000 {
            let p = (
                rng.random_range(1..self.width - 1),
                rng.random_range(1..self.height - 1),
            );
            if !self.is_wall(p.0, p.1) && !exclude.contains(&p) {
                return p;
            }
        }
        for y in 1..self.height - 1 {
            for x in 1..self.width - 1 {
                if !self.is_wall(x, y) && !exclude.contains(&(x, y)) {
                    return (x, y);
                }
            }
        }
        (1, 1)
    }

    /// Open cell at or near a preferred position. Widens the probe radius
    /// until something opens up, then scans the whole interior.
    pub fn spawn_open_near(&self, prefer: Cell, rng: &mut impl Rng) -> Cell {
        if !self.is_wall(prefer.0, prefer.1) {
            return prefer;
        }
        for rad in 1..30 {
            for _ in 0..80 {
                let x = (prefer.0 + rng.random_range(-rad..=rad)).clamp(1, self.width - 2);
                let y = (prefer.1 + rng.random_range(-rad..=rad)).clamp(1, self.height - 2);
                if !self.is_wall(x, y) {
                    return (x, y);
                }
            }
        }
        for y in 1..self.height - 1 {
            for x in 1..self.width - 1 {
                if !self.is_wall(x, y) {
                    return (x, y);
                }
            }
        }
        (1, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cabinet_maze_has_tiled_dimensions() {
        let m = Maze::cabinet();
        assert_eq!(m.width(), 60);
        assert_eq!(m.height(), 30);
    }

    #[test]
    fn outer_border_is_wall_except_carved_doors() {
        let m = Maze::cabinet();
        // Corners always wall.
        assert!(m.is_wall(0, 0));
        assert!(m.is_wall(59, 29));
        // Out of bounds treated as wall.
        assert!(m.is_wall(-1, 5));
        assert!(m.is_wall(60, 5));
    }

    #[test]
    fn seams_are_carved_open() {
        let m = Maze::cabinet();
        // Vertical seam between tile 0 and 1 at row offsets 5 and 9.
        assert!(!m.is_wall(19, 5));
        assert!(!m.is_wall(20, 5));
        assert!(!m.is_wall(19, 9));
        // Horizontal seam between tile rows at column offsets 6 and 13.
        assert!(!m.is_wall(6, 14));
        assert!(!m.is_wall(6, 15));
        assert!(!m.is_wall(13, 14));
    }

    #[test]
    fn pellets_only_on_open_cells() {
        let m = Maze::cabinet();
        let pellets = m.pellet_cells();
        assert!(!pellets.is_empty());
        for &(x, y) in &pellets {
            assert!(!m.is_wall(x, y));
        }
    }

    #[test]
    fn random_open_cell_respects_exclusions() {
        let m = Maze::cabinet();
        let mut rng = rand::rng();
        let mut exclude = HashSet::new();
        exclude.insert((1, 1));
        for _ in 0..50 {
            let p = m.random_open_cell(&exclude, &mut rng);
            assert!(!m.is_wall(p.0, p.1));
            assert_ne!(p, (1, 1));
        }
    }

    #[test]
    fn spawn_near_walks_off_walls() {
        let m = Maze::cabinet();
        let mut rng = rand::rng();
        let p = m.spawn_open_near((0, 0), &mut rng);
        assert!(!m.is_wall(p.0, p.1));
    }
}
