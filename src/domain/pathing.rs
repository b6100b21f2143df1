/// BFS pursuit over the maze grid.
///
/// Ghosts only consult this at intersections, and only when their chase
/// coin-flip lands; the rest of the time they wander. The function returns
/// the first step of a shortest path, or the start cell when the goal is
/// unreachable (callers treat that as "stand still").

use std::collections::{HashMap, VecDeque};

use super::grid::{Cell, DIRS};
use super::maze::Maze;

/// First cell of a shortest walkable path from `start` toward `goal`.
pub fn bfs_next_step(maze: &Maze, start: Cell, goal: Cell) -> Cell {
    if start == goal {
        return start;
    }

    let mut prev: HashMap<Cell, Cell> = HashMap::new();
    let mut queue: VecDeque<Cell> = VecDeque::new();
    prev.insert(start, start);
    queue.push_back(start);

    while let Some(cur) = queue.pop_front() {
        if cur == goal {
            break;
        }
        for &(dx, dy) in &DIRS {
            let nb = (cur.0 + dx, cur.1 + dy);
            if maze.is_wall(nb.0, nb.1) || prev.contains_key(&nb) {
                continue;
            }
            prev.insert(nb, cur);
            queue.push_back(nb);
        }
    }

    if !prev.contains_key(&goal) {
        return start;
    }

    // Walk predecessors back from the goal to the cell adjacent to start.
    let mut cur = goal;
    while prev[&cur] != start {
        cur = prev[&cur];
    }
    cur
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Maze {
        Maze::from_rows(&["......", "######"])
    }

    #[test]
    fn straight_corridor_first_step() {
        let m = corridor();
        assert_eq!(bfs_next_step(&m, (0, 0), (3, 0)), (1, 0));
    }

    #[test]
    fn goal_equals_start() {
        let m = corridor();
        assert_eq!(bfs_next_step(&m, (2, 0), (2, 0)), (2, 0));
    }

    #[test]
    fn unreachable_goal_returns_start() {
        let m = Maze::from_rows(&["..#..", "..#..", "..#.."]);
        assert_eq!(bfs_next_step(&m, (0, 1), (4, 1)), (0, 1));
    }

    #[test]
    fn next_step_is_adjacent_and_open() {
        let m = Maze::cabinet();
        let step = bfs_next_step(&m, (1, 1), (58, 28));
        let (dx, dy) = (step.0 - 1, step.1 - 1);
        assert_eq!(dx.abs() + dy.abs(), 1);
        assert!(!m.is_wall(step.0, step.1));
    }

    #[test]
    fn step_reduces_bfs_distance() {
        // Breadth-first distance from the step cell must be exactly one
        // less than from the start cell.
        let m = Maze::cabinet();
        let start = (1, 1);
        let goal = (31, 13);
        assert!(!m.is_wall(goal.0, goal.1), "goal must be an open cell");
        let step = bfs_next_step(&m, start, goal);
        assert_eq!(dist(&m, step, goal) + 1, dist(&m, start, goal));
    }

    fn dist(m: &Maze, from: Cell, to: Cell) -> usize {
        let mut seen: HashMap<Cell, usize> = HashMap::new();
        let mut q = VecDeque::new();
        seen.insert(from, 0);
        q.push_back(from);
        while let Some(cur) = q.pop_front() {
            let d = seen[&cur];
            if cur == to {
                return d;
            }
            for &(dx, dy) in &DIRS {
                let nb = (cur.0 + dx, cur.1 + dy);
                if !m.is_wall(nb.0, nb.1) && !seen.contains_key(&nb) {
                    seen.insert(nb, d + 1);
                    q.push_back(nb);
                }
            }
        }
        usize::MAX
    }
}
