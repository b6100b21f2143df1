/// Mason: falling-block puzzle on a fixed 10x20 well. Pieces come from a
/// 7-bag with a one-piece preview; gravity ramps with session time, soft
/// drop multiplies the interval, and horizontal movement auto-repeats
/// after a delayed-auto-shift window. Hard drop is worth exactly one
/// point; line clears score through the shared clear table.

use crossterm::style::Color;
use rand::rngs::ThreadRng;

use crate::domain::board::{score_for_clear, Board};
use crate::domain::clock::TickAccumulator;
use crate::domain::grid::Dir;
use crate::domain::input::FrameInput;
use crate::domain::piece::{PieceKind, SevenBag, KICKS};
use crate::ui::canvas::{Canvas, CELL_W, MAP_ROW};

use super::{EndResult, GameEvent, Minigame, Outcome, Viewport};

const COLS: i32 = 10;
const ROWS: i32 = 20;

const START_DROP_SEC: f32 = 0.78;
const MIN_DROP_SEC: f32 = 0.12;
const RAMP_PER_SEC: f32 = 0.0048;
const SOFT_DROP_MULT: f32 = 0.09;

/// Delayed auto-shift: hold this long before repeats kick in.
const MOVE_DAS: f32 = 0.13;
/// Auto-repeat rate once shifting.
const MOVE_ARR: f32 = 0.045;

const SPAWN_X: i32 = 3;
const SPAWN_Y: i32 = 0;

pub struct MasonSession {
    board: Board,
    bag: SevenBag,
    cur: PieceKind,
    next: PieceKind,
    rot: usize,
    px: i32,
    py: i32,
    t: f32,
    score: u32,
    lines: u32,
    dropper: TickAccumulator,
    das_timer: f32,
    arr_timer: f32,
    last_dir: i32,
    rng: ThreadRng,
}

impl MasonSession {
    pub fn new() -> Self {
        let mut rng = rand::rng();
        let mut bag = SevenBag::new(&mut rng);
        let cur = bag.next(&mut rng);
        let next = bag.next(&mut rng);
        MasonSession {
            board: Board::new(COLS, ROWS),
            bag,
            cur,
            next,
            rot: 0,
            px: SPAWN_X,
            py: SPAWN_Y,
            t: 0.0,
            score: 0,
            lines: 0,
            dropper: TickAccumulator::new(),
            das_timer: 0.0,
            arr_timer: 0.0,
            last_dir: 0,
            rng,
        }
    }

    fn drop_interval(&self, soft: bool) -> f32 {
        let base = (START_DROP_SEC - RAMP_PER_SEC * self.t).max(MIN_DROP_SEC);
        if soft {
            base * SOFT_DROP_MULT
        } else {
            base
        }
    }

    fn level(&self) -> u32 {
        1 + ((START_DROP_SEC - self.drop_interval(false)) / 0.08) as u32
    }

    fn try_shift(&mut self, dx: i32) -> bool {
        if self.board.can_place(self.cur, self.rot, self.px + dx, self.py) {
            self.px += dx;
            true
        } else {
            false
        }
    }

    fn try_rotate(&mut self) {
        let nr = self.rot + 1;
        for (dx, dy) in KICKS {
            if self.board.can_place(self.cur, nr, self.px + dx, self.py + dy) {
                self.rot = nr;
                self.px += dx;
                self.py += dy;
                return;
            }
        }
    }

    /// Stamp the current piece, clear lines, and spawn the next one.
    /// Returns false when the fresh piece cannot be placed.
    fn lock_and_spawn(&mut self, events: &mut Vec<GameEvent>) -> bool {
        self.board.lock(self.cur, self.rot, self.px, self.py);
        let (cleared, _) = self.board.clear_lines();
        if cleared > 0 {
            self.score += score_for_clear(cleared);
            self.lines += cleared as u32;
            events.push(GameEvent::LineClear(cleared.min(4) as u32));
        }
        self.cur = self.next;
        self.next = self.bag.next(&mut self.rng);
        self.rot = 0;
        self.px = SPAWN_X;
        self.py = SPAWN_Y;
        self.board.can_place(self.cur, self.rot, self.px, self.py)
    }

    fn ghost_y(&self) -> i32 {
        let mut gy = self.py;
        while self.board.can_place(self.cur, self.rot, self.px, gy + 1) {
            gy += 1;
        }
        gy
    }

    fn auto_shift(&mut self, dt: f32, input: &FrameInput) {
        // Fresh presses move immediately and restart the repeat window.
        match input.turn {
            Some(Dir::Left) => {
                self.last_dir = -1;
                self.das_timer = 0.0;
                self.arr_timer = 0.0;
                self.try_shift(-1);
            }
            Some(Dir::Right) => {
                self.last_dir = 1;
                self.das_timer = 0.0;
                self.arr_timer = 0.0;
                self.try_shift(1);
            }
            _ => {}
        }

        let held_dir = match (input.left, input.right) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        };

        if held_dir == 0 {
            self.last_dir = 0;
            self.das_timer = 0.0;
            self.arr_timer = 0.0;
            return;
        }
        if held_dir != self.last_dir {
            self.last_dir = held_dir;
            self.das_timer = 0.0;
            self.arr_timer = 0.0;
            return;
        }

        self.das_timer += dt;
        if self.das_timer >= MOVE_DAS {
            self.arr_timer += dt;
            while self.arr_timer >= MOVE_ARR {
                self.arr_timer -= MOVE_ARR;
                if !self.try_shift(held_dir) {
                    break;
                }
            }
        }
    }
}

impl Minigame for MasonSession {
    fn frame(
        &mut self,
        dt: f32,
        input: &FrameInput,
        _view: Viewport,
        events: &mut Vec<GameEvent>,
    ) -> Option<Outcome> {
        if input.cancel {
            return Some(Outcome { result: EndResult::Quit, score: self.score });
        }

        self.t += dt;

        if input.rotate {
            self.try_rotate();
        }

        self.auto_shift(dt, input);

        if input.hard_drop {
            self.py = self.ghost_y();
            self.score += 1;
            if !self.lock_and_spawn(events) {
                events.push(GameEvent::Death);
                return Some(Outcome { result: EndResult::GameOver, score: self.score });
            }
            // Fresh piece starts with a clean gravity accumulator.
            self.dropper.reset();
        }

        self.dropper.add(dt);
        loop {
            let interval = self.drop_interval(input.down);
            if !self.dropper.consume(interval) {
                break;
            }
            if self.board.can_place(self.cur, self.rot, self.px, self.py + 1) {
                self.py += 1;
            } else if !self.lock_and_spawn(events) {
                events.push(GameEvent::Death);
                return Some(Outcome { result: EndResult::GameOver, score: self.score });
            }
        }

        None
    }

    fn render(&self, canvas: &mut Canvas) {
        let cols = (canvas.width() / CELL_W) as i32;
        let rows = canvas.height().saturating_sub(MAP_ROW) as i32;
        let ox = ((cols - COLS) / 2).max(1);
        let oy = ((rows - ROWS) / 2).max(0);

        canvas.hud(&format!(
            " MASON   Score: {:<6}  Lines: {:<4}  Level: {}",
            self.score,
            self.lines,
            self.level()
        ));

        let wall = Color::Rgb { r: 90, g: 90, b: 120 };
        for gy in oy - 1..=oy + ROWS {
            canvas.game_block(ox - 1, gy, '▌', wall, Color::Reset);
            canvas.game_block(ox + COLS, gy, '▐', wall, Color::Reset);
        }
        for gx in ox - 1..=ox + COLS {
            canvas.game_block(gx, oy + ROWS, '▀', wall, Color::Reset);
        }

        for y in 0..ROWS {
            for x in 0..COLS {
                if let Some(kind) = self.board.cell(x, y) {
                    let (fg, bg) = kind_colors(kind);
                    canvas.game_cell(ox + x, oy + y, '[', ']', fg, bg);
                }
            }
        }

        // Landing preview under the live piece.
        let gy = self.ghost_y();
        if gy != self.py {
            let (fg, _) = kind_colors(self.cur);
            for (bx, by) in self.cur.blocks(self.rot) {
                canvas.game_block(ox + self.px + bx, oy + gy + by, '░', fg, Color::Reset);
            }
        }

        let (fg, bg) = kind_colors(self.cur);
        for (bx, by) in self.cur.blocks(self.rot) {
            canvas.game_cell(ox + self.px + bx, oy + self.py + by, '[', ']', fg, bg);
        }

        // Next-piece preview to the right of the well.
        let nx = ox + COLS + 3;
        canvas.game_text(nx, oy, "NEXT", Color::White, Color::Reset);
        let (nfg, nbg) = kind_colors(self.next);
        for (bx, by) in self.next.blocks(0) {
            canvas.game_cell(nx + bx, oy + 2 + by, '[', ']', nfg, nbg);
        }
    }
}

fn kind_colors(kind: PieceKind) -> (Color, Color) {
    let fg = match kind {
        PieceKind::I => Color::Rgb { r: 80, g: 220, b: 230 },
        PieceKind::O => Color::Rgb { r: 235, g: 210, b: 70 },
        PieceKind::T => Color::Rgb { r: 180, g: 100, b: 230 },
        PieceKind::S => Color::Rgb { r: 90, g: 210, b: 100 },
        PieceKind::Z => Color::Rgb { r: 230, g: 90, b: 90 },
        PieceKind::J => Color::Rgb { r: 90, g: 120, b: 230 },
        PieceKind::L => Color::Rgb { r: 235, g: 150, b: 60 },
    };
    let bg = match fg {
        Color::Rgb { r, g, b } => Color::Rgb { r: r / 4, g: g / 4, b: b / 4 },
        other => other,
    };
    (fg, bg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn view() -> Viewport {
        Viewport { cols: 60, rows: 30 }
    }

    #[test]
    fn gravity_lowers_the_piece() {
        let mut g = MasonSession::new();
        let mut ev = Vec::new();
        let y0 = g.py;
        for _ in 0..60 {
            g.frame(0.016, &idle(), view(), &mut ev);
        }
        assert!(g.py > y0, "piece should have dropped after ~1s");
    }

    #[test]
    fn gravity_ramps_down_to_the_floor() {
        let mut g = MasonSession::new();
        assert!((g.drop_interval(false) - START_DROP_SEC).abs() < 1e-6);
        g.t = 60.0;
        assert!(g.drop_interval(false) < START_DROP_SEC);
        g.t = 100_000.0;
        assert!((g.drop_interval(false) - MIN_DROP_SEC).abs() < 1e-6);
    }

    #[test]
    fn soft_drop_shrinks_the_interval() {
        let g = MasonSession::new();
        assert!(g.drop_interval(true) < g.drop_interval(false) * 0.1 + 1e-6);
    }

    #[test]
    fn hard_drop_scores_one_point_and_spawns_fresh() {
        let mut g = MasonSession::new();
        let mut ev = Vec::new();
        let input = FrameInput { hard_drop: true, ..Default::default() };
        let out = g.frame(0.001, &input, view(), &mut ev);
        assert!(out.is_none(), "empty board, hard drop cannot end the game");
        assert_eq!(g.score, 1);
        assert_eq!(g.py, SPAWN_Y);
        assert!(g.board.occupied_count() >= 4);
    }

    #[test]
    fn completed_row_scores_and_emits_line_clear() {
        let mut g = MasonSession::new();
        // Bottom row filled for x 0..=5; the horizontal I covers 6..=9.
        g.board.lock(PieceKind::I, 0, 0, 18);
        g.board.lock(PieceKind::I, 0, 2, 18);
        g.cur = PieceKind::I;
        g.rot = 0;
        g.px = 6;
        g.py = 0;
        let mut ev = Vec::new();
        let input = FrameInput { hard_drop: true, ..Default::default() };
        g.frame(0.001, &input, view(), &mut ev);
        assert!(ev.contains(&GameEvent::LineClear(1)));
        assert_eq!(g.score, 1 + score_for_clear(1));
        assert_eq!(g.lines, 1);
    }

    #[test]
    fn blocked_spawn_ends_the_game() {
        let mut g = MasonSession::new();
        // A vertical bar through the spawn area.
        g.board.lock(PieceKind::I, 1, 2, 0);
        g.next = PieceKind::O;
        g.cur = PieceKind::O;
        g.px = 3;
        g.py = 16;
        let mut ev = Vec::new();
        let input = FrameInput { hard_drop: true, ..Default::default() };
        let out = g.frame(0.001, &input, view(), &mut ev).expect("spawn is blocked");
        assert_eq!(out.result, EndResult::GameOver);
        assert!(ev.contains(&GameEvent::Death));
    }

    #[test]
    fn wall_kick_rescues_an_edge_rotation() {
        let mut g = MasonSession::new();
        g.cur = PieceKind::I;
        g.rot = 1; // vertical, column px+2
        g.px = -2; // hugging the left wall
        g.py = 5;
        let mut ev = Vec::new();
        let input = FrameInput { rotate: true, ..Default::default() };
        g.frame(0.001, &input, view(), &mut ev);
        assert_eq!(g.rot % 2, 0, "rotation should have succeeded");
        assert_eq!(g.px, 0, "kick shifted the piece back in bounds");
    }

    #[test]
    fn fresh_press_moves_once_then_repeats_after_das() {
        let mut g = MasonSession::new();
        g.cur = PieceKind::O;
        g.px = 4;
        g.py = 5;
        let mut ev = Vec::new();

        let press = FrameInput {
            turn: Some(Dir::Left),
            left: true,
            ..Default::default()
        };
        g.frame(0.001, &press, view(), &mut ev);
        assert_eq!(g.px, 3, "fresh press shifts immediately");

        // Holding for less than the DAS window adds nothing.
        let hold = FrameInput { left: true, ..Default::default() };
        g.frame(MOVE_DAS * 0.5, &hold, view(), &mut ev);
        assert_eq!(g.px, 3);

        // Crossing the window starts the auto-repeat.
        g.frame(MOVE_DAS, &hold, view(), &mut ev);
        g.frame(MOVE_ARR * 2.5, &hold, view(), &mut ev);
        assert!(g.px < 3);
    }

    #[test]
    fn quit_returns_quit_result() {
        let mut g = MasonSession::new();
        let mut ev = Vec::new();
        let input = FrameInput { cancel: true, ..Default::default() };
        let o = g.frame(0.016, &input, view(), &mut ev).expect("quit is immediate");
        assert_eq!(o.result, EndResult::Quit);
    }
}
