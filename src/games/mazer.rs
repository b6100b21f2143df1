/// Mazer: maze chase across a 60x30 board (a 20x15 pattern tiled 3x2 with
/// carved doorways). The pac eats pellets at a fixed rate while ghosts
/// ramp up in speed and cunning; at intersections they flip a coin between
/// BFS pursuit and a random non-reversing wander, and the pursuit odds
/// climb with session time. Chili pickups grant a blink window during
/// which ghost contact freezes the ghost instead of ending the game.

use std::collections::HashSet;

use crossterm::style::Color;
use rand::rngs::ThreadRng;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::domain::clock::TickAccumulator;
use crate::domain::effect::EffectTimer;
use crate::domain::grid::{Cell, Dir};
use crate::domain::input::FrameInput;
use crate::domain::maze::Maze;
use crate::domain::pathing::bfs_next_step;
use crate::ui::canvas::Canvas;

use super::{EndResult, GameEvent, Minigame, Outcome, Viewport};

const PAC_TPS: f32 = 5.5;
const BASE_GHOST_TPS: f32 = 3.2;
const GHOST_TPS_RAMP: f32 = 0.11;
const MAX_GHOST_TPS: f32 = 17.0;

const CHASE_BASE: f32 = 0.18;
const CHASE_RAMP: f32 = 0.006;
const CHASE_MAX: f32 = 0.92;

const ADD_GHOST_AT: f32 = 40.0;
const ADD_GHOST_2_AT: f32 = 75.0;

const CHILI_COUNT: usize = 2;
const CHILI_DURATION: f32 = 10.0;
const CHILI_FREEZE: f32 = 10.0;

const PELLET_SCORE: f32 = 0.5;
const REFILL_SCORE: f32 = 50.0;

struct Ghost {
    pos: Cell,
    dir: (i32, i32),
    freeze: EffectTimer,
}

pub struct MazerSession {
    maze: Maze,
    pellets: HashSet<Cell>,
    chilis: HashSet<Cell>,

    pac_pos: Cell,
    pac_dir: (i32, i32),
    pac_next_dir: (i32, i32),

    ghosts: Vec<Ghost>,

    blink: EffectTimer,
    blink_accum: f32,
    blink_on: bool,

    // Pellets are half a point each; the outcome truncates.
    score: f32,
    t: f32,

    pac_ticker: TickAccumulator,
    ghost_ticker: TickAccumulator,
    rng: ThreadRng,
}

impl MazerSession {
    pub fn new() -> Self {
        let maze = Maze::cabinet();
        let mut rng = rand::rng();
        let pellets = maze.pellet_cells();
        let (cols, rows) = (maze.width(), maze.height());

        let pac_pos = maze.spawn_open_near((1, 1), &mut rng);
        let ghosts = vec![
            Ghost {
                pos: maze.spawn_open_near((cols - 2, 1), &mut rng),
                dir: (-1, 0),
                freeze: EffectTimer::new(),
            },
            Ghost {
                pos: maze.spawn_open_near((cols - 2, rows - 2), &mut rng),
                dir: (-1, 0),
                freeze: EffectTimer::new(),
            },
            Ghost {
                pos: maze.spawn_open_near((1, rows - 2), &mut rng),
                dir: (1, 0),
                freeze: EffectTimer::new(),
            },
        ];

        let mut game = MazerSession {
            maze,
            pellets,
            chilis: HashSet::new(),
            pac_pos,
            pac_dir: (1, 0),
            pac_next_dir: (1, 0),
            ghosts,
            blink: EffectTimer::new(),
            blink_accum: 0.0,
            blink_on: true,
            score: 0.0,
            t: 0.0,
            pac_ticker: TickAccumulator::new(),
            ghost_ticker: TickAccumulator::new(),
            rng,
        };
        game.ensure_chilis();
        game
    }

    fn ghost_tps(&self) -> f32 {
        (BASE_GHOST_TPS + GHOST_TPS_RAMP * self.t).min(MAX_GHOST_TPS)
    }

    fn chase_probability(&self) -> f64 {
        ((CHASE_BASE + CHASE_RAMP * self.t) as f64).min(CHASE_MAX as f64)
    }

    /// Keep exactly two chilis on the field.
    fn ensure_chilis(&mut self) {
        while self.chilis.len() < CHILI_COUNT {
            let mut exclude = self.chilis.clone();
            exclude.insert(self.pac_pos);
            exclude.extend(self.ghosts.iter().map(|g| g.pos));
            let pos = self.maze.random_open_cell(&exclude, &mut self.rng);
            self.chilis.insert(pos);
        }
    }

    fn pac_step(&mut self, events: &mut Vec<GameEvent>) {
        let (px, py) = self.pac_pos;

        // Queued turn applies as soon as the target cell is open.
        let (ndx, ndy) = self.pac_next_dir;
        if !self.maze.is_wall(px + ndx, py + ndy) {
            self.pac_dir = self.pac_next_dir;
        }

        let (dx, dy) = self.pac_dir;
        if !self.maze.is_wall(px + dx, py + dy) {
            self.pac_pos = (px + dx, py + dy);
        }

        if self.pellets.remove(&self.pac_pos) {
            self.score += PELLET_SCORE;
            events.push(GameEvent::Pickup);
        }

        if self.chilis.remove(&self.pac_pos) {
            self.blink.start(CHILI_DURATION);
            self.blink_accum = 0.0;
            self.blink_on = true;
            events.push(GameEvent::Powerup);
        }

        self.ensure_chilis();

        // Board cleared: bonus, refill, and the pac returns home.
        if self.pellets.is_empty() {
            self.score += REFILL_SCORE;
            self.pellets = self.maze.pellet_cells();
            self.pac_pos = self.maze.spawn_open_near((1, 1), &mut self.rng);
            self.ensure_chilis();
            events.push(GameEvent::WaveClear);
        }
    }

    fn ghost_step(&mut self) {
        let chase_p = self.chase_probability();
        for i in 0..self.ghosts.len() {
            if self.ghosts[i].freeze.active() {
                continue;
            }
            let (gx, gy) = self.ghosts[i].pos;
            let possible = self.maze.open_dirs(gx, gy);

            let (cdx, cdy) = self.ghosts[i].dir;
            let at_intersection = possible.len() >= 3 || !possible.contains(&(cdx, cdy));

            if at_intersection && !possible.is_empty() {
                if self.rng.random_bool(chase_p) {
                    let step = bfs_next_step(&self.maze, (gx, gy), self.pac_pos);
                    let d = (step.0 - gx, step.1 - gy);
                    self.ghosts[i].dir = if possible.contains(&d) {
                        d
                    } else {
                        *possible.choose(&mut self.rng).unwrap_or(&(cdx, cdy))
                    };
                } else {
                    let rev = (-cdx, -cdy);
                    let opts: Vec<(i32, i32)> =
                        possible.iter().copied().filter(|&d| d != rev).collect();
                    let pool = if opts.is_empty() { &possible } else { &opts };
                    if let Some(&d) = pool.choose(&mut self.rng) {
                        self.ghosts[i].dir = d;
                    }
                }
            }

            let (dx, dy) = self.ghosts[i].dir;
            if !self.maze.is_wall(gx + dx, gy + dy) {
                self.ghosts[i].pos = (gx + dx, gy + dy);
            }
        }
    }

    /// Ghost-on-pac contact: fatal normally, a freeze during chili blink.
    fn resolve_contacts(&mut self, events: &mut Vec<GameEvent>) -> bool {
        let blink_active = self.blink.active();
        for g in &mut self.ghosts {
            if g.pos == self.pac_pos {
                if blink_active {
                    g.freeze.start(CHILI_FREEZE);
                } else {
                    events.push(GameEvent::Death);
                    return true;
                }
            }
        }
        false
    }
}

impl Minigame for MazerSession {
    fn frame(
        &mut self,
        dt: f32,
        input: &FrameInput,
        _view: Viewport,
        events: &mut Vec<GameEvent>,
    ) -> Option<Outcome> {
        if input.cancel {
            return Some(Outcome { result: EndResult::Quit, score: self.score as u32 });
        }

        if let Some(turn) = input.turn {
            self.pac_next_dir = match turn {
                Dir::Up => (0, -1),
                Dir::Down => (0, 1),
                Dir::Left => (-1, 0),
                Dir::Right => (1, 0),
            };
        }

        self.t += dt;

        // Blink flickers faster as the chili window runs out.
        if self.blink.active() {
            let rem = self.blink.remaining();
            let interval = 0.05 + 0.25 * (rem / CHILI_DURATION);
            self.blink_accum += dt;
            while self.blink_accum >= interval {
                self.blink_accum -= interval;
                self.blink_on = !self.blink_on;
            }
        } else {
            self.blink_on = true;
            self.blink_accum = 0.0;
        }
        self.blink.tick(dt);

        for g in &mut self.ghosts {
            g.freeze.tick(dt);
        }

        // Reinforcement ghosts.
        if self.t >= ADD_GHOST_AT && self.ghosts.len() < 4 {
            let pos = self.maze.spawn_open_near((1, self.maze.height() - 2), &mut self.rng);
            self.ghosts.push(Ghost { pos, dir: (1, 0), freeze: EffectTimer::new() });
        }
        if self.t >= ADD_GHOST_2_AT && self.ghosts.len() < 5 {
            let pos = self
                .maze
                .spawn_open_near((self.maze.width() / 2, self.maze.height() / 2), &mut self.rng);
            self.ghosts.push(Ghost { pos, dir: (1, 0), freeze: EffectTimer::new() });
        }

        self.pac_ticker.add(dt);
        while self.pac_ticker.consume(1.0 / PAC_TPS) {
            self.pac_step(events);
        }

        self.ghost_ticker.add(dt);
        loop {
            let interval = 1.0 / self.ghost_tps();
            if !self.ghost_ticker.consume(interval) {
                break;
            }
            self.ghost_step();
        }

        if self.resolve_contacts(events) {
            return Some(Outcome { result: EndResult::GameOver, score: self.score as u32 });
        }
        None
    }

    fn render(&self, canvas: &mut Canvas) {
        let blink_active = self.blink.active();
        let mut hud = format!(
            " MAZER    Score: {:<6.1}  Ghosts: {:.1} tps  Chase: {}%",
            self.score,
            self.ghost_tps(),
            (self.chase_probability() * 100.0) as u32
        );
        if blink_active {
            hud.push_str(&format!("  CHILI {:.1}s", self.blink.remaining()));
        }
        canvas.hud(&hud);

        let wall_fg = Color::Rgb { r: 80, g: 120, b: 255 };
        let wall_bg = Color::Rgb { r: 30, g: 45, b: 110 };
        for y in 0..self.maze.height() {
            for x in 0..self.maze.width() {
                if self.maze.is_wall(x, y) {
                    canvas.game_block(x, y, '░', wall_fg, wall_bg);
                }
            }
        }

        for &(x, y) in &self.pellets {
            canvas.game_cell(x, y, ' ', '·', Color::Rgb { r: 245, g: 245, b: 255 }, Color::Reset);
        }

        for &(x, y) in &self.chilis {
            canvas.game_cell(x, y, ' ', '¢', Color::Rgb { r: 255, g: 70, b: 60 }, Color::Reset);
        }

        // The pac flickers while the chili window is open.
        if !blink_active || self.blink_on {
            let fg = if blink_active {
                Color::Rgb { r: 255, g: 140, b: 90 }
            } else {
                Color::Rgb { r: 255, g: 230, b: 140 }
            };
            let glyph = match self.pac_dir {
                (1, 0) => '>',
                (-1, 0) => '<',
                (0, -1) => '^',
                _ => 'v',
            };
            canvas.game_cell(self.pac_pos.0, self.pac_pos.1, '(', glyph, fg, Color::Reset);
        }

        const GHOST_COLORS: [Color; 5] = [
            Color::Rgb { r: 255, g: 100, b: 100 },
            Color::Rgb { r: 255, g: 180, b: 220 },
            Color::Rgb { r: 140, g: 255, b: 255 },
            Color::Rgb { r: 255, g: 190, b: 100 },
            Color::Rgb { r: 180, g: 140, b: 255 },
        ];
        for (i, g) in self.ghosts.iter().enumerate() {
            let fg = if g.freeze.active() {
                Color::Rgb { r: 120, g: 120, b: 140 }
            } else {
                GHOST_COLORS[i % GHOST_COLORS.len()]
            };
            canvas.game_cell(g.pos.0, g.pos.1, '&', '&', fg, Color::Reset);
        }
    }
}
