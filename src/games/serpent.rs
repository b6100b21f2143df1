/// Serpent: grid snake with a ramping, jittered tick rate and two ground
/// powerups. Rage speeds the snake up and seeds extra white apples every
/// tenth tick; slow-mo drops the speed to a crawl. Ground powerups appear
/// with a coin flip after each main apple once the opening grace period
/// has passed, and despawn if left on the field.
///
/// The board is frozen at session start from the viewport.

use std::collections::{HashSet, VecDeque};

use crossterm::style::Color;
use rand::rngs::ThreadRng;
use rand::Rng;

use crate::config::SerpentTuning;
use crate::domain::clock::TickAccumulator;
use crate::domain::effect::EffectTimer;
use crate::domain::grid::{in_bounds, spawn_free_cell, Cell, Dir};
use crate::domain::input::FrameInput;
use crate::ui::canvas::Canvas;

use super::{EndResult, GameEvent, Minigame, Outcome, Viewport};

const START_LEN: usize = 5;
const SAFE_MARGIN: i32 = 3;
const APPLE_SCORE: u32 = 5;

const POWERUP_GRACE: f32 = 3.0;
const POWERUP_LIFETIME: f32 = 10.0;

const RAGE_DURATION: f32 = 10.0;
const RAGE_SPEED_MULT: f32 = 1.20;
const RAGE_EVERY_N_TICKS: u64 = 10;
const RAGE_MAX_EXTRA_APPLES: usize = 6;

const SLOWMO_DURATION: f32 = 5.0;
const SLOWMO_SPEED_MULT: f32 = 0.40;

#[derive(Clone, Copy, PartialEq, Eq)]
enum PowerupKind {
    Rage,
    Slowmo,
}

struct GroundPowerup {
    kind: PowerupKind,
    pos: Cell,
    life: EffectTimer,
}

pub struct SerpentSession {
    cols: i32,
    rows: i32,
    tuning: SerpentTuning,

    snake: VecDeque<Cell>,
    dir: Dir,
    next_dir: Dir,

    main_apple: Cell,
    extra_apples: HashSet<Cell>,
    powerups: Vec<GroundPowerup>,

    rage: EffectTimer,
    slowmo: EffectTimer,

    score: u32,
    t: f32,
    ticks_moved: u64,
    dead: bool,

    ticker: TickAccumulator,
    rng: ThreadRng,
}

impl SerpentSession {
    pub fn new(view: Viewport, tuning: SerpentTuning) -> Self {
        let cols = (view.cols as i32).max(10);
        let rows = (view.rows as i32).max(10);
        let (cx, cy) = (cols / 2, rows / 2);

        let mut game = SerpentSession {
            cols,
            rows,
            tuning,
            snake: (0..START_LEN as i32).map(|i| (cx - i, cy)).collect(),
            dir: Dir::Right,
            next_dir: Dir::Right,
            main_apple: (0, 0),
            extra_apples: HashSet::new(),
            powerups: Vec::new(),
            rage: EffectTimer::default(),
            slowmo: EffectTimer::default(),
            score: 0,
            t: 0.0,
            ticks_moved: 0,
            dead: false,
            ticker: TickAccumulator::new(),
            rng: rand::rng(),
        };
        game.spawn_main_apple();
        game
    }

    fn occupied(&self) -> HashSet<Cell> {
        let mut occ: HashSet<Cell> = self.snake.iter().copied().collect();
        occ.insert(self.main_apple);
        occ.extend(self.extra_apples.iter().copied());
        occ.extend(self.powerups.iter().map(|p| p.pos));
        occ
    }

    fn spawn_main_apple(&mut self) {
        let occ = self.occupied();
        if let Some(p) = spawn_free_cell(self.cols, self.rows, SAFE_MARGIN, &occ, &mut self.rng) {
            self.main_apple = p;
        }
    }

    fn spawn_extra_apple(&mut self) {
        let occ = self.occupied();
        if let Some(p) = spawn_free_cell(self.cols, self.rows, SAFE_MARGIN, &occ, &mut self.rng) {
            self.extra_apples.insert(p);
        }
    }

    /// Coin-flip ground powerups after each eaten main apple. At most one
    /// of each kind on the field.
    fn maybe_spawn_powerups(&mut self) {
        if self.t < POWERUP_GRACE {
            return;
        }
        for (kind, chance) in [
            (PowerupKind::Rage, self.tuning.rage_chance),
            (PowerupKind::Slowmo, self.tuning.slowmo_chance),
        ] {
            if self.powerups.iter().any(|p| p.kind == kind) {
                continue;
            }
            // Tuning comes from config.toml; pin it to a valid probability.
            if self.rng.random_bool(chance.clamp(0.0, 1.0)) {
                let occ = self.occupied();
                if let Some(pos) =
                    spawn_free_cell(self.cols, self.rows, SAFE_MARGIN, &occ, &mut self.rng)
                {
                    self.powerups.push(GroundPowerup {
                        kind,
                        pos,
                        life: EffectTimer::started(POWERUP_LIFETIME),
                    });
                }
            }
        }
    }

    fn tps(&self) -> f32 {
        let base = (self.tuning.base_tps + self.tuning.tps_ramp * self.t).min(self.tuning.max_tps);
        let mut mult = 1.0;
        if self.rage.active() {
            mult *= RAGE_SPEED_MULT;
        }
        if self.slowmo.active() {
            mult *= SLOWMO_SPEED_MULT;
        }
        (base * mult).min(self.tuning.max_tps * 1.5)
    }

    /// One movement tick. Sets `dead` on wall exit or self collision.
    fn step(&mut self, events: &mut Vec<GameEvent>) {
        if self.dead {
            return;
        }
        self.dir = self.next_dir;
        self.ticks_moved += 1;

        let (hx, hy) = self.snake[0];
        let (dx, dy) = self.dir.delta();
        let head = (hx + dx, hy + dy);

        if !in_bounds(head.0, head.1, self.cols, self.rows) {
            self.dead = true;
            events.push(GameEvent::Death);
            return;
        }
        // The tail cell vacates this tick, so it does not count.
        if self.snake.iter().take(self.snake.len() - 1).any(|&c| c == head) {
            self.dead = true;
            events.push(GameEvent::Death);
            return;
        }

        self.snake.push_front(head);

        if self.rage.active()
            && self.ticks_moved % RAGE_EVERY_N_TICKS == 0
            && self.extra_apples.len() < RAGE_MAX_EXTRA_APPLES
        {
            self.spawn_extra_apple();
        }

        let ate_main = head == self.main_apple;
        let ate_extra = self.extra_apples.contains(&head);
        if ate_main || ate_extra {
            self.score += APPLE_SCORE;
            events.push(GameEvent::Pickup);
            if ate_main {
                self.spawn_main_apple();
                self.maybe_spawn_powerups();
            }
            if ate_extra {
                self.extra_apples.remove(&head);
            }
            // Growing: the tail stays.
        } else {
            self.snake.pop_back();
        }

        let mut collected = None;
        self.powerups.retain(|p| {
            if p.pos == head {
                collected = Some(p.kind);
                false
            } else {
                true
            }
        });
        if let Some(kind) = collected {
            events.push(GameEvent::Powerup);
            match kind {
                PowerupKind::Rage => self.rage.start(RAGE_DURATION),
                PowerupKind::Slowmo => self.slowmo.start(SLOWMO_DURATION),
            }
        }
    }
}

impl Minigame for SerpentSession {
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

        if let Some(turn) = input.turn {
            if turn != self.dir.opposite() {
                self.next_dir = turn;
            }
        }

        self.t += dt;

        // Ground powerups rot away if ignored.
        for p in &mut self.powerups {
            p.life.tick(dt);
        }
        self.powerups.retain(|p| p.life.active());

        // Rage running out takes its white apples with it.
        if self.rage.tick(dt) {
            self.extra_apples.clear();
        }
        self.slowmo.tick(dt);

        self.ticker.add(dt);
        let jitter = self.tuning.jitter;
        loop {
            let interval = 1.0 / self.tps();
            if !self.ticker.consume_jittered(interval, jitter, &mut self.rng) || self.dead {
                break;
            }
            self.step(events);
        }

        if self.dead {
            return Some(Outcome { result: EndResult::GameOver, score: self.score });
        }
        None
    }

    fn render(&self, canvas: &mut Canvas) {
        let lock = (POWERUP_GRACE - self.t).max(0.0);
        let mut hud = format!(" SERPENT  Score: {:<6}  Speed: {:>4.1} tps", self.score, self.tps());
        if lock > 0.0 {
            hud.push_str(&format!("  Powerups in {lock:.0}s"));
        } else if self.rage.active() {
            hud.push_str(&format!("  RAGE {:.1}s", self.rage.remaining()));
        } else if self.slowmo.active() {
            hud.push_str(&format!("  SLOWMO {:.1}s", self.slowmo.remaining()));
        }
        canvas.hud(&hud);

        let (ax, ay) = self.main_apple;
        canvas.game_cell(ax, ay, '(', ')', Color::Rgb { r: 255, g: 120, b: 120 }, Color::Reset);

        for &(ex, ey) in &self.extra_apples {
            canvas.game_cell(ex, ey, '(', ')', Color::Rgb { r: 245, g: 245, b: 255 }, Color::Reset);
        }

        for p in &self.powerups {
            // Fade as the despawn timer runs down.
            let rem = p.life.remaining() / POWERUP_LIFETIME;
            let c = 120 + (135.0 * rem) as u8;
            let (glyph, fg) = match p.kind {
                PowerupKind::Rage => ('R', Color::Rgb { r: 255, g: c, b: 140 }),
                PowerupKind::Slowmo => ('S', Color::Rgb { r: 140, g: c, b: 255 }),
            };
            canvas.game_cell(p.pos.0, p.pos.1, '[', glyph, fg, Color::Reset);
        }

        for (i, &(sx, sy)) in self.snake.iter().enumerate() {
            let fg = if i == 0 {
                Color::Rgb { r: 180, g: 220, b: 255 }
            } else {
                Color::Rgb { r: 140, g: 200, b: 255 }
            };
            canvas.game_block(sx, sy, '█', fg, Color::Reset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SerpentSession {
        SerpentSession::new(Viewport { cols: 30, rows: 20 }, SerpentTuning {
            base_tps: 10.0,
            max_tps: 28.0,
            tps_ramp: 0.2,
            jitter: 0.12,
            rage_chance: 0.10,
            slowmo_chance: 0.20,
        })
    }

    #[test]
    fn reversal_is_ignored() {
        let mut g = session();
        let mut ev = Vec::new();
        let input = FrameInput { turn: Some(Dir::Left), ..Default::default() };
        g.frame(0.0, &input, Viewport { cols: 30, rows: 20 }, &mut ev);
        assert_eq!(g.next_dir, Dir::Right);

        let input = FrameInput { turn: Some(Dir::Up), ..Default::default() };
        g.frame(0.0, &input, Viewport { cols: 30, rows: 20 }, &mut ev);
        assert_eq!(g.next_dir, Dir::Up);
    }

    #[test]
    fn out_of_range_powerup_chance_is_pinned() {
        let mut g = SerpentSession::new(Viewport { cols: 30, rows: 20 }, SerpentTuning {
            base_tps: 10.0,
            max_tps: 28.0,
            tps_ramp: 0.2,
            jitter: 0.12,
            rage_chance: 1.5,
            slowmo_chance: -0.3,
        });
        g.t = POWERUP_GRACE;
        // Must not panic; 1.5 pins to certainty, -0.3 to never.
        g.maybe_spawn_powerups();
        assert!(g.powerups.iter().any(|p| p.kind == PowerupKind::Rage));
        assert!(!g.powerups.iter().any(|p| p.kind == PowerupKind::Slowmo));
    }

    #[test]
    fn eating_grows_and_scores() {
        let mut g = session();
        let head = g.snake[0];
        g.main_apple = (head.0 + 1, head.1);
        let len0 = g.snake.len();
        let mut ev = Vec::new();
        g.step(&mut ev);
        assert_eq!(g.score, APPLE_SCORE);
        assert_eq!(g.snake.len(), len0 + 1);
        assert!(ev.contains(&GameEvent::Pickup));
        assert_ne!(g.main_apple, g.snake[0], "a fresh apple spawned elsewhere");
    }

    #[test]
    fn moving_without_eating_keeps_length() {
        let mut g = session();
        g.main_apple = (0, 0);
        let len0 = g.snake.len();
        let mut ev = Vec::new();
        g.step(&mut ev);
        assert_eq!(g.snake.len(), len0);
    }

    #[test]
    fn wall_exit_is_game_over() {
        let mut g = session();
        let mut ev = Vec::new();
        let steps = g.cols * 2;
        let mut died = false;
        for _ in 0..steps {
            g.step(&mut ev);
            if g.dead {
                died = true;
                break;
            }
        }
        assert!(died);
        assert!(ev.contains(&GameEvent::Death));

        // Frame after death reports the outcome and never ticks again.
        let ticks_before = g.ticks_moved;
        let o = g.frame(1.0, &FrameInput::default(), Viewport { cols: 30, rows: 20 }, &mut ev);
        assert_eq!(o.map(|o| o.result), Some(EndResult::GameOver));
        assert_eq!(g.ticks_moved, ticks_before);
    }

    #[test]
    fn self_collision_is_game_over() {
        let mut g = session();
        g.main_apple = (0, 0); // keep growth out of the scenario
        // Long enough to turn back into itself.
        let head = g.snake[0];
        for i in 1..=4 {
            g.snake.push_back((head.0 - 4 - i, head.1));
        }
        let mut ev = Vec::new();
        g.next_dir = Dir::Up;
        g.step(&mut ev);
        g.next_dir = Dir::Left;
        g.step(&mut ev);
        g.next_dir = Dir::Down;
        g.step(&mut ev);
        assert!(g.dead);
    }

    #[test]
    fn rage_expiry_clears_extra_apples() {
        let mut g = session();
        g.rage.start(0.5);
        g.extra_apples.insert((1, 1));
        g.extra_apples.insert((2, 2));
        let mut ev = Vec::new();
        g.frame(0.6, &FrameInput::default(), Viewport { cols: 30, rows: 20 }, &mut ev);
        assert!(!g.rage.active());
        assert!(g.extra_apples.is_empty());
    }

    #[test]
    fn ground_powerup_despawns_after_lifetime() {
        let mut g = session();
        g.powerups.push(GroundPowerup {
            kind: PowerupKind::Rage,
            pos: (1, 1),
            life: EffectTimer::started(0.3),
        });
        let mut ev = Vec::new();
        g.frame(0.4, &FrameInput::default(), Viewport { cols: 30, rows: 20 }, &mut ev);
        assert!(g.powerups.is_empty());
    }
}
