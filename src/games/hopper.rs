/// Hopper: one-button side-scroller. Gravity pulls the bird down, a flap
/// kicks it up, and pipe pairs scroll in from the right on a fixed spawn
/// accumulator. Past 50 points new pipes sway vertically; past 150 points
/// each pipe is worth half as much.
///
/// Simulation runs in a fixed virtual space and is mapped to terminal
/// cells at render time, so the difficulty does not depend on window size.

use crossterm::style::Color;
use rand::rngs::ThreadRng;
use rand::Rng;

use crate::domain::clock::TickAccumulator;
use crate::domain::input::FrameInput;
use crate::ui::canvas::{Canvas, CELL_W, MAP_ROW};

use super::{EndResult, GameEvent, Minigame, Outcome, Viewport};

const VIRT_W: f32 = 1600.0;
const VIRT_H: f32 = 900.0;

const GRAVITY: f32 = 2860.0;
const FLAP_VEL: f32 = -936.0;

const BASE_SCROLL: f32 = 340.0;
const SCROLL_RAMP: f32 = 10.5;
const MAX_SCROLL: f32 = 780.0;

const GROUND_Y: f32 = VIRT_H * 0.85;
const PIPE_GAP: f32 = VIRT_H * 0.26;
const PIPE_W: f32 = 110.0;
const PIPE_SPAWN_SEC: f32 = 1.755;
/// Gap centers are sampled this far away from ceiling and ground.
const SPAWN_MARGIN: f32 = VIRT_H * 0.12;
/// Swaying gaps are clamped inside this margin so they never reach
/// ground or ceiling.
const SWAY_CLAMP: f32 = VIRT_H * 0.08;

const SWAY_START_SCORE: u32 = 50;
const SWAY_AMPLITUDE: f32 = VIRT_H * 0.06;
const SWAY_SPEED: f32 = 1.5; // rad/s

const SCORE_PER_PIPE: u32 = 10;
const SCORE_PER_PIPE_LATE: u32 = 5;
const LATE_SCORE_AT: u32 = 150;

const BIRD_X: f32 = VIRT_W * 0.28;
const BIRD_R: f32 = 24.0;

struct Pipe {
    x: f32,
    gap_y: f32,
    scored: bool,
    phase: f32,
    sway: bool,
}

impl Pipe {
    /// Effective gap center at time `t`, clamped away from ground/ceiling.
    fn gap_center(&self, t: f32) -> f32 {
        let mut gy = self.gap_y;
        if self.sway {
            gy += SWAY_AMPLITUDE * (t * SWAY_SPEED + self.phase).sin();
        }
        let min_gy = PIPE_GAP / 2.0 + SWAY_CLAMP;
        let max_gy = GROUND_Y - PIPE_GAP / 2.0 - SWAY_CLAMP;
        gy.clamp(min_gy, max_gy)
    }
}

pub struct HopperSession {
    bird_y: f32,
    bird_vy: f32,
    pipes: Vec<Pipe>,
    spawner: TickAccumulator,
    t: f32,
    score: u32,
    powered: bool,
    rng: ThreadRng,
}

impl HopperSession {
    pub fn new() -> Self {
        HopperSession {
            bird_y: VIRT_H * 0.40,
            bird_vy: 0.0,
            pipes: Vec::new(),
            spawner: TickAccumulator::new(),
            t: 0.0,
            score: 0,
            powered: false,
            rng: rand::rng(),
        }
    }

    fn scroll(&self) -> f32 {
        (BASE_SCROLL + SCROLL_RAMP * self.t).min(MAX_SCROLL)
    }

    fn score_per_pipe(&self) -> u32 {
        if self.score >= LATE_SCORE_AT {
            SCORE_PER_PIPE_LATE
        } else {
            SCORE_PER_PIPE
        }
    }

    fn spawn_pipe(&mut self) {
        let min = SPAWN_MARGIN + PIPE_GAP / 2.0;
        let max = GROUND_Y - SPAWN_MARGIN - PIPE_GAP / 2.0;
        let gap_y = self.rng.random_range(min..max);
        let sway = self.score >= SWAY_START_SCORE;
        if sway && !self.powered {
            self.powered = true;
        }
        self.pipes.push(Pipe {
            x: VIRT_W + 60.0,
            gap_y,
            scored: false,
            phase: self.rng.random_range(0.0..std::f32::consts::TAU),
            sway,
        });
    }

    fn collides(&self) -> bool {
        if self.bird_y + BIRD_R >= GROUND_Y || self.bird_y - BIRD_R <= 0.0 {
            return true;
        }
        for p in &self.pipes {
            let gap = p.gap_center(self.t);
            let top_bottom = gap - PIPE_GAP / 2.0;
            let bot_top = gap + PIPE_GAP / 2.0;
            if circle_hits_rect(BIRD_X, self.bird_y, BIRD_R, p.x, 0.0, PIPE_W, top_bottom)
                || circle_hits_rect(BIRD_X, self.bird_y, BIRD_R, p.x, bot_top, PIPE_W, GROUND_Y - bot_top)
            {
                return true;
            }
        }
        false
    }
}

fn circle_hits_rect(cx: f32, cy: f32, r: f32, rx: f32, ry: f32, rw: f32, rh: f32) -> bool {
    let nx = cx.clamp(rx, rx + rw);
    let ny = cy.clamp(ry, ry + rh);
    let dx = cx - nx;
    let dy = cy - ny;
    dx * dx + dy * dy <= r * r
}

impl Minigame for HopperSession {
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

        if input.fire || input.rotate {
            self.bird_vy = FLAP_VEL;
            events.push(GameEvent::Flap);
        }

        self.t += dt;
        let scroll = self.scroll();

        self.bird_vy += GRAVITY * dt;
        self.bird_y += self.bird_vy * dt;

        let mut due = 0u32;
        self.spawner.drain(dt, || PIPE_SPAWN_SEC, || due += 1);
        for _ in 0..due {
            self.spawn_pipe();
        }

        for p in &mut self.pipes {
            p.x -= scroll * dt;
        }
        self.pipes.retain(|p| p.x > -PIPE_W - 120.0);

        let per_pipe = self.score_per_pipe();
        for p in &mut self.pipes {
            if !p.scored && BIRD_X > p.x + PIPE_W / 2.0 {
                p.scored = true;
                self.score += per_pipe;
                events.push(GameEvent::Point);
            }
        }

        if self.collides() {
            events.push(GameEvent::Death);
            return Some(Outcome { result: EndResult::GameOver, score: self.score });
        }

        None
    }

    fn render(&self, canvas: &mut Canvas) {
        let cols = canvas.width() / CELL_W;
        let rows = canvas.height().saturating_sub(MAP_ROW);
        if cols == 0 || rows == 0 {
            return;
        }
        let sx = |vx: f32| ((vx / VIRT_W) * cols as f32) as i32;
        let sy = |vy: f32| ((vy / VIRT_H) * rows as f32) as i32;

        canvas.hud(&format!(
            " HOPPER   Score: {:<6}  Speed: {:<4.0}  Pipe: +{}",
            self.score,
            self.scroll(),
            self.score_per_pipe()
        ));

        let pipe_fg = Color::Rgb { r: 80, g: 200, b: 80 };
        let pipe_bg = Color::Rgb { r: 20, g: 80, b: 20 };
        let ground_row = sy(GROUND_Y);

        for p in &self.pipes {
            let gap = p.gap_center(self.t);
            let x0 = sx(p.x).max(0);
            let x1 = sx(p.x + PIPE_W).min(cols as i32 - 1);
            let top_end = sy(gap - PIPE_GAP / 2.0);
            let bot_start = sy(gap + PIPE_GAP / 2.0);
            for gx in x0..=x1 {
                for gy in 0..top_end {
                    canvas.game_block(gx, gy, '█', pipe_fg, pipe_bg);
                }
                for gy in bot_start..ground_row {
                    canvas.game_block(gx, gy, '█', pipe_fg, pipe_bg);
                }
            }
        }

        // Ground strip
        let ground_fg = Color::Rgb { r: 180, g: 140, b: 60 };
        let ground_bg = Color::Rgb { r: 90, g: 70, b: 30 };
        for gy in ground_row..rows as i32 {
            for gx in 0..cols as i32 {
                canvas.game_block(gx, gy, '▒', ground_fg, ground_bg);
            }
        }

        // Bird
        let bird_fg = if self.powered {
            Color::Rgb { r: 255, g: 120, b: 60 }
        } else {
            Color::Rgb { r: 255, g: 220, b: 60 }
        };
        let glyph = if self.bird_vy < 0.0 { '^' } else { 'v' };
        canvas.game_cell(sx(BIRD_X), sy(self.bird_y), '(', glyph, bird_fg, Color::Reset);
    }
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
    fn gravity_pulls_the_bird_down() {
        let mut g = HopperSession::new();
        let y0 = g.bird_y;
        let mut ev = Vec::new();
        g.frame(0.016, &idle(), view(), &mut ev);
        g.frame(0.016, &idle(), view(), &mut ev);
        assert!(g.bird_y > y0);
        assert!(g.bird_vy > 0.0);
    }

    #[test]
    fn flap_kicks_upward() {
        let mut g = HopperSession::new();
        let mut ev = Vec::new();
        let input = FrameInput { fire: true, ..Default::default() };
        g.frame(0.016, &input, view(), &mut ev);
        assert!(g.bird_vy < 0.0);
        assert!(ev.contains(&GameEvent::Flap));
    }

    #[test]
    fn free_fall_ends_in_game_over() {
        let mut g = HopperSession::new();
        let mut ev = Vec::new();
        let mut outcome = None;
        for _ in 0..600 {
            if let Some(o) = g.frame(0.016, &idle(), view(), &mut ev) {
                outcome = Some(o);
                break;
            }
        }
        let o = outcome.expect("bird should hit the ground");
        assert_eq!(o.result, EndResult::GameOver);
        assert!(ev.contains(&GameEvent::Death));
    }

    #[test]
    fn passing_a_pipe_scores() {
        let mut g = HopperSession::new();
        g.pipes.push(Pipe {
            x: BIRD_X - PIPE_W, // centerline already behind the bird
            gap_y: g.bird_y,
            scored: false,
            phase: 0.0,
            sway: false,
        });
        let mut ev = Vec::new();
        g.frame(0.001, &idle(), view(), &mut ev);
        assert_eq!(g.score, SCORE_PER_PIPE);
        assert!(g.pipes[0].scored);
    }

    #[test]
    fn late_game_pipes_score_less() {
        let mut g = HopperSession::new();
        g.score = LATE_SCORE_AT;
        assert_eq!(g.score_per_pipe(), SCORE_PER_PIPE_LATE);
    }

    #[test]
    fn swaying_gap_stays_clear_of_ground_and_ceiling() {
        let p = Pipe { x: 0.0, gap_y: GROUND_Y, scored: false, phase: 0.0, sway: true };
        for i in 0..100 {
            let gap = p.gap_center(i as f32 * 0.1);
            assert!(gap - PIPE_GAP / 2.0 >= SWAY_CLAMP - 1.0);
            assert!(gap + PIPE_GAP / 2.0 <= GROUND_Y - SWAY_CLAMP + 1.0);
        }
    }

    #[test]
    fn quit_returns_quit_result() {
        let mut g = HopperSession::new();
        let mut ev = Vec::new();
        let input = FrameInput { cancel: true, ..Default::default() };
        let o = g.frame(0.016, &input, view(), &mut ev).expect("quit is immediate");
        assert_eq!(o.result, EndResult::Quit);
    }
}
