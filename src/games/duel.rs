/// Duel: two-player paddle match, first to three points. The right paddle
/// rides the arrow keys, the left paddle the alternate vertical axis. The
/// bounce angle comes from where the ball strikes the paddle, the ball
/// speeds up a little on every hit and more after every point, and the
/// serve always goes toward the side that just conceded.
///
/// The match itself is the prize; the session always reports a score of
/// zero and only the win matters.

use crossterm::style::Color;
use rand::rngs::ThreadRng;
use rand::Rng;

use crate::domain::input::FrameInput;
use crate::ui::canvas::{Canvas, CELL_W, MAP_ROW};

use super::{EndResult, GameEvent, Minigame, Outcome, Viewport};

const VIRT_W: f32 = 1600.0;
const VIRT_H: f32 = 900.0;

const WIN_SCORE: u32 = 3;

const PADDLE_HALF_W: f32 = 7.0;
const PADDLE_HALF_H: f32 = 55.0;
const PADDLE_SPEED: f32 = 520.0;
const LEFT_X: f32 = 47.0;
const RIGHT_X: f32 = VIRT_W - 47.0;

const BALL_HALF: f32 = 7.0;
const BASE_BALL_SPEED: f32 = 360.0;
/// Per-point serve speed growth.
const SPEED_GROWTH: f32 = 1.12;
/// Per-paddle-hit speed growth.
const SPEED_GROWTH_HIT: f32 = 1.02;
const MAX_BALL_SPEED: f32 = 1100.0;

const MAX_BOUNCE_ANGLE: f32 = std::f32::consts::FRAC_PI_3; // 60 degrees
const SERVE_ANGLE: f32 = 0.60;
const MIN_SERVE_VY: f32 = 0.15;

pub struct DuelSession {
    left_y: f32,
    right_y: f32,
    ball_x: f32,
    ball_y: f32,
    ball_vx: f32,
    ball_vy: f32,
    serve_speed: f32,
    left_score: u32,
    right_score: u32,
    paused: bool,
    over: bool,
    rng: ThreadRng,
}

impl DuelSession {
    pub fn new() -> Self {
        let mut session = DuelSession {
            left_y: VIRT_H / 2.0,
            right_y: VIRT_H / 2.0,
            ball_x: VIRT_W / 2.0,
            ball_y: VIRT_H / 2.0,
            ball_vx: 0.0,
            ball_vy: 0.0,
            serve_speed: BASE_BALL_SPEED,
            left_score: 0,
            right_score: 0,
            paused: false,
            over: false,
            rng: rand::rng(),
        };
        let dir = if session.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        session.serve(dir);
        session
    }

    /// Center the ball and launch it toward `dir` at a mostly horizontal,
    /// slightly random angle. A near-flat serve is nudged off axis.
    fn serve(&mut self, dir: f32) {
        self.ball_x = VIRT_W / 2.0;
        self.ball_y = VIRT_H / 2.0;

        let ang = self.rng.random_range(-SERVE_ANGLE..=SERVE_ANGLE);
        let mut vx = ang.cos() * dir;
        let mut vy = ang.sin();
        if vy.abs() < MIN_SERVE_VY {
            vy = if self.rng.random_bool(0.5) { MIN_SERVE_VY } else { -MIN_SERVE_VY };
        }
        let len = vx.hypot(vy);
        vx /= len;
        vy /= len;
        self.ball_vx = vx * self.serve_speed;
        self.ball_vy = vy * self.serve_speed;
    }

    /// Reflect off a paddle. The exit angle follows the strike offset from
    /// the paddle center, up to 60 degrees off horizontal.
    fn bounce(&mut self, paddle_y: f32, toward_right: bool) {
        let rel = ((self.ball_y - paddle_y) / PADDLE_HALF_H).clamp(-1.0, 1.0);
        let angle = rel * MAX_BOUNCE_ANGLE;
        let speed = (self.ball_vx.hypot(self.ball_vy) * SPEED_GROWTH_HIT).min(MAX_BALL_SPEED);
        let dir = if toward_right { 1.0 } else { -1.0 };
        self.ball_vx = angle.cos() * speed * dir;
        self.ball_vy = angle.sin() * speed;
    }

    fn point_scored(&mut self, events: &mut Vec<GameEvent>, serving_dir: f32) {
        events.push(GameEvent::Point);
        self.serve_speed = (self.serve_speed * SPEED_GROWTH).min(MAX_BALL_SPEED);
        if self.left_score >= WIN_SCORE || self.right_score >= WIN_SCORE {
            self.over = true;
            events.push(GameEvent::WaveClear);
        } else {
            self.serve(serving_dir);
        }
    }

    fn rematch(&mut self) {
        self.left_score = 0;
        self.right_score = 0;
        self.serve_speed = BASE_BALL_SPEED;
        self.over = false;
        let dir = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        self.serve(dir);
    }

    fn simulate(&mut self, dt: f32, input: &FrameInput, events: &mut Vec<GameEvent>) {
        let lm = axis(input.alt_up, input.alt_down);
        let rm = axis(input.up, input.down);
        self.left_y = (self.left_y + lm * PADDLE_SPEED * dt)
            .clamp(PADDLE_HALF_H, VIRT_H - PADDLE_HALF_H);
        self.right_y = (self.right_y + rm * PADDLE_SPEED * dt)
            .clamp(PADDLE_HALF_H, VIRT_H - PADDLE_HALF_H);

        self.ball_x += self.ball_vx * dt;
        self.ball_y += self.ball_vy * dt;

        if self.ball_y - BALL_HALF <= 0.0 {
            self.ball_y = BALL_HALF;
            self.ball_vy = self.ball_vy.abs();
        } else if self.ball_y + BALL_HALF >= VIRT_H {
            self.ball_y = VIRT_H - BALL_HALF;
            self.ball_vy = -self.ball_vy.abs();
        }

        if self.ball_vx < 0.0 && hits_paddle(self.ball_x, self.ball_y, LEFT_X, self.left_y) {
            self.ball_x = LEFT_X + PADDLE_HALF_W + BALL_HALF;
            self.bounce(self.left_y, true);
        }
        if self.ball_vx > 0.0 && hits_paddle(self.ball_x, self.ball_y, RIGHT_X, self.right_y) {
            self.ball_x = RIGHT_X - PADDLE_HALF_W - BALL_HALF;
            self.bounce(self.right_y, false);
        }

        if self.ball_x + BALL_HALF < 0.0 {
            self.right_score += 1;
            self.point_scored(events, -1.0);
        } else if self.ball_x - BALL_HALF > VIRT_W {
            self.left_score += 1;
            self.point_scored(events, 1.0);
        }
    }
}

fn axis(up: bool, down: bool) -> f32 {
    match (up, down) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

fn hits_paddle(bx: f32, by: f32, px: f32, py: f32) -> bool {
    (bx - px).abs() <= BALL_HALF + PADDLE_HALF_W && (by - py).abs() <= BALL_HALF + PADDLE_HALF_H
}

impl Minigame for DuelSession {
    fn frame(
        &mut self,
        dt: f32,
        input: &FrameInput,
        _view: Viewport,
        events: &mut Vec<GameEvent>,
    ) -> Option<Outcome> {
        if input.cancel {
            return Some(Outcome { result: EndResult::Quit, score: 0 });
        }

        if self.over {
            if input.restart {
                self.rematch();
            } else if input.any_confirm() {
                return Some(Outcome { result: EndResult::Done, score: 0 });
            }
            return None;
        }

        if input.pause {
            self.paused = !self.paused;
        }
        if self.paused {
            return None;
        }

        self.simulate(dt, input, events);
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
            " DUEL   {}  -  {}   First to {}   Speed: {:.0}",
            self.left_score,
            self.right_score,
            WIN_SCORE,
            self.ball_vx.hypot(self.ball_vy)
        ));

        let mid = Color::Rgb { r: 60, g: 60, b: 80 };
        let mid_x = (cols / 2) as i32;
        for gy in (0..rows as i32).step_by(2) {
            canvas.game_block(mid_x, gy, '┊', mid, Color::Reset);
        }

        let fg = Color::Rgb { r: 235, g: 235, b: 255 };
        let half_cells = (sy(PADDLE_HALF_H * 2.0) / 2).max(1);
        for (px, py) in [(LEFT_X, self.left_y), (RIGHT_X, self.right_y)] {
            let gx = sx(px);
            let gy = sy(py);
            for d in -half_cells..=half_cells {
                canvas.game_block(gx, gy + d, '█', fg, Color::Reset);
            }
        }

        canvas.game_cell(sx(self.ball_x), sy(self.ball_y), '(', ')', Color::Rgb { r: 255, g: 230, b: 140 }, Color::Reset);

        if self.paused && !self.over {
            canvas.game_text(mid_x - 2, (rows / 2) as i32, "PAUSED", Color::Rgb { r: 255, g: 230, b: 140 }, Color::Reset);
        }
        if self.over {
            let banner = if self.left_score > self.right_score {
                "LEFT WINS!"
            } else {
                "RIGHT WINS!"
            };
            let win = Color::Rgb { r: 120, g: 240, b: 170 };
            canvas.game_text(mid_x - banner.len() as i32 / 2, (rows / 2) as i32 - 1, banner, win, Color::Reset);
            canvas.game_text(mid_x - 8, (rows / 2) as i32 + 1, "R rematch  Enter done", mid, Color::Reset);
        }
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
    fn serve_is_mostly_horizontal_and_never_flat() {
        let mut g = DuelSession::new();
        for _ in 0..50 {
            g.serve(1.0);
            let speed = g.ball_vx.hypot(g.ball_vy);
            assert!((speed - g.serve_speed).abs() < 1.0);
            assert!(g.ball_vx > 0.0, "serve goes the requested way");
            assert!(g.ball_vy.abs() >= MIN_SERVE_VY * speed * 0.9, "no dead-flat serves");
            assert!(g.ball_vx.abs() > g.ball_vy.abs(), "horizontal bias");
        }
    }

    #[test]
    fn ceiling_bounce_reflects_downward() {
        let mut g = DuelSession::new();
        g.ball_y = BALL_HALF + 1.0;
        g.ball_vx = 100.0;
        g.ball_vy = -300.0;
        let mut ev = Vec::new();
        g.frame(0.016, &idle(), view(), &mut ev);
        assert!(g.ball_vy > 0.0);
    }

    #[test]
    fn paddle_hit_reflects_and_speeds_up() {
        let mut g = DuelSession::new();
        g.ball_x = RIGHT_X - PADDLE_HALF_W - BALL_HALF - 1.0;
        g.ball_y = g.right_y; // dead center strike
        g.ball_vx = 400.0;
        g.ball_vy = 0.0;
        let mut ev = Vec::new();
        g.frame(0.016, &idle(), view(), &mut ev);
        assert!(g.ball_vx < 0.0, "reflected off the right paddle");
        let speed = g.ball_vx.hypot(g.ball_vy);
        assert!(speed > 400.0 && speed <= 400.0 * SPEED_GROWTH_HIT + 1.0);
    }

    #[test]
    fn off_center_hit_angles_the_ball() {
        let mut g = DuelSession::new();
        g.ball_y = g.right_y + PADDLE_HALF_H * 0.9;
        g.ball_vx = 400.0;
        g.ball_vy = 0.0;
        g.bounce(g.right_y, false);
        assert!(g.ball_vy > 0.0, "low strike deflects downward");
    }

    #[test]
    fn conceding_a_point_speeds_up_the_serve() {
        let mut g = DuelSession::new();
        g.ball_x = -BALL_HALF - 10.0;
        g.ball_vx = -100.0;
        g.ball_vy = 0.0;
        let mut ev = Vec::new();
        g.frame(0.001, &idle(), view(), &mut ev);
        assert_eq!(g.right_score, 1);
        assert!(ev.contains(&GameEvent::Point));
        assert!((g.serve_speed - BASE_BALL_SPEED * SPEED_GROWTH).abs() < 0.5);
        // Serve goes back toward the side that conceded.
        assert!(g.ball_vx < 0.0);
    }

    #[test]
    fn third_point_decides_the_match() {
        let mut g = DuelSession::new();
        g.right_score = 2;
        g.ball_x = -BALL_HALF - 10.0;
        g.ball_vx = -100.0;
        let mut ev = Vec::new();
        assert!(g.frame(0.001, &idle(), view(), &mut ev).is_none());
        assert!(g.over);

        let confirm = FrameInput { confirm: true, ..Default::default() };
        let out = g.frame(0.016, &confirm, view(), &mut ev).expect("match decided");
        assert_eq!(out.result, EndResult::Done);
        assert_eq!(out.score, 0);
    }

    #[test]
    fn rematch_resets_the_match() {
        let mut g = DuelSession::new();
        g.over = true;
        g.left_score = 3;
        g.serve_speed = 700.0;
        let mut ev = Vec::new();
        let restart = FrameInput { restart: true, ..Default::default() };
        g.frame(0.016, &restart, view(), &mut ev);
        assert!(!g.over);
        assert_eq!(g.left_score, 0);
        assert!((g.serve_speed - BASE_BALL_SPEED).abs() < f32::EPSILON);
    }

    #[test]
    fn pause_freezes_the_ball() {
        let mut g = DuelSession::new();
        let mut ev = Vec::new();
        let pause = FrameInput { pause: true, ..Default::default() };
        g.frame(0.016, &pause, view(), &mut ev);
        let (x, y) = (g.ball_x, g.ball_y);
        for _ in 0..10 {
            g.frame(0.016, &idle(), view(), &mut ev);
        }
        assert_eq!((x, y), (g.ball_x, g.ball_y));
    }

    #[test]
    fn quit_returns_quit_result() {
        let mut g = DuelSession::new();
        let mut ev = Vec::new();
        let input = FrameInput { cancel: true, ..Default::default() };
        let o = g.frame(0.016, &input, view(), &mut ev).expect("quit is immediate");
        assert_eq!(o.result, EndResult::Quit);
    }
}
