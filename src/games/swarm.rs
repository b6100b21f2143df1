/// Swarm: shoot-em-up against a 10x5 marching formation. The swarm steps
/// sideways, drops a row and reverses at the walls, and speeds up every
/// wave. Killed enemies sometimes drop an ability pickup; abilities stack
/// across waves and never reset. Clearing a wave pays a bonus and heals
/// one hit point.
///
/// Like Hopper, the simulation runs in a fixed virtual space and is
/// scaled to terminal cells only at render time.

use crossterm::style::Color;
use rand::rngs::ThreadRng;
use rand::Rng;

use crate::config::SwarmTuning;
use crate::domain::input::FrameInput;
use crate::ui::canvas::{Canvas, CELL_W, MAP_ROW};

use super::{EndResult, GameEvent, Minigame, Outcome, Viewport};

const VIRT_W: f32 = 1600.0;
const VIRT_H: f32 = 900.0;

const PLAYER_SPEED: f32 = 520.0;
const PLAYER_Y: f32 = VIRT_H - 60.0;
const PLAYER_HP: i32 = 5;
const PLAYER_HALF_W: f32 = 36.0;
const PLAYER_HALF_H: f32 = 20.0;
const PLAYER_PAD: f32 = 40.0;

const BULLET_SPEED: f32 = 920.0;
const ENEMY_BULLET_SPEED: f32 = 520.0;
const BULLET_HALF_W: f32 = 4.0;
const BULLET_HALF_H: f32 = 8.0;

const FORM_COLS: i32 = 10;
const FORM_ROWS: i32 = 5;
const FORM_ORIGIN_X: f32 = 120.0;
const FORM_ORIGIN_Y: f32 = 90.0;
const FORM_SPACING_X: f32 = 70.0;
const FORM_SPACING_Y: f32 = 56.0;
const ENEMY_HALF_W: f32 = 26.0;
const ENEMY_HALF_H: f32 = 20.0;
const STEP_DOWN: f32 = 22.0;
const BASE_MARCH: f32 = 70.0;
const MARCH_PER_WAVE: f32 = 14.0;
const WALL_MARGIN: f32 = 30.0;
/// The swarm wins when its lowest edge crosses this line.
const LOSS_LINE: f32 = PLAYER_Y - 40.0;

const FIRE_CD_START: f32 = 0.28;
const FIRE_CD_MIN: f32 = 0.08;
const FIRE_CD_STEP: f32 = 0.03;
const MAX_BULLETS_CAP: u32 = 9;
const HOMING_STEER: f32 = 10.0;

const POWERUP_DROP_CHANCE: f64 = 0.14;
const POWERUP_FALL_SPEED: f32 = 180.0;
const POWERUP_LIFE: f32 = 14.0;

const WAVE_BONUS_BASE: u32 = 25;
const WAVE_BONUS_PER_WAVE: u32 = 10;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum EnemyKind {
    Green,
    Blue,
    Red,
}

impl EnemyKind {
    fn hp(self) -> i32 {
        match self {
            EnemyKind::Green => 5,
            EnemyKind::Blue => 10,
            EnemyKind::Red => 50,
        }
    }

    fn points(self) -> u32 {
        match self {
            EnemyKind::Green => 10,
            EnemyKind::Blue => 18,
            EnemyKind::Red => 70,
        }
    }

    fn color(self) -> Color {
        match self {
            EnemyKind::Green => Color::Rgb { r: 110, g: 255, b: 140 },
            EnemyKind::Blue => Color::Rgb { r: 120, g: 170, b: 255 },
            EnemyKind::Red => Color::Rgb { r: 255, g: 90, b: 110 },
        }
    }

    /// Row assignment: the top row hardens to red from wave 3 on, the two
    /// top rows are blue, the rest green.
    fn for_row(row: i32, wave: u32) -> EnemyKind {
        if row == 0 && wave >= 3 {
            EnemyKind::Red
        } else if row <= 1 {
            EnemyKind::Blue
        } else {
            EnemyKind::Green
        }
    }
}

struct Enemy {
    x: f32,
    y: f32,
    hp: i32,
    kind: EnemyKind,
}

struct ShipBullet {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    damage: i32,
    homing: bool,
}

struct EnemyBullet {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum AbilityKind {
    Shots,
    Damage,
    Rate,
    Homing,
}

struct FallingPowerup {
    x: f32,
    y: f32,
    kind: AbilityKind,
    life: f32,
}

pub struct SwarmSession {
    tuning: SwarmTuning,
    player_x: f32,
    player_hp: i32,
    enemies: Vec<Enemy>,
    march_dir: f32,
    bullets: Vec<ShipBullet>,
    enemy_bullets: Vec<EnemyBullet>,
    powerups: Vec<FallingPowerup>,
    fire_timer: f32,
    max_bullets: u32,
    damage: i32,
    fire_cd: f32,
    homing: bool,
    wave: u32,
    score: u32,
    rng: ThreadRng,
}

impl SwarmSession {
    pub fn new(tuning: SwarmTuning) -> Self {
        let mut session = SwarmSession {
            tuning,
            player_x: VIRT_W * 0.5,
            player_hp: PLAYER_HP,
            enemies: Vec::new(),
            march_dir: 1.0,
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            powerups: Vec::new(),
            fire_timer: 0.0,
            max_bullets: 1,
            damage: 1,
            fire_cd: FIRE_CD_START,
            homing: false,
            wave: 1,
            score: 0,
            rng: rand::rng(),
        };
        session.spawn_wave();
        session
    }

    fn spawn_wave(&mut self) {
        self.enemies.clear();
        for row in 0..FORM_ROWS {
            for col in 0..FORM_COLS {
                let kind = EnemyKind::for_row(row, self.wave);
                self.enemies.push(Enemy {
                    x: FORM_ORIGIN_X + col as f32 * FORM_SPACING_X,
                    y: FORM_ORIGIN_Y + row as f32 * FORM_SPACING_Y,
                    hp: kind.hp(),
                    kind,
                });
            }
        }
        self.march_dir = 1.0;
    }

    fn march_speed(&self) -> f32 {
        BASE_MARCH + MARCH_PER_WAVE * (self.wave - 1) as f32
    }

    fn try_fire(&mut self) {
        if self.fire_timer > 0.0 {
            return;
        }
        // The normal-bullet cap excludes the homing pair.
        let active = self.bullets.iter().filter(|b| !b.homing).count() as u32;
        if active >= self.max_bullets {
            return;
        }
        let bx = self.player_x;
        let by = PLAYER_Y - PLAYER_HALF_H - 6.0;
        self.bullets.push(ShipBullet {
            x: bx,
            y: by,
            vx: 0.0,
            vy: -BULLET_SPEED,
            damage: self.damage,
            homing: false,
        });
        if self.homing {
            for side in [-1.0f32, 1.0] {
                self.bullets.push(ShipBullet {
                    x: bx + side * 8.0,
                    y: by,
                    vx: side * 120.0,
                    vy: -BULLET_SPEED * 0.92,
                    damage: self.damage,
                    homing: true,
                });
            }
        }
        self.fire_timer = self.fire_cd;
    }

    /// One bottom-most enemy per column may fire; the per-frame chance
    /// rises with the wave and as the formation thins out.
    fn enemy_fire(&mut self, dt: f32) {
        if self.enemies.is_empty() {
            return;
        }
        let remain = self.enemies.len() as f32;
        let total = (FORM_COLS * FORM_ROWS) as f32;
        let base = self.tuning.shoot_base + self.tuning.shoot_per_wave * (self.wave - 1) as f32;
        let intensity =
            (base * dt * 60.0 * (1.2 + (total - remain) / 25.0)).clamp(0.05, 0.95);
        if !self.rng.random_bool((intensity * 0.15) as f64) {
            return;
        }

        let mut shooters: Vec<usize> = Vec::new();
        let mut bottom: std::collections::HashMap<i32, usize> = std::collections::HashMap::new();
        for (i, e) in self.enemies.iter().enumerate() {
            let col = ((e.x - FORM_ORIGIN_X + FORM_SPACING_X / 2.0) / FORM_SPACING_X) as i32;
            match bottom.get(&col) {
                Some(&j) if self.enemies[j].y >= e.y => {}
                _ => {
                    bottom.insert(col, i);
                }
            }
        }
        shooters.extend(bottom.values());
        if let Some(&i) = shooters.get(self.rng.random_range(0..shooters.len())) {
            let e = &self.enemies[i];
            self.enemy_bullets.push(EnemyBullet { x: e.x, y: e.y + ENEMY_HALF_H + 8.0 });
        }
    }

    fn maybe_drop_powerup(&mut self, x: f32, y: f32) {
        if !self.rng.random_bool(POWERUP_DROP_CHANCE) {
            return;
        }
        // Pickups already at cap are down-weighted, not removed.
        let weighted = [
            (AbilityKind::Damage, 1.0f32),
            (AbilityKind::Rate, 1.0),
            (AbilityKind::Homing, if self.homing { 0.25 } else { 0.9 }),
            (AbilityKind::Shots, if self.max_bullets >= MAX_BULLETS_CAP { 0.2 } else { 1.0 }),
        ];
        let total: f32 = weighted.iter().map(|(_, w)| w).sum();
        let mut roll = self.rng.random_range(0.0..total);
        // Last entry absorbs float residue.
        let mut kind = weighted[weighted.len() - 1].0;
        for &(k, w) in &weighted {
            if roll < w {
                kind = k;
                break;
            }
            roll -= w;
        }
        self.powerups.push(FallingPowerup { x, y, kind, life: POWERUP_LIFE });
    }

    fn apply_powerup(&mut self, kind: AbilityKind) {
        match kind {
            AbilityKind::Shots => {
                if self.max_bullets < MAX_BULLETS_CAP {
                    self.max_bullets += 1;
                    self.score += 5;
                }
            }
            AbilityKind::Damage => {
                self.damage += 1;
                self.score += 6;
            }
            AbilityKind::Rate => {
                self.fire_cd = (self.fire_cd - FIRE_CD_STEP).max(FIRE_CD_MIN);
                self.score += 6;
            }
            AbilityKind::Homing => {
                self.homing = true;
                self.score += 8;
            }
        }
    }

    fn steer_homing(bullet: &mut ShipBullet, enemies: &[Enemy], dt: f32) {
        let target = enemies.iter().min_by(|a, b| {
            let da = (a.x - bullet.x).powi(2) + (a.y - bullet.y).powi(2);
            let db = (b.x - bullet.x).powi(2) + (b.y - bullet.y).powi(2);
            da.total_cmp(&db)
        });
        let Some(t) = target else { return };
        let dx = t.x - bullet.x;
        let dy = t.y - bullet.y;
        let dist = dx.hypot(dy).max(1e-6);
        let speed = bullet.vx.hypot(bullet.vy).max(1e-6);
        let steer = (HOMING_STEER * dt).min(1.0);
        let nx = (bullet.vx / speed) * (1.0 - steer) + (dx / dist) * steer;
        let ny = (bullet.vy / speed) * (1.0 - steer) + (dy / dist) * steer;
        let nd = nx.hypot(ny).max(1e-6);
        bullet.vx = nx / nd * speed;
        bullet.vy = ny / nd * speed;
    }

    fn wave_cleared(&mut self, events: &mut Vec<GameEvent>) {
        self.score += WAVE_BONUS_BASE + WAVE_BONUS_PER_WAVE * (self.wave - 1);
        self.wave += 1;
        self.player_hp = (self.player_hp + 1).min(PLAYER_HP);
        self.bullets.clear();
        self.enemy_bullets.clear();
        self.powerups.clear();
        self.spawn_wave();
        events.push(GameEvent::WaveClear);
    }
}

fn overlap(ax: f32, ay: f32, ahw: f32, ahh: f32, bx: f32, by: f32, bhw: f32, bhh: f32) -> bool {
    (ax - bx).abs() <= ahw + bhw && (ay - by).abs() <= ahh + bhh
}

impl Minigame for SwarmSession {
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

        let dx = match (input.left, input.right) {
            (true, false) => -PLAYER_SPEED,
            (false, true) => PLAYER_SPEED,
            _ => 0.0,
        };
        self.player_x = (self.player_x + dx * dt).clamp(PLAYER_PAD, VIRT_W - PLAYER_PAD);

        self.fire_timer = (self.fire_timer - dt).max(0.0);
        if input.fire || input.fire_held {
            self.try_fire();
        }

        // Formation march, one shared bound check for the whole swarm.
        if !self.enemies.is_empty() {
            let minx = self
                .enemies
                .iter()
                .map(|e| e.x - ENEMY_HALF_W)
                .fold(f32::INFINITY, f32::min);
            let maxx = self
                .enemies
                .iter()
                .map(|e| e.x + ENEMY_HALF_W)
                .fold(f32::NEG_INFINITY, f32::max);
            let step = self.march_dir * self.march_speed() * dt;
            if maxx + step > VIRT_W - WALL_MARGIN || minx + step < WALL_MARGIN {
                self.march_dir = -self.march_dir;
                for e in &mut self.enemies {
                    e.y += STEP_DOWN;
                }
            } else {
                for e in &mut self.enemies {
                    e.x += step;
                }
            }

            let lowest = self
                .enemies
                .iter()
                .map(|e| e.y + ENEMY_HALF_H)
                .fold(f32::NEG_INFINITY, f32::max);
            if lowest >= LOSS_LINE {
                events.push(GameEvent::Death);
                return Some(Outcome { result: EndResult::GameOver, score: self.score });
            }
        }

        self.enemy_fire(dt);

        for b in &mut self.bullets {
            if b.homing {
                Self::steer_homing(b, &self.enemies, dt);
            }
            b.x += b.vx * dt;
            b.y += b.vy * dt;
        }
        self.bullets
            .retain(|b| b.y > -50.0 && b.y < VIRT_H + 50.0 && b.x > -60.0 && b.x < VIRT_W + 60.0);
        for b in &mut self.enemy_bullets {
            b.y += ENEMY_BULLET_SPEED * dt;
        }
        self.enemy_bullets.retain(|b| b.y < VIRT_H + 50.0);

        for p in &mut self.powerups {
            p.y += POWERUP_FALL_SPEED * dt;
            p.life -= dt;
        }
        self.powerups.retain(|p| p.life > 0.0 && p.y < VIRT_H + 40.0);

        // Ship bullets vs enemies: one hit consumes the bullet.
        let mut drops: Vec<(f32, f32)> = Vec::new();
        let mut i = 0;
        while i < self.bullets.len() {
            let b = &self.bullets[i];
            let hit = self.enemies.iter().position(|e| {
                overlap(b.x, b.y, BULLET_HALF_W, BULLET_HALF_H, e.x, e.y, ENEMY_HALF_W, ENEMY_HALF_H)
            });
            if let Some(j) = hit {
                let damage = self.bullets[i].damage;
                self.bullets.swap_remove(i);
                let e = &mut self.enemies[j];
                e.hp -= damage;
                if e.hp <= 0 {
                    self.score += e.kind.points();
                    let (ex, ey) = (e.x, e.y);
                    self.enemies.swap_remove(j);
                    drops.push((ex, ey));
                } else {
                    // Chip point for a non-killing hit.
                    self.score += 1;
                }
            } else {
                i += 1;
            }
        }
        for (x, y) in drops {
            self.maybe_drop_powerup(x, y);
        }

        // Enemy bullets vs player.
        let px = self.player_x;
        let mut hits = 0;
        self.enemy_bullets.retain(|b| {
            if overlap(b.x, b.y, BULLET_HALF_W, BULLET_HALF_H, px, PLAYER_Y, PLAYER_HALF_W, PLAYER_HALF_H)
            {
                hits += 1;
                false
            } else {
                true
            }
        });
        if hits > 0 {
            self.player_hp -= hits;
            if self.player_hp <= 0 {
                events.push(GameEvent::Death);
                return Some(Outcome { result: EndResult::GameOver, score: self.score });
            }
        }

        let mut collected = Vec::new();
        self.powerups.retain(|p| {
            if overlap(p.x, p.y, 14.0, 14.0, px, PLAYER_Y, PLAYER_HALF_W, PLAYER_HALF_H) {
                collected.push(p.kind);
                false
            } else {
                true
            }
        });
        for kind in collected {
            self.apply_powerup(kind);
            events.push(GameEvent::Powerup);
        }

        if self.enemies.is_empty() {
            self.wave_cleared(events);
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

        let mut hud = format!(
            " SWARM   Score: {:<6}  Wave: {:<3}  HP: {}  Shots: {}/{}  Dmg: {}  Rate: {:.2}s",
            self.score, self.wave, self.player_hp, self.max_bullets, MAX_BULLETS_CAP,
            self.damage, self.fire_cd
        );
        if self.homing {
            hud.push_str("  +HOMING");
        }
        canvas.hud(&hud);

        for e in &self.enemies {
            let fg = e.kind.color();
            let hurt = e.hp < e.kind.hp();
            let glyph = if hurt { 'n' } else { 'M' };
            canvas.game_cell(sx(e.x), sy(e.y), '<', '>', fg, Color::Reset);
            canvas.game_block(sx(e.x), sy(e.y) - 1, glyph, fg, Color::Reset);
        }

        let cyan = Color::Rgb { r: 140, g: 240, b: 255 };
        let red = Color::Rgb { r: 255, g: 90, b: 90 };
        for b in &self.bullets {
            let fg = if b.homing { red } else { cyan };
            canvas.game_block(sx(b.x), sy(b.y), '|', fg, Color::Reset);
        }
        for b in &self.enemy_bullets {
            canvas.game_block(sx(b.x), sy(b.y), '!', Color::Rgb { r: 255, g: 80, b: 80 }, Color::Reset);
        }

        for p in &self.powerups {
            let (ch, fg) = match p.kind {
                AbilityKind::Shots => ('S', Color::Rgb { r: 255, g: 230, b: 120 }),
                AbilityKind::Damage => ('D', Color::Rgb { r: 255, g: 140, b: 140 }),
                AbilityKind::Rate => ('R', Color::Rgb { r: 170, g: 255, b: 170 }),
                AbilityKind::Homing => ('H', Color::Rgb { r: 255, g: 100, b: 100 }),
            };
            canvas.game_cell(sx(p.x), sy(p.y), '[', ']', fg, Color::Reset);
            canvas.game_block(sx(p.x), sy(p.y), ch, Color::Rgb { r: 10, g: 10, b: 18 }, fg);
        }

        let ship_fg = Color::Rgb { r: 220, g: 220, b: 255 };
        canvas.game_cell(sx(self.player_x), sy(PLAYER_Y), '/', '\\', ship_fg, Color::Reset);
        canvas.game_block(sx(self.player_x), sy(PLAYER_Y) - 1, 'A', ship_fg, Color::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CabinetConfig;

    fn session() -> SwarmSession {
        SwarmSession::new(CabinetConfig::defaults().swarm)
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn view() -> Viewport {
        Viewport { cols: 60, rows: 30 }
    }

    #[test]
    fn first_wave_has_no_red_enemies() {
        let g = session();
        assert_eq!(g.enemies.len(), 50);
        assert!(g.enemies.iter().all(|e| e.kind != EnemyKind::Red));
        assert_eq!(
            g.enemies.iter().filter(|e| e.kind == EnemyKind::Blue).count(),
            20
        );
    }

    #[test]
    fn wave_three_hardens_the_top_row() {
        let mut g = session();
        g.wave = 3;
        g.spawn_wave();
        assert_eq!(
            g.enemies.iter().filter(|e| e.kind == EnemyKind::Red).count(),
            10
        );
    }

    #[test]
    fn firing_respects_cooldown_and_cap() {
        let mut g = session();
        g.try_fire();
        assert_eq!(g.bullets.len(), 1);
        g.try_fire();
        assert_eq!(g.bullets.len(), 1, "cooldown blocks the second shot");
        g.fire_timer = 0.0;
        g.try_fire();
        assert_eq!(g.bullets.len(), 1, "cap of one normal bullet in flight");
    }

    #[test]
    fn homing_pickup_adds_the_side_pair() {
        let mut g = session();
        g.apply_powerup(AbilityKind::Homing);
        assert!(g.homing);
        g.fire_timer = 0.0;
        g.try_fire();
        assert_eq!(g.bullets.len(), 3);
        assert_eq!(g.bullets.iter().filter(|b| b.homing).count(), 2);
    }

    #[test]
    fn killing_an_enemy_scores_its_value() {
        let mut g = session();
        g.enemies.clear();
        g.enemies.push(Enemy { x: 800.0, y: 400.0, hp: 1, kind: EnemyKind::Green });
        g.bullets.push(ShipBullet {
            x: 800.0,
            y: 404.0,
            vx: 0.0,
            vy: -BULLET_SPEED,
            damage: 1,
            homing: false,
        });
        let mut ev = Vec::new();
        g.frame(0.001, &idle(), view(), &mut ev);
        assert!(g.score >= EnemyKind::Green.points(), "kill pays {}", g.score);
    }

    #[test]
    fn clearing_the_swarm_starts_the_next_wave() {
        let mut g = session();
        g.enemies.clear();
        g.player_hp = 3;
        let mut ev = Vec::new();
        g.frame(0.016, &idle(), view(), &mut ev);
        assert_eq!(g.wave, 2);
        assert_eq!(g.score, WAVE_BONUS_BASE);
        assert_eq!(g.player_hp, 4, "wave clear heals one point");
        assert_eq!(g.enemies.len(), 50);
        assert!(ev.contains(&GameEvent::WaveClear));
    }

    #[test]
    fn swarm_reaching_the_player_line_ends_the_game() {
        let mut g = session();
        for e in &mut g.enemies {
            e.y += LOSS_LINE;
        }
        let mut ev = Vec::new();
        let out = g.frame(0.016, &idle(), view(), &mut ev).expect("loss line crossed");
        assert_eq!(out.result, EndResult::GameOver);
        assert!(ev.contains(&GameEvent::Death));
    }

    #[test]
    fn out_of_hp_ends_the_game() {
        let mut g = session();
        g.player_hp = 1;
        g.enemy_bullets.push(EnemyBullet { x: g.player_x, y: PLAYER_Y });
        let mut ev = Vec::new();
        let out = g.frame(0.001, &idle(), view(), &mut ev).expect("last hit point gone");
        assert_eq!(out.result, EndResult::GameOver);
    }

    #[test]
    fn homing_bullet_turns_toward_the_target() {
        let enemies = vec![Enemy { x: 1200.0, y: 200.0, hp: 5, kind: EnemyKind::Green }];
        let mut b = ShipBullet {
            x: 400.0,
            y: 800.0,
            vx: 0.0,
            vy: -BULLET_SPEED,
            damage: 1,
            homing: true,
        };
        let speed0 = b.vx.hypot(b.vy);
        SwarmSession::steer_homing(&mut b, &enemies, 0.016);
        assert!(b.vx > 0.0, "steered toward an enemy on the right");
        let speed1 = b.vx.hypot(b.vy);
        assert!((speed0 - speed1).abs() < 1.0, "steering preserves speed");
    }
}
