/// The six mini-games behind the cabinet menu.
///
/// Each game is a self-contained session struct driven by the shell loop
/// through the `Minigame` seam: one `frame()` per render frame with the
/// clamped wall-clock delta and the input snapshot, plus a read-only
/// `render()` into the shared canvas. A session produces exactly one
/// `Outcome` and is never ticked again after that.

pub mod duel;
pub mod hopper;
pub mod mason;
pub mod mazer;
pub mod serpent;
pub mod swarm;

pub use crate::ui::canvas::Viewport;

use crate::domain::input::FrameInput;
use crate::ui::canvas::Canvas;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameId {
    Hopper,
    Serpent,
    Mazer,
    Mason,
    Swarm,
    Duel,
}

impl GameId {
    pub const ALL: [GameId; 6] = [
        GameId::Hopper,
        GameId::Serpent,
        GameId::Mazer,
        GameId::Mason,
        GameId::Swarm,
        GameId::Duel,
    ];

    /// Display name, also the high-score file stem.
    pub fn name(self) -> &'static str {
        match self {
            GameId::Hopper => "Hopper",
            GameId::Serpent => "Serpent",
            GameId::Mazer => "Mazer",
            GameId::Mason => "Mason",
            GameId::Swarm => "Swarm",
            GameId::Duel => "Duel",
        }
    }
}

/// How a session ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EndResult {
    /// Player backed out. Score is discarded.
    Quit,
    /// Lost to the game.
    GameOver,
    /// Completed normally (Duel match decided, competition finished).
    Done,
}

#[derive(Clone, Copy, Debug)]
pub struct Outcome {
    pub result: EndResult,
    pub score: u32,
}

/// Feedback cues a game emits during a frame; the shell turns them into
/// sound effects.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    Pickup,
    Flap,
    LineClear(u32),
    Death,
    WaveClear,
    Point,
    Powerup,
}

pub trait Minigame {
    /// Advance the session by one frame. `dt` is already clamped by the
    /// frame clock. Returns the outcome once, on the terminating frame.
    fn frame(
        &mut self,
        dt: f32,
        input: &FrameInput,
        view: Viewport,
        events: &mut Vec<GameEvent>,
    ) -> Option<Outcome>;

    /// Compose the current state into the canvas.
    fn render(&self, canvas: &mut Canvas);
}
