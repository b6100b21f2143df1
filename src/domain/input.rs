/// Logical per-frame input snapshot.
///
/// Built once per frame from the keyboard and gamepad trackers; the games
/// never touch device state directly. Held fields stay true while the key
/// is down, edge fields fire only on the frame of the initial press.

use super::grid::Dir;

#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    // Held (continuous)
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Second vertical axis (W/S) for the left paddle in two-player games.
    pub alt_up: bool,
    pub alt_down: bool,
    pub fire_held: bool,

    // Edge-triggered
    pub turn: Option<Dir>,
    pub confirm: bool,
    pub cancel: bool,
    pub rotate: bool,
    pub hard_drop: bool,
    pub fire: bool,
    pub pause: bool,
    pub restart: bool,
}

impl FrameInput {
    /// Any confirm-style press (menu navigation, score screens).
    pub fn any_confirm(&self) -> bool {
        self.confirm || self.fire
    }
}
