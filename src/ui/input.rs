/// Keyboard state tracker.
///
/// Tracks which keys are currently held, which gives the games both
/// continuous movement (key held) and edge-triggered actions (flap, fire,
/// rotate) out of the same event stream.
///
/// Release events are only honored when the terminal's keyboard
/// enhancement protocol is confirmed; otherwise a hold expires after a
/// short timeout since the last Press/Repeat.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct Keyboard {
    /// Timestamp of the last Press/Repeat for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from released to held during the latest
    /// `drain_events()`. Cleared every frame.
    fresh_presses: Vec<KeyCode>,

    /// Raw events from this frame, for modifier checks.
    raw_events: Vec<KeyEvent>,

    /// True once keyboard enhancement is confirmed working.
    pub honor_release: bool,
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.raw_events.push(key);

                match key.kind {
                    KeyEventKind::Release if self.honor_release => {
                        self.last_active.remove(&key.code);
                    }
                    KeyEventKind::Release => {
                        // Timeout-based expiry handles it below.
                    }
                    _ => {
                        let was_held = self.held_inner(key.code);
                        self.last_active.insert(key.code, Instant::now());
                        if !was_held {
                            self.fresh_presses.push(key.code);
                        }
                    }
                }
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held_inner(code)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Edge trigger: true only on the frame the key went down.
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Letter freshly pressed this frame, if any (initials entry).
    pub fn pressed_letter(&self) -> Option<char> {
        self.fresh_presses.iter().find_map(|code| match code {
            KeyCode::Char(c) if c.is_ascii_alphabetic() => Some(c.to_ascii_uppercase()),
            _ => None,
        })
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    fn held_inner(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}
