/// Timed effect countdown with expiry edge detection.
///
/// Used for the pickup effects (rage, slow-mo, chili blink, ghost freeze).
/// Re-collecting restarts the timer rather than stacking a second instance.

#[derive(Clone, Copy, Debug, Default)]
pub struct EffectTimer {
    remaining: f32,
}

impl EffectTimer {
    pub fn new() -> Self {
        EffectTimer { remaining: 0.0 }
    }

    pub fn started(duration: f32) -> Self {
        EffectTimer { remaining: duration }
    }

    pub fn start(&mut self, duration: f32) {
        self.remaining = duration;
    }

    pub fn active(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Count down by `dt`. Returns true on the frame the timer crosses zero,
    /// so the caller can run expiry cleanup exactly once.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining = (self.remaining - dt).max(0.0);
        self.remaining == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_fires_exactly_once() {
        let mut t = EffectTimer::new();
        t.start(0.1);
        assert!(t.active());
        assert!(!t.tick(0.05));
        assert!(t.tick(0.1), "crossing zero reports expiry");
        assert!(!t.tick(0.1), "already expired, no second edge");
        assert!(!t.active());
    }

    #[test]
    fn restart_extends_running_effect() {
        let mut t = EffectTimer::new();
        t.start(1.0);
        t.tick(0.9);
        t.start(1.0);
        assert!(!t.tick(0.5));
        assert!(t.active());
    }
}
