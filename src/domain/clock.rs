/// Frame timing and tick accumulation.
///
/// Every subsystem that ticks at its own rate (movement, gravity, spawning)
/// owns a `TickAccumulator`. Each frame it is fed the clamped frame delta
/// and drained: one closure call per whole interval contained in the
/// accumulated time. The interval is re-evaluated on every consumption, so
/// a speed change mid-frame (difficulty ramp, slow-mo pickup) takes effect
/// for the remaining ticks of that same frame.

use std::time::Instant;

use rand::Rng;

/// Hard cap on a single frame's delta. A window resize or OS stall can
/// produce a multi-second gap; simulating it would teleport everything.
pub const MAX_FRAME_DT: f32 = 0.05;

/// Floor for any tick interval. An interval of zero would never drain.
pub const MIN_TICK_INTERVAL: f32 = 0.01;

/// Wall-clock frame timer producing clamped deltas.
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        FrameClock { last: Instant::now() }
    }

    /// Seconds since the previous call, clamped to [`MAX_FRAME_DT`].
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt.min(MAX_FRAME_DT)
    }
}

/// Converts continuous time into whole discrete ticks at a variable rate.
#[derive(Clone, Debug, Default)]
pub struct TickAccumulator {
    acc: f32,
}

impl TickAccumulator {
    pub fn new() -> Self {
        TickAccumulator { acc: 0.0 }
    }

    pub fn reset(&mut self) {
        self.acc = 0.0;
    }

    /// Feed frame time in without consuming any ticks yet.
    pub fn add(&mut self, dt: f32) {
        self.acc += dt;
    }

    /// Try to consume one interval (clamped to [`MIN_TICK_INTERVAL`]).
    /// Returns true when a tick is due. Calling in a loop with a freshly
    /// computed interval lets a speed change mid-frame take effect for the
    /// remaining ticks of that same frame.
    pub fn consume(&mut self, interval: f32) -> bool {
        let step = interval.max(MIN_TICK_INTERVAL);
        if self.acc < step {
            return false;
        }
        self.acc -= step;
        true
    }

    /// Like [`consume`](Self::consume) but the interval is drawn uniformly
    /// from `nominal * [1-jitter, 1+jitter]`. Breaks up the visible
    /// lockstep of perfectly periodic ticks.
    pub fn consume_jittered(&mut self, nominal: f32, jitter: f32, rng: &mut impl Rng) -> bool {
        let nominal = nominal.max(MIN_TICK_INTERVAL);
        let step =
            (nominal * rng.random_range(1.0 - jitter..=1.0 + jitter)).max(MIN_TICK_INTERVAL);
        if self.acc < step {
            return false;
        }
        self.acc -= step;
        true
    }

    /// Add `dt` and call `tick` once per elapsed interval.
    /// `interval` is queried before each consumption. Leftover time stays
    /// in the accumulator, always strictly less than the last interval used.
    pub fn drain(&mut self, dt: f32, mut interval: impl FnMut() -> f32, mut tick: impl FnMut()) {
        self.add(dt);
        while self.consume(interval()) {
            tick();
        }
    }

    #[cfg(test)]
    pub fn remainder(&self) -> f32 {
        self.acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_counts_whole_intervals() {
        let mut acc = TickAccumulator::new();
        let mut ticks = 0;
        acc.drain(0.35, || 0.1, || ticks += 1);
        assert_eq!(ticks, 3);
        // Remainder is what's left after subtracting 3 intervals.
        assert!((acc.remainder() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn remainder_invariant_over_many_frames() {
        let mut acc = TickAccumulator::new();
        let dts = [0.016, 0.033, 0.05, 0.007, 0.049, 0.012];
        for &dt in dts.iter().cycle().take(600) {
            acc.drain(dt, || 0.04, || {});
            assert!(acc.remainder() >= 0.0);
            assert!(acc.remainder() < 0.04);
        }
    }

    #[test]
    fn tick_count_per_frame_is_bounded() {
        // Worst case: max frame delta with minimum interval.
        let mut acc = TickAccumulator::new();
        let mut ticks = 0;
        acc.drain(MAX_FRAME_DT, || 0.0, || ticks += 1);
        let cap = (MAX_FRAME_DT / MIN_TICK_INTERVAL).ceil() as u32;
        assert!(ticks <= cap, "{ticks} ticks exceeds cap {cap}");
    }

    #[test]
    fn zero_interval_is_clamped() {
        // A broken interval function must not spin forever.
        let mut acc = TickAccumulator::new();
        let mut ticks = 0;
        acc.drain(0.05, || -1.0, || ticks += 1);
        assert_eq!(ticks, 5);
    }

    #[test]
    fn interval_reevaluated_mid_drain() {
        // Speed doubles after the first tick; the rest of the frame
        // drains at the new rate.
        let mut acc = TickAccumulator::new();
        let mut ticks = 0;
        // Cell lets both closures observe the speed change.
        let current = std::cell::Cell::new(0.2_f32);
        acc.drain(
            0.4,
            || current.get(),
            || {
                ticks += 1;
                current.set(0.1);
            },
        );
        // 0.4 -> one 0.2 tick, then two 0.1 ticks.
        assert_eq!(ticks, 3);
    }

    #[test]
    fn jittered_ticks_respect_bounds() {
        let mut rng = rand::rng();
        let mut acc = TickAccumulator::new();
        let mut ticks = 0u32;
        for _ in 0..200 {
            acc.add(0.033);
            while acc.consume_jittered(0.1, 0.12, &mut rng) {
                ticks += 1;
            }
            assert!(acc.remainder() >= 0.0);
            // Upper bound: the widest interval the jitter can produce.
            assert!(acc.remainder() < 0.1 * 1.12 + 1e-6);
        }
        // 6.6 s at ~10 ticks/s, jitter is zero-mean.
        assert!(ticks >= 55 && ticks <= 80, "unexpected tick count {ticks}");
    }
}
