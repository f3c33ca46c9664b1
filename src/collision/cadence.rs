//! Fixed-rate gating for detector ticks.

/// Accumulator that lets a detector body run at most `hz` times per second.
///
/// Frame time is summed until at least one interval has built up. The body
/// then runs once and the accumulator drops back to zero, so a long frame
/// never produces a burst of catch-up runs.
#[derive(Debug, Clone)]
pub struct FixedRate {
    interval: f64,
    accumulator: f64,
}

impl FixedRate {
    /// Create a gate firing at `hz`. A non-positive rate fires every tick.
    pub fn new(hz: f64) -> Self {
        let interval = if hz > 0.0 && hz.is_finite() { 1.0 / hz } else { 0.0 };
        Self {
            interval,
            accumulator: 0.0,
        }
    }

    /// Seconds between runs.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Add `dt` seconds. Returns `true` when the body should run this tick.
    pub fn tick(&mut self, dt: f64) -> bool {
        self.accumulator += dt.max(0.0);
        if self.accumulator < self.interval {
            return false;
        }
        self.accumulator = 0.0;
        true
    }

    /// Make the next [`FixedRate::tick`] fire regardless of `dt`.
    pub fn prime(&mut self) {
        self.accumulator = self.interval;
    }

    /// Forget any accumulated time.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// What a rate-limited detector did on one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorTick {
    /// Not enough time accumulated. The previous result stays current.
    Skipped,
    /// The body ran and produced the same result as before.
    Unchanged,
    /// The body ran and replaced the result with a different one.
    Changed,
}

impl DetectorTick {
    pub fn ran(self) -> bool {
        !matches!(self, DetectorTick::Skipped)
    }

    pub fn changed(self) -> bool {
        matches!(self, DetectorTick::Changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twenty_hz_gate() {
        let mut gate = FixedRate::new(20.0);
        let fired: Vec<bool> = (0..6).map(|_| gate.tick(0.02)).collect();
        assert_eq!(fired, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn test_reset_to_zero_after_fire() {
        let mut gate = FixedRate::new(20.0);
        assert!(gate.tick(0.5));
        // A long frame does not leave a backlog.
        assert!(!gate.tick(0.01));
        assert!(gate.tick(0.05));
    }

    #[test]
    fn test_prime() {
        let mut gate = FixedRate::new(20.0);
        gate.prime();
        assert!(gate.tick(0.0));
        assert!(!gate.tick(0.0));
    }

    #[test]
    fn test_zero_rate_always_fires() {
        let mut gate = FixedRate::new(0.0);
        assert!(gate.tick(0.0));
        assert!(gate.tick(0.0));
    }
}
