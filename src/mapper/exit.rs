//! Exit combo detection.
//!
//! Holding both configured exit keys for the configured duration without
//! interruption terminates a mapping run. Any release resets the timer
//! completely, there is no partial credit.

use std::time::{Duration, Instant};

/// Tracks how long the exit combo has been held continuously.
///
/// `Idle` until both keys are down, then `Holding` with the start instant.
/// The fired latch keeps a single continuous hold from signalling more than
/// once even though the loop keeps polling.
#[derive(Debug, Default)]
pub struct ExitDetector {
    holding_since: Option<Instant>,
    fired: bool,
}

impl ExitDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// One cycle of combo evaluation. Returns true exactly once per
    /// continuous hold that reaches `hold`.
    pub fn poll(&mut self, combo_down: bool, hold: Duration) -> bool {
        if !combo_down {
            self.holding_since = None;
            self.fired = false;
            return false;
        }
        let since = *self.holding_since.get_or_insert_with(Instant::now);
        if !self.fired && since.elapsed() >= hold {
            self.fired = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const HOLD: Duration = Duration::from_millis(300);

    #[test]
    fn short_hold_never_signals() {
        let mut detector = ExitDetector::new();
        assert!(!detector.poll(true, HOLD));
        sleep(Duration::from_millis(100));
        assert!(!detector.poll(true, HOLD));
    }

    #[test]
    fn continuous_hold_signals_exactly_once() {
        let mut detector = ExitDetector::new();
        assert!(!detector.poll(true, HOLD));
        sleep(Duration::from_millis(350));
        assert!(detector.poll(true, HOLD));
        // Still held, but already fired.
        assert!(!detector.poll(true, HOLD));
        sleep(Duration::from_millis(50));
        assert!(!detector.poll(true, HOLD));
    }

    #[test]
    fn release_resets_all_progress() {
        let mut detector = ExitDetector::new();
        assert!(!detector.poll(true, HOLD));
        sleep(Duration::from_millis(200));
        assert!(!detector.poll(true, HOLD));

        // One key released just before the threshold.
        assert!(!detector.poll(false, HOLD));

        // The re-hold has to wait out the full duration again.
        assert!(!detector.poll(true, HOLD));
        sleep(Duration::from_millis(200));
        assert!(!detector.poll(true, HOLD));
        sleep(Duration::from_millis(150));
        assert!(detector.poll(true, HOLD));
    }

    #[test]
    fn release_after_firing_re_arms_the_detector() {
        let mut detector = ExitDetector::new();
        detector.poll(true, Duration::ZERO);

        assert!(!detector.poll(false, Duration::ZERO));
        assert!(detector.poll(true, Duration::ZERO));
    }

    #[test]
    fn zero_hold_fires_on_first_poll() {
        let mut detector = ExitDetector::new();
        assert!(detector.poll(true, Duration::ZERO));
    }
}
