//! Fixed-rate re-arming tick timer.

use std::time::Duration;

/// Decides when the next playback tick is due.
///
/// The timer re-arms itself one period after every tick it fires, so a host
/// that stalls never receives a burst of catch-up ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameScheduler {
    period: Duration,
    next_due: Duration,
}

impl FrameScheduler {
    /// Creates a scheduler ticking `fps` times per second, first due at `now`.
    #[must_use]
    pub fn new(fps: u32, now: Duration) -> Self {
        Self {
            period: Duration::from_secs(1) / fps.max(1),
            next_due: now,
        }
    }

    /// Interval between two ticks.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Instant the next tick becomes due.
    #[must_use]
    pub const fn next_due(&self) -> Duration {
        self.next_due
    }

    /// Reports whether a tick is due at `now` and, if so, re-arms the timer.
    pub fn poll(&mut self, now: Duration) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now + self.period;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn fires_immediately_then_once_per_period() {
        let mut scheduler = FrameScheduler::new(50, ms(100));
        assert_eq!(scheduler.period(), ms(20));

        assert!(scheduler.poll(ms(100)));
        assert!(!scheduler.poll(ms(110)));
        assert!(!scheduler.poll(ms(119)));
        assert!(scheduler.poll(ms(120)));
        assert_eq!(scheduler.next_due(), ms(140));
    }

    #[test]
    fn stalls_do_not_queue_catch_up_ticks() {
        let mut scheduler = FrameScheduler::new(60, ms(0));
        assert!(scheduler.poll(ms(0)));

        assert!(scheduler.poll(ms(5_000)));
        assert!(!scheduler.poll(ms(5_001)));
    }

    #[test]
    fn zero_fps_falls_back_to_one_tick_per_second() {
        let scheduler = FrameScheduler::new(0, ms(0));
        assert_eq!(scheduler.period(), Duration::from_secs(1));
    }
}
