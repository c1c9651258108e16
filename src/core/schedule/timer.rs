//! Fixed-interval trigger with past-due detection

use std::time::Duration;
use tokio::time::Instant;

/// One firing of an [`IntervalTrigger`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// When the tick was due
    pub scheduled: Instant,
    /// How late it fired
    pub lateness: Duration,
    /// Lateness exceeded the tolerance
    pub past_due: bool,
}

/// Fires every `interval`, flagging ticks that fire late
///
/// Missed ticks are skipped rather than replayed: after a long run the next
/// deadline is the first interval boundary still in the future.
#[derive(Debug, Clone)]
pub struct IntervalTrigger {
    interval: Duration,
    tolerance: Duration,
    next: Instant,
}

impl IntervalTrigger {
    /// Create a trigger whose first deadline is `first`
    pub fn starting_at(first: Instant, interval: Duration, tolerance: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            tolerance,
            next: first,
        }
    }

    /// Create a trigger that first fires at `now`, or one interval from now
    pub fn new(
        now: Instant,
        interval: Duration,
        tolerance: Duration,
        fire_immediately: bool,
    ) -> Self {
        let first = if fire_immediately { now } else { now + interval };
        Self::starting_at(first, interval, tolerance)
    }

    pub fn next_deadline(&self) -> Instant {
        self.next
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Record a firing at `now` and advance the deadline
    pub fn fire(&mut self, now: Instant) -> Tick {
        let scheduled = self.next;
        let lateness = now.saturating_duration_since(scheduled);

        self.next = scheduled + self.interval;
        while self.next <= now {
            self.next += self.interval;
        }

        Tick {
            scheduled,
            lateness,
            past_due: lateness > self.tolerance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: Duration = Duration::from_millis(1000);

    #[test]
    fn test_fire_on_time() {
        let start = Instant::now();
        let mut trigger = IntervalTrigger::new(start, Duration::from_secs(300), TOLERANCE, true);
        assert_eq!(trigger.next_deadline(), start);

        let tick = trigger.fire(start + Duration::from_millis(20));
        assert!(!tick.past_due);
        assert_eq!(tick.scheduled, start);
        assert_eq!(trigger.next_deadline(), start + Duration::from_secs(300));
    }

    #[test]
    fn test_fire_late_is_past_due() {
        let start = Instant::now();
        let mut trigger = IntervalTrigger::new(start, Duration::from_secs(300), TOLERANCE, false);
        let due = start + Duration::from_secs(300);

        let tick = trigger.fire(due + Duration::from_secs(2));
        assert!(tick.past_due);
        assert_eq!(tick.lateness, Duration::from_secs(2));
    }

    #[test]
    fn test_missed_ticks_are_skipped() {
        let start = Instant::now();
        let interval = Duration::from_secs(60);
        let mut trigger = IntervalTrigger::new(start, interval, TOLERANCE, true);

        // A run that overran three intervals
        let tick = trigger.fire(start + Duration::from_secs(200));
        assert!(tick.past_due);
        assert_eq!(trigger.next_deadline(), start + Duration::from_secs(240));
    }

    #[test]
    fn test_lateness_at_tolerance_is_not_past_due() {
        let start = Instant::now();
        let mut trigger = IntervalTrigger::new(start, Duration::from_secs(5), TOLERANCE, true);
        assert!(!trigger.fire(start + TOLERANCE).past_due);
    }
}
