use std::time::{Duration, Instant};

/// Periodic tick source polled from the frame loop.
///
/// Deadlines are kept on the monotonic clock so wall-clock steps neither
/// burst nor stall the timer. Stopping is idempotent; a stopped ticker
/// never reports due ticks.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next_due: Option<Instant>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Ticker {
            period,
            next_due: None,
        }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Time left until the next tick, if running.
    pub fn until_next(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }

    /// Counts the whole periods elapsed since the last call and moves the
    /// deadline past `now`.
    pub fn due(&mut self, now: Instant) -> u32 {
        let Some(mut next) = self.next_due else {
            return 0;
        };

        let mut count = 0;
        while next <= now {
            count += 1;
            next += self.period;
        }
        self.next_due = Some(next);
        count
    }
}
