//! Automatic refresh countdown
//!
//! The countdown is armed from the moment the view last received fresh data
//! and fires once when the interval elapses, then starts over. It is inert
//! until armed, and is disarmed when there is no active location.
//!
//! The scheduler holds no timer of its own. The owning task sleeps until
//! `deadline()` and calls `poll`, which keeps it testable with a paused clock.

use std::time::Duration;
use tokio::time::Instant;

use crate::config::DEFAULT_REFRESH_INTERVAL;

/// Countdown driving periodic refresh of the active location
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

impl RefreshScheduler {
    /// Creates an unarmed scheduler with the given interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the countdown fires, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Starts the countdown from `last_updated`
    pub fn arm(&mut self, last_updated: Instant) {
        self.deadline = Some(last_updated + self.interval);
    }

    /// Stops the countdown until armed again
    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    /// Time left before the next refresh; zero when due, `None` when unarmed
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Fraction of the interval that has elapsed, from 0.0 to 1.0
    pub fn progress(&self, now: Instant) -> f64 {
        match self.remaining(now) {
            Some(remaining) if !self.interval.is_zero() => {
                let elapsed = self.interval.saturating_sub(remaining);
                elapsed.as_secs_f64() / self.interval.as_secs_f64()
            }
            _ => 0.0,
        }
    }

    /// Checks the countdown
    ///
    /// # Returns
    /// `true` exactly once per elapsed interval; the countdown restarts from `now`
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }

    /// Restarts the countdown for a manual refresh
    ///
    /// Has no effect when unarmed; there is nothing to refresh.
    pub fn refresh_now(&mut self, now: Instant) -> bool {
        if self.deadline.is_none() {
            return false;
        }
        self.arm(now);
        true
    }
}
