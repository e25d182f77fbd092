//! Reconnect backoff policy for the alert stream
//!
//! Capped exponential backoff with jitter. Replaces a naive fixed-delay
//! retry loop: under a sustained outage every client would otherwise
//! reconnect in lockstep, so delays grow up to a cap and each delay is
//! jittered by +/-20%.

use rand::Rng;
use std::time::Duration;

/// Jitter applied to each computed delay, as a fraction of the delay.
const JITTER_RATIO: f64 = 0.2;

/// Exponential backoff state for one connection lifecycle.
///
/// `next_delay` advances the schedule; `reset` returns to the initial delay
/// after a successful connection. An optional attempt cap turns the policy
/// into "give up and wait for a manual reconnect".
#[derive(Debug)]
pub struct ReconnectBackoff {
    initial: Duration,
    max: Duration,
    max_attempts: Option<u32>,
    attempt: u32,
}

impl ReconnectBackoff {
    pub fn new(initial: Duration, max: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            initial,
            max,
            max_attempts,
            attempt: 0,
        }
    }

    /// Returns the delay to wait before the next attempt, or `None` when the
    /// attempt cap is exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if let Some(cap) = self.max_attempts {
            if self.attempt >= cap {
                return None;
            }
        }

        let exp = self.initial.as_secs_f64() * 2f64.powi(self.attempt as i32);
        let capped = exp.min(self.max.as_secs_f64());
        self.attempt = self.attempt.saturating_add(1);

        let jitter = capped * JITTER_RATIO;
        let delay = if jitter > 0.0 {
            let mut rng = rand::thread_rng();
            rng.gen_range((capped - jitter)..=(capped + jitter))
        } else {
            capped
        };

        Some(Duration::from_secs_f64(delay.max(0.0)))
    }

    /// Resets the schedule after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of attempts consumed since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}
