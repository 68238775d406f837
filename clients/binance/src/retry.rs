use std::time::Duration;

use rand::Rng;

/// Exponential backoff with jitter between retries of a failed request.
///
/// Formula: min(max_delay, base * 2^attempt) +/- jitter
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    base: Duration,
    max_delay: Duration,
    jitter_factor: f64,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, max_delay: Duration) -> Self {
        Self {
            base,
            max_delay,
            jitter_factor: 0.1,
            attempt: 0,
        }
    }

    #[cfg(test)]
    fn without_jitter(mut self) -> Self {
        self.jitter_factor = 0.0;
        self
    }

    /// Delay to wait before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let exp_delay = self.base.saturating_mul(2u32.saturating_pow(self.attempt));
        let capped_delay = exp_delay.min(self.max_delay);

        self.attempt = self.attempt.saturating_add(1);

        let jitter_range = capped_delay.as_secs_f64() * self.jitter_factor;
        if jitter_range <= 0.0 {
            return capped_delay;
        }
        let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
        Duration::from_secs_f64((capped_delay.as_secs_f64() + jitter).max(0.0))
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
