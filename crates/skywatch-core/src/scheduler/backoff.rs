// ── Reconnect backoff ──

use std::time::Duration;

/// Exponential backoff configuration for subscription reconnects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

/// Attempt counter over a `ReconnectConfig`.
///
/// `delay = min(initial * 2^attempt, max)`
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    config: ReconnectConfig,
    attempt: u32,
}

impl Backoff {
    pub(crate) fn new(config: ReconnectConfig) -> Self {
        Self { config, attempt: 0 }
    }

    pub(crate) fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay before the next attempt, or `None` once retries are exhausted.
    pub(crate) fn next_delay(&mut self) -> Option<Duration> {
        if self.config.max_retries.is_some_and(|max| self.attempt >= max) {
            return None;
        }
        let factor = 2_u32.saturating_pow(self.attempt);
        let delay = self
            .config
            .initial_delay
            .checked_mul(factor)
            .map_or(self.config.max_delay, |d| d.min(self.config.max_delay));
        self.attempt = self.attempt.saturating_add(1);
        Some(delay)
    }

    /// Start over from the initial delay.
    pub(crate) fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_then_caps() {
        let mut backoff = Backoff::new(ReconnectConfig::default());
        let delays: Vec<u64> = (0..8)
            .map(|_| backoff.next_delay().map_or(0, |d| d.as_secs()))
            .collect();
        assert_eq!(delays, [1, 2, 4, 8, 16, 30, 30, 30]);
    }

    #[test]
    fn reset_starts_over() {
        let mut backoff = Backoff::new(ReconnectConfig::default());
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn gives_up_after_max_retries() {
        let mut backoff = Backoff::new(ReconnectConfig {
            max_retries: Some(2),
            ..ReconnectConfig::default()
        });
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_none());
    }

    #[test]
    fn huge_attempts_do_not_overflow() {
        let mut backoff = Backoff::new(ReconnectConfig::default());
        for _ in 0..100 {
            assert!(backoff.next_delay().is_some_and(|d| d <= Duration::from_secs(30)));
        }
    }
}
