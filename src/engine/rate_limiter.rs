//! Per-source sliding-window rate limiting for alert delivery.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

/// Throttles alert delivery per source over a sliding time window.
///
/// Each source carries an independent window of the timestamps at which
/// alerts were granted; entries age out of the window lazily on each
/// decision. Limits are fixed at construction: a configuration reload
/// reconstructs the limiter, deliberately discarding prior history.
#[derive(Debug)]
pub struct RateLimiter {
    max_alerts_per_source: u32,
    cooldown: Duration,
    windows: HashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter granting at most `max_alerts_per_source` alerts
    /// per source within any `cooldown`-length window.
    pub fn new(max_alerts_per_source: u32, cooldown: Duration) -> Self {
        Self { max_alerts_per_source, cooldown, windows: HashMap::new() }
    }

    /// Decides whether an alert may fire for this source. On a grant, the
    /// current instant is appended to the source's window.
    pub fn permit(&mut self, source_id: &str) -> bool {
        self.permit_at(source_id, Instant::now())
    }

    /// Clock-driven core of [`RateLimiter::permit`].
    fn permit_at(&mut self, source_id: &str, now: Instant) -> bool {
        let window = self.windows.entry(source_id.to_string()).or_default();

        // Strict retention: entries as old as the cooldown itself are
        // pruned, so a zero cooldown always empties the window first.
        window.retain(|granted| now.duration_since(*granted) < self.cooldown);

        if window.len() as u32 >= self.max_alerts_per_source {
            return false;
        }

        window.push(now);
        true
    }

    /// Clears all per-source windows.
    pub fn reset(&mut self) {
        self.windows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_first_alert() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(10));

        assert!(limiter.permit("com.test.app"));
    }

    #[test]
    fn test_blocks_after_max_within_window() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(60));

        assert!(limiter.permit("com.test.app"));
        assert!(limiter.permit("com.test.app"));
        assert!(!limiter.permit("com.test.app"));
    }

    #[test]
    fn test_sources_are_independent() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.permit("com.test.app1"));
        assert!(!limiter.permit("com.test.app1"));
        assert!(limiter.permit("com.test.app2"));
    }

    #[test]
    fn test_reset_clears_all_windows() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.permit("com.test.app"));
        assert!(!limiter.permit("com.test.app"));

        limiter.reset();

        assert!(limiter.permit("com.test.app"));
    }

    #[test]
    fn test_grant_returns_after_window_expires() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(10));
        let start = Instant::now();

        assert!(limiter.permit_at("com.test.app", start));
        assert!(limiter.permit_at("com.test.app", start + Duration::from_secs(1)));
        assert!(!limiter.permit_at("com.test.app", start + Duration::from_secs(5)));

        // The first grant ages past the cooldown; capacity frees up.
        assert!(limiter.permit_at("com.test.app", start + Duration::from_millis(10_500)));
        // Grants at t=1s and t=10.5s are both still inside the window here.
        assert!(!limiter.permit_at("com.test.app", start + Duration::from_millis(10_900)));
    }

    #[test]
    fn test_zero_max_denies_unconditionally() {
        let mut limiter = RateLimiter::new(0, Duration::from_secs(60));

        assert!(!limiter.permit("com.test.app"));
        assert!(!limiter.permit("com.test.app"));
    }

    #[test]
    fn test_zero_cooldown_disables_throttling() {
        let mut limiter = RateLimiter::new(1, Duration::ZERO);
        let now = Instant::now();

        for _ in 0..5 {
            assert!(limiter.permit_at("com.test.app", now));
        }
    }
}
