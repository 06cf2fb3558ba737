//! Circuit breaker shared by the HTTP providers.
//!
//! Yahoo and Finviz both throttle aggressively and ban IPs that keep
//! hammering after a 403. One breaker instance is shared across providers:
//! a ban on one endpoint means the whole host should go quiet. Tripped
//! state refuses every request until the cooldown expires.

use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30 * 60);
const FAILURE_THRESHOLD: u32 = 3;

#[derive(Debug)]
struct BreakerInner {
    consecutive_failures: u32,
    tripped_at: Option<Instant>,
}

/// Trips after repeated failures or an explicit ban signal.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    cooldown: Duration,
    threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                consecutive_failures: 0,
                tripped_at: None,
            }),
            cooldown,
            threshold: FAILURE_THRESHOLD,
        }
    }

    /// Standard provider breaker: 30-minute cooldown, trips after 3
    /// consecutive failures.
    pub fn for_provider() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }

    /// Whether requests are currently allowed. An expired cooldown resets
    /// the breaker on the way through.
    pub fn is_allowed(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.tripped_at {
            None => true,
            Some(at) if at.elapsed() >= self.cooldown => {
                inner.tripped_at = None;
                inner.consecutive_failures = 0;
                true
            }
            Some(_) => false,
        }
    }

    /// A successful request clears the failure streak.
    pub fn record_success(&self) {
        self.inner.lock().unwrap().consecutive_failures = 0;
    }

    /// Count a failure; at the threshold the breaker trips.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= self.threshold {
            inner.tripped_at = Some(Instant::now());
        }
    }

    /// Trip immediately (403 Forbidden means the IP is banned).
    pub fn trip(&self) {
        self.inner.lock().unwrap().tripped_at = Some(Instant::now());
    }

    /// Remaining cooldown, zero when not tripped.
    pub fn remaining_cooldown(&self) -> Duration {
        let inner = self.inner.lock().unwrap();
        match inner.tripped_at {
            None => Duration::ZERO,
            Some(at) => self.cooldown.saturating_sub(at.elapsed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        assert!(cb.is_allowed());
        assert_eq!(cb.remaining_cooldown(), Duration::ZERO);
    }

    #[test]
    fn trips_after_threshold_failures() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        cb.record_failure();
        cb.record_failure();
        assert!(cb.is_allowed());
        cb.record_failure();
        assert!(!cb.is_allowed());
    }

    #[test]
    fn forbidden_trips_immediately() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        cb.trip();
        assert!(!cb.is_allowed());
        assert!(cb.remaining_cooldown() > Duration::ZERO);
    }

    #[test]
    fn success_clears_the_streak() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert!(cb.is_allowed());
    }

    #[test]
    fn reopens_after_cooldown() {
        let cb = CircuitBreaker::new(Duration::from_millis(10));
        cb.trip();
        assert!(!cb.is_allowed());
        std::thread::sleep(Duration::from_millis(15));
        assert!(cb.is_allowed());
        // The reset also cleared the failure streak.
        cb.record_failure();
        assert!(cb.is_allowed());
    }
}
