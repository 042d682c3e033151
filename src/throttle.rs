use crate::clock::Clock;
use crate::error::SupplyError;
use crate::words::{GenerateRequest, WordSource};
use async_trait::async_trait;
use log::debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Process-wide minimum interval between accepted calls
pub struct Throttle {
    interval: Duration,
    last_accepted: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl Throttle {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval,
            last_accepted: Mutex::new(None),
            clock,
        }
    }

    /// Claims the slot, or reports how long until the next call may pass.
    /// Rejected calls leave the window untouched.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let now = self.clock.now();
        let mut last = self.last_accepted.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(prev) = *last {
            let since = now.saturating_duration_since(prev);
            if since < self.interval {
                return Err(self.interval - since);
            }
        }
        *last = Some(now);
        Ok(())
    }
}

/// Word source guarded by a shared throttle
pub struct ThrottledSource {
    inner: Arc<dyn WordSource>,
    throttle: Arc<Throttle>,
}

impl ThrottledSource {
    pub fn new(inner: Arc<dyn WordSource>, throttle: Arc<Throttle>) -> Self {
        Self { inner, throttle }
    }
}

#[async_trait]
impl WordSource for ThrottledSource {
    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<String>, SupplyError> {
        if let Err(wait) = self.throttle.try_acquire() {
            debug!("word generation throttled, next slot in {wait:?}");
            return Err(SupplyError::RateLimited);
        }
        self.inner.generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::difficulty::Difficulty;
    use crate::metrics::SessionStats;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn throttle(clock: &Arc<ManualClock>) -> Throttle {
        Throttle::new(Duration::from_secs(2), clock.clone())
    }

    #[test]
    fn first_call_passes() {
        let clock = Arc::new(ManualClock::new());
        assert_eq!(throttle(&clock).try_acquire(), Ok(()));
    }

    #[test]
    fn call_inside_interval_is_rejected() {
        let clock = Arc::new(ManualClock::new());
        let t = throttle(&clock);
        t.try_acquire().unwrap();

        clock.advance(Duration::from_millis(500));
        assert_eq!(t.try_acquire(), Err(Duration::from_millis(1500)));
    }

    #[test]
    fn rejection_does_not_extend_window() {
        let clock = Arc::new(ManualClock::new());
        let t = throttle(&clock);
        t.try_acquire().unwrap();

        clock.advance(Duration::from_millis(1900));
        assert!(t.try_acquire().is_err());
        clock.advance(Duration::from_millis(100));
        assert_eq!(t.try_acquire(), Ok(()));
    }

    struct CountingSource(AtomicUsize);

    #[async_trait]
    impl WordSource for CountingSource {
        async fn generate(&self, _req: &GenerateRequest) -> Result<Vec<String>, SupplyError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["word".to_string()])
        }
    }

    #[tokio::test]
    async fn throttled_source_shares_one_window() {
        let clock = Arc::new(ManualClock::new());
        let shared = Arc::new(throttle(&clock));
        let inner = Arc::new(CountingSource(AtomicUsize::new(0)));
        let a = ThrottledSource::new(inner.clone(), shared.clone());
        let b = ThrottledSource::new(inner.clone(), shared);
        let req = GenerateRequest::new(Difficulty::Easy, 1, &SessionStats::default());

        assert!(a.generate(&req).await.is_ok());
        assert_eq!(b.generate(&req).await, Err(SupplyError::RateLimited));
        clock.advance(Duration::from_secs(2));
        assert!(b.generate(&req).await.is_ok());
        assert_eq!(inner.0.load(Ordering::SeqCst), 2);
    }
}
