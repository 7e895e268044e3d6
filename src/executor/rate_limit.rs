use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::AutomationType;

/// Length of a quota window.
pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Fixed-window action counter of one automation type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateWindow {
    pub kind: AutomationType,
    pub window_start: Instant,
    pub count: u32,
    pub max: u32,
}

/// Caps the number of actions per type within a fixed window.
///
/// Types without a configured quota are unlimited. A window resets lazily on the first
/// call after it has elapsed, so nothing runs in the background.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    windows: Mutex<HashMap<AutomationType, RateWindow>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DAY)
    }
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Set (or clear, with `None`) the quota of a type.
    ///
    /// Changing the cap keeps the current window's count, so restarting a task does not
    /// hand out a fresh quota. Lowering the cap below the count clamps the count to it.
    pub fn configure(&self, kind: AutomationType, max: Option<u32>) {
        let mut windows = self.windows();
        match max {
            Some(max) => {
                let w = windows.entry(kind).or_insert_with(|| RateWindow {
                    kind,
                    window_start: Instant::now(),
                    count: 0,
                    max,
                });
                w.max = max;
                w.count = w.count.min(max);
                debug!(target: "linkpilot::rate_limit", %kind, max, used = w.count, "quota configured");
            }
            None => {
                windows.remove(&kind);
            }
        }
    }

    /// Take one unit of quota. `false` means "skip the action", not an error.
    pub fn try_consume(&self, kind: AutomationType) -> bool {
        self.try_consume_at(kind, Instant::now())
    }

    fn try_consume_at(&self, kind: AutomationType, now: Instant) -> bool {
        let mut windows = self.windows();
        let Some(w) = windows.get_mut(&kind) else {
            return true;
        };

        if now.saturating_duration_since(w.window_start) >= self.window {
            debug!(target: "linkpilot::rate_limit", %kind, used = w.count, "window elapsed; resetting");
            w.window_start = now;
            w.count = 0;
        }

        if w.count < w.max {
            w.count += 1;
            true
        } else {
            info!(target: "linkpilot::rate_limit", %kind, max = w.max, "quota exhausted for this window");
            false
        }
    }

    /// Snapshot of a type's window, if it has a quota.
    pub fn window(&self, kind: AutomationType) -> Option<RateWindow> {
        self.windows().get(&kind).cloned()
    }

    fn windows(&self) -> MutexGuard<'_, HashMap<AutomationType, RateWindow>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_without_quota() {
        let limiter = RateLimiter::default();
        assert!((0..1_000).all(|_| limiter.try_consume(AutomationType::Feed)));
        assert!(limiter.window(AutomationType::Feed).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn n_plus_first_call_is_refused() {
        let limiter = RateLimiter::default();
        limiter.configure(AutomationType::Connections, Some(3));
        for _ in 0..3 {
            assert!(limiter.try_consume(AutomationType::Connections));
        }
        assert!(!limiter.try_consume(AutomationType::Connections));
        assert!(!limiter.try_consume(AutomationType::Connections));

        let w = limiter.window(AutomationType::Connections).unwrap();
        assert_eq!(w.count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn window_resets_after_it_elapses() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        limiter.configure(AutomationType::Connections, Some(1));
        assert!(limiter.try_consume(AutomationType::Connections));
        assert!(!limiter.try_consume(AutomationType::Connections));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(!limiter.try_consume(AutomationType::Connections));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(limiter.try_consume(AutomationType::Connections));
        assert_eq!(limiter.window(AutomationType::Connections).unwrap().count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reconfiguring_keeps_usage() {
        let limiter = RateLimiter::default();
        limiter.configure(AutomationType::Connections, Some(2));
        assert!(limiter.try_consume(AutomationType::Connections));
        limiter.configure(AutomationType::Connections, Some(2));
        assert!(limiter.try_consume(AutomationType::Connections));
        assert!(!limiter.try_consume(AutomationType::Connections));
    }

    #[tokio::test(start_paused = true)]
    async fn lowering_the_cap_clamps_usage() {
        let limiter = RateLimiter::default();
        limiter.configure(AutomationType::Connections, Some(10));
        for _ in 0..10 {
            assert!(limiter.try_consume(AutomationType::Connections));
        }
        limiter.configure(AutomationType::Connections, Some(5));
        let w = limiter.window(AutomationType::Connections).unwrap();
        assert_eq!((w.count, w.max), (5, 5));
        assert!(!limiter.try_consume(AutomationType::Connections));

        limiter.configure(AutomationType::Connections, Some(6));
        assert!(limiter.try_consume(AutomationType::Connections));
        assert!(!limiter.try_consume(AutomationType::Connections));
    }

    #[test]
    fn windows_are_per_type() {
        let limiter = RateLimiter::default();
        limiter.configure(AutomationType::Connections, Some(1));
        limiter.configure(AutomationType::Posts, Some(1));
        assert!(limiter.try_consume(AutomationType::Connections));
        assert!(limiter.try_consume(AutomationType::Posts));
        assert!(!limiter.try_consume(AutomationType::Connections));
    }
}
