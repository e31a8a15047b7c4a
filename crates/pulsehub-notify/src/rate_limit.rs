//! Per-user fixed-window rate limiting for notification creation.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use pulsehub_core::config::notifications::RateLimitConfig;

use crate::error::{NotifyError, NotifyResult};

/// One user's window state.
#[derive(Debug, Clone, Copy)]
struct WindowState {
    /// Notifications created in the current window.
    count: u32,
    /// When the current window ends and the counter resets.
    reset_at: DateTime<Utc>,
}

/// Approximate fixed-window rate limiter keyed per user.
///
/// One counter and reset timestamp per user; the window restarts on the
/// first call after `reset_at`. Bursts straddling a window boundary are
/// accepted — this is a fixed window, not a sliding log. Instances are
/// injected into the engine at construction, so tests get independent
/// limiters with no cross-test leakage.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum notifications per user per window.
    max: u32,
    /// Window length.
    window: Duration,
    /// Per-user window state.
    windows: Mutex<HashMap<Uuid, WindowState>>,
}

impl RateLimiter {
    /// Create a new rate limiter from configuration.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max: config.max_notifications_per_user,
            window: Duration::milliseconds(config.window_ms as i64),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Consume one slot for the user, failing when the window is full.
    pub fn check_and_consume(&self, user_id: Uuid, now: DateTime<Utc>) -> NotifyResult<()> {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        let state = windows.entry(user_id).or_insert(WindowState {
            count: 0,
            reset_at: now + self.window,
        });

        if now >= state.reset_at {
            state.count = 0;
            state.reset_at = now + self.window;
        }

        if state.count >= self.max {
            return Err(NotifyError::RateLimited {
                user_id,
                max: self.max,
            });
        }

        state.count += 1;
        Ok(())
    }

    /// Drop window state for users whose window has long passed.
    pub fn prune(&self, now: DateTime<Utc>) {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        windows.retain(|_, state| now < state.reset_at + self.window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_limiter(max: u32, window_ms: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            max_notifications_per_user: max,
            window_ms,
        })
    }

    #[test]
    fn test_limit_enforced_within_window() {
        let limiter = make_limiter(3, 60_000);
        let user = Uuid::new_v4();
        let now = Utc::now();

        for _ in 0..3 {
            assert!(limiter.check_and_consume(user, now).is_ok());
        }

        let err = limiter.check_and_consume(user, now).unwrap_err();
        assert!(matches!(err, NotifyError::RateLimited { .. }));
    }

    #[test]
    fn test_counter_resets_after_window() {
        let limiter = make_limiter(3, 60_000);
        let user = Uuid::new_v4();
        let now = Utc::now();

        for _ in 0..3 {
            limiter.check_and_consume(user, now).unwrap();
        }
        assert!(limiter.check_and_consume(user, now).is_err());

        let later = now + Duration::milliseconds(60_001);
        assert!(limiter.check_and_consume(user, later).is_ok());
    }

    #[test]
    fn test_users_are_limited_independently() {
        let limiter = make_limiter(1, 60_000);
        let now = Utc::now();

        assert!(limiter.check_and_consume(Uuid::new_v4(), now).is_ok());
        assert!(limiter.check_and_consume(Uuid::new_v4(), now).is_ok());
    }

    #[test]
    fn test_prune_drops_stale_windows() {
        let limiter = make_limiter(3, 1_000);
        let user = Uuid::new_v4();
        let now = Utc::now();

        limiter.check_and_consume(user, now).unwrap();
        limiter.prune(now + Duration::milliseconds(5_000));

        let windows = limiter.windows.lock().unwrap();
        assert!(windows.is_empty());
    }
}
