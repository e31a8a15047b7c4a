//! Notification engine configuration.

use serde::{Deserialize, Serialize};

/// Notification engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Maximum number of recipients in a single batch fan-out.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Default maximum delivery attempts per notification.
    #[serde(default = "default_retry_count")]
    pub default_retry_count: u32,
    /// Base delay in milliseconds for exponential retry backoff.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Whether real-time delivery is enabled.
    #[serde(default = "default_true")]
    pub enable_realtime: bool,
    /// Whether email delivery is enabled.
    #[serde(default = "default_true")]
    pub enable_email: bool,
    /// Whether push delivery is enabled.
    #[serde(default)]
    pub enable_push: bool,
    /// Whether per-user quiet hours defer delivery.
    #[serde(default = "default_true")]
    pub quiet_hours_enabled: bool,
    /// Whether the per-user creation rate limit is enforced.
    #[serde(default = "default_true")]
    pub rate_limit_enabled: bool,
    /// Rate limit window settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Hours until a notification without an explicit expiry expires.
    #[serde(default = "default_expiration_hours")]
    pub default_expiration_hours: i64,
    /// Whether future-dated scheduling is honored.
    #[serde(default = "default_true")]
    pub enable_scheduling: bool,
    /// Capacity of the in-process immediate-dispatch queue.
    #[serde(default = "default_queue_size")]
    pub dispatch_queue_size: usize,
    /// Maximum due notifications picked up per scheduler pass.
    #[serde(default = "default_dispatch_batch_size")]
    pub dispatch_batch_size: usize,
}

/// Per-user notification creation rate limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum notifications created per user per window.
    #[serde(default = "default_max_per_user")]
    pub max_notifications_per_user: u32,
    /// Window length in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            default_retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            enable_realtime: true,
            enable_email: true,
            enable_push: false,
            quiet_hours_enabled: true,
            rate_limit_enabled: true,
            rate_limit: RateLimitConfig::default(),
            default_expiration_hours: default_expiration_hours(),
            enable_scheduling: true,
            dispatch_queue_size: default_queue_size(),
            dispatch_batch_size: default_dispatch_batch_size(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_notifications_per_user: default_max_per_user(),
            window_ms: default_window_ms(),
        }
    }
}

fn default_max_batch_size() -> usize {
    100
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    60_000
}

fn default_expiration_hours() -> i64 {
    720
}

fn default_queue_size() -> usize {
    1024
}

fn default_dispatch_batch_size() -> usize {
    100
}

fn default_max_per_user() -> u32 {
    50
}

fn default_window_ms() -> u64 {
    3_600_000
}

fn default_true() -> bool {
    true
}
