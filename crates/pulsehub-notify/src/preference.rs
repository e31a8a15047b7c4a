//! Preference resolution — effective channels and quiet-hours policy.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use pulsehub_cache::{CacheManager, keys};
use pulsehub_core::traits::cache::CacheProvider;
use pulsehub_entity::notification::{NotificationCategory, NotificationChannel};
use pulsehub_entity::preference::NotificationPreference;

use crate::error::NotifyResult;
use crate::store::PreferenceStore;

/// Resolves per-user delivery policy from preference rows.
///
/// Preference reads go through the cache; absence of a row for a category
/// means the category is disabled (fail-closed).
#[derive(Debug, Clone)]
pub struct PreferenceResolver {
    /// Preference store for lookups.
    prefs: Arc<dyn PreferenceStore>,
    /// Read-through cache for preference rows.
    cache: CacheManager,
    /// TTL for cached preference rows.
    cache_ttl: Duration,
}

impl PreferenceResolver {
    /// Create a new preference resolver.
    pub fn new(prefs: Arc<dyn PreferenceStore>, cache: CacheManager, cache_ttl: Duration) -> Self {
        Self {
            prefs,
            cache,
            cache_ttl,
        }
    }

    /// Compute the effective delivery channels for a (user, category) pair.
    ///
    /// No enabled preference row → empty set (the notification is created
    /// but delivers nowhere). A caller-requested subset is intersected with
    /// the configured channels, preserving the requested order; no request
    /// yields the configured set as-is.
    pub async fn resolve_channels(
        &self,
        user_id: Uuid,
        category: NotificationCategory,
        requested: Option<&[NotificationChannel]>,
    ) -> NotifyResult<Vec<NotificationChannel>> {
        let preference = match self.fetch(user_id, category).await? {
            Some(preference) if preference.enabled => preference,
            _ => return Ok(Vec::new()),
        };

        let channels = match requested {
            Some(requested) => requested
                .iter()
                .copied()
                .filter(|channel| preference.channels.contains(channel))
                .collect(),
            None => preference.channels.clone(),
        };

        Ok(channels)
    }

    /// Check whether the user's quiet hours for a category cover `now`.
    pub async fn is_quiet_hours(
        &self,
        user_id: Uuid,
        category: NotificationCategory,
        now: DateTime<Utc>,
    ) -> NotifyResult<bool> {
        let window = match self.quiet_window(user_id, category).await? {
            Some(window) => window,
            None => return Ok(false),
        };
        Ok(window.contains(now))
    }

    /// Return the earliest allowed delivery time at or after `now`.
    ///
    /// `now` itself when quiet hours are not active, otherwise the next
    /// occurrence of the quiet-window end (today if not yet passed, else
    /// tomorrow).
    pub async fn next_delivery_time(
        &self,
        user_id: Uuid,
        category: NotificationCategory,
        now: DateTime<Utc>,
    ) -> NotifyResult<DateTime<Utc>> {
        let window = match self.quiet_window(user_id, category).await? {
            Some(window) => window,
            None => return Ok(now),
        };
        if !window.contains(now) {
            return Ok(now);
        }
        Ok(window.next_end(now))
    }

    /// Drop cached preference rows for a user, after a preference write.
    pub async fn invalidate(&self, user_id: Uuid) {
        for category in NotificationCategory::ALL {
            let key = keys::notification_preference(user_id, category);
            if let Err(err) = self.cache.delete(&key).await {
                tracing::warn!(%user_id, error = %err, "Failed to invalidate preference cache");
            }
        }
    }

    /// Fetch a preference row through the cache.
    async fn fetch(
        &self,
        user_id: Uuid,
        category: NotificationCategory,
    ) -> NotifyResult<Option<NotificationPreference>> {
        let key = keys::notification_preference(user_id, category);

        if let Some(cached) = self.cache.get_json::<NotificationPreference>(&key).await? {
            return Ok(Some(cached));
        }

        let preference = self.prefs.find(user_id, category).await?;
        if let Some(preference) = &preference {
            self.cache.set_json(&key, preference, self.cache_ttl).await?;
        }

        Ok(preference)
    }

    /// Build the quiet window from the preference row, if fully specified.
    async fn quiet_window(
        &self,
        user_id: Uuid,
        category: NotificationCategory,
    ) -> NotifyResult<Option<QuietWindow>> {
        let preference = match self.fetch(user_id, category).await? {
            Some(preference) => preference,
            None => return Ok(None),
        };

        let (start, end) = match (&preference.quiet_hours_start, &preference.quiet_hours_end) {
            (Some(start), Some(end)) => (start, end),
            _ => return Ok(None),
        };

        let (start, end) = match (parse_hhmm(start), parse_hhmm(end)) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                tracing::warn!(
                    %user_id,
                    %category,
                    "Ignoring malformed quiet hours in preference row"
                );
                return Ok(None);
            }
        };

        Ok(Some(QuietWindow {
            start,
            end,
            offset: parse_offset(preference.timezone.as_deref()),
        }))
    }
}

/// A quiet-hours window in the user's local time.
#[derive(Debug, Clone, Copy)]
struct QuietWindow {
    start: NaiveTime,
    end: NaiveTime,
    offset: FixedOffset,
}

impl QuietWindow {
    /// Check whether `now` falls inside the window.
    ///
    /// `start <= end` is a same-day inclusive window; `start > end` wraps
    /// midnight.
    fn contains(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.offset).time();
        if self.start <= self.end {
            self.start <= local && local <= self.end
        } else {
            local >= self.start || local <= self.end
        }
    }

    /// The next occurrence of the window end at or after `now`.
    fn next_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local = now.with_timezone(&self.offset);
        let mut date = local.date_naive();
        if local.time() > self.end {
            date = date.succ_opt().unwrap_or(date);
        }
        let naive = date.and_time(self.end);
        match self.offset.from_local_datetime(&naive).single() {
            Some(end) => end.with_timezone(&Utc),
            // Fixed offsets always map local times uniquely.
            None => now,
        }
    }
}

/// Parse a `"HH:MM"` time of day.
fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Parse a fixed-offset timezone string, defaulting to UTC.
///
/// Accepts `"UTC"`, `"UTC+02:00"`, `"+02:00"`, `"-0530"`, and `"+7"`.
fn parse_offset(timezone: Option<&str>) -> FixedOffset {
    let utc = FixedOffset::east_opt(0).expect("zero offset is valid");

    let raw = match timezone {
        Some(raw) => raw.trim(),
        None => return utc,
    };
    let raw = raw.strip_prefix("UTC").unwrap_or(raw).trim();
    if raw.is_empty() {
        return utc;
    }

    let (sign, digits) = match raw.split_at_checked(1) {
        Some(("+", rest)) => (1i32, rest),
        Some(("-", rest)) => (-1i32, rest),
        _ => {
            tracing::debug!(timezone = raw, "Unrecognized timezone, falling back to UTC");
            return utc;
        }
    };

    let digits = digits.replace(':', "");
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok(), Some(0)),
        4 => (
            digits[..2].parse::<i32>().ok(),
            digits[2..].parse::<i32>().ok(),
        ),
        _ => (None, None),
    };

    match (hours, minutes) {
        (Some(hours), Some(minutes)) if hours <= 14 && minutes < 60 => {
            FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).unwrap_or(utc)
        }
        _ => {
            tracing::debug!(timezone = raw, "Unrecognized timezone, falling back to UTC");
            utc
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use pulsehub_core::config::cache::CacheConfig;

    use crate::store::MemoryStore;

    fn make_resolver(store: Arc<MemoryStore>) -> PreferenceResolver {
        let cache = CacheManager::new(&CacheConfig::default()).unwrap();
        PreferenceResolver::new(store, cache, Duration::from_secs(60))
    }

    fn make_preference(
        user_id: Uuid,
        category: NotificationCategory,
        channels: Vec<NotificationChannel>,
        enabled: bool,
    ) -> NotificationPreference {
        NotificationPreference {
            user_id,
            category,
            channels,
            enabled,
            quiet_hours_start: None,
            quiet_hours_end: None,
            timezone: None,
            updated_at: Utc::now(),
        }
    }

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn test_no_preference_row_resolves_empty() {
        let store = Arc::new(MemoryStore::new());
        let resolver = make_resolver(store);

        let channels = resolver
            .resolve_channels(
                Uuid::new_v4(),
                NotificationCategory::Activity,
                Some(&[NotificationChannel::Realtime, NotificationChannel::Email]),
            )
            .await
            .unwrap();
        assert!(channels.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_preference_resolves_empty() {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        store.add_preference(make_preference(
            user,
            NotificationCategory::Activity,
            vec![NotificationChannel::Realtime],
            false,
        ));
        let resolver = make_resolver(store);

        let channels = resolver
            .resolve_channels(user, NotificationCategory::Activity, None)
            .await
            .unwrap();
        assert!(channels.is_empty());
    }

    #[tokio::test]
    async fn test_requested_channels_intersected() {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        store.add_preference(make_preference(
            user,
            NotificationCategory::Activity,
            vec![NotificationChannel::Realtime],
            true,
        ));
        let resolver = make_resolver(store);

        let channels = resolver
            .resolve_channels(
                user,
                NotificationCategory::Activity,
                Some(&[NotificationChannel::Realtime, NotificationChannel::Email]),
            )
            .await
            .unwrap();
        assert_eq!(channels, vec![NotificationChannel::Realtime]);
    }

    #[tokio::test]
    async fn test_no_request_returns_full_configured_set() {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        store.add_preference(make_preference(
            user,
            NotificationCategory::Team,
            vec![NotificationChannel::Realtime, NotificationChannel::Email],
            true,
        ));
        let resolver = make_resolver(store);

        let channels = resolver
            .resolve_channels(user, NotificationCategory::Team, None)
            .await
            .unwrap();
        assert_eq!(
            channels,
            vec![NotificationChannel::Realtime, NotificationChannel::Email]
        );
    }

    #[tokio::test]
    async fn test_quiet_hours_midnight_wraparound() {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        let mut preference = make_preference(
            user,
            NotificationCategory::Activity,
            vec![NotificationChannel::Realtime],
            true,
        );
        preference.quiet_hours_start = Some("22:00".to_string());
        preference.quiet_hours_end = Some("06:00".to_string());
        store.add_preference(preference);
        let resolver = make_resolver(store);

        let quiet = |now| resolver.is_quiet_hours(user, NotificationCategory::Activity, now);

        assert!(quiet(utc(23, 30)).await.unwrap());
        assert!(quiet(utc(5, 0)).await.unwrap());
        assert!(!quiet(utc(12, 0)).await.unwrap());
    }

    #[tokio::test]
    async fn test_quiet_hours_same_day_window() {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        let mut preference = make_preference(
            user,
            NotificationCategory::Reminder,
            vec![NotificationChannel::Realtime],
            true,
        );
        preference.quiet_hours_start = Some("09:00".to_string());
        preference.quiet_hours_end = Some("17:00".to_string());
        store.add_preference(preference);
        let resolver = make_resolver(store);

        let quiet = |now| resolver.is_quiet_hours(user, NotificationCategory::Reminder, now);

        assert!(quiet(utc(9, 0)).await.unwrap());
        assert!(quiet(utc(12, 0)).await.unwrap());
        assert!(quiet(utc(17, 0)).await.unwrap());
        assert!(!quiet(utc(8, 59)).await.unwrap());
        assert!(!quiet(utc(17, 1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_quiet_hours_never_quiet() {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        store.add_preference(make_preference(
            user,
            NotificationCategory::Activity,
            vec![NotificationChannel::Realtime],
            true,
        ));
        let resolver = make_resolver(store);

        assert!(
            !resolver
                .is_quiet_hours(user, NotificationCategory::Activity, utc(3, 0))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_next_delivery_time_defers_to_window_end() {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        let mut preference = make_preference(
            user,
            NotificationCategory::Activity,
            vec![NotificationChannel::Realtime],
            true,
        );
        preference.quiet_hours_start = Some("22:00".to_string());
        preference.quiet_hours_end = Some("06:00".to_string());
        store.add_preference(preference);
        let resolver = make_resolver(store);

        // Inside the window before midnight: end is tomorrow 06:00.
        let next = resolver
            .next_delivery_time(user, NotificationCategory::Activity, utc(23, 30))
            .await
            .unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 16, 6, 0, 0).unwrap());

        // Inside the window after midnight: end is today 06:00.
        let next = resolver
            .next_delivery_time(user, NotificationCategory::Activity, utc(5, 0))
            .await
            .unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 15, 6, 0, 0).unwrap());

        // Outside the window: delivery proceeds now.
        let now = utc(12, 0);
        let next = resolver
            .next_delivery_time(user, NotificationCategory::Activity, now)
            .await
            .unwrap();
        assert_eq!(next, now);
    }

    #[tokio::test]
    async fn test_quiet_hours_respect_timezone_offset() {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        let mut preference = make_preference(
            user,
            NotificationCategory::Activity,
            vec![NotificationChannel::Realtime],
            true,
        );
        preference.quiet_hours_start = Some("22:00".to_string());
        preference.quiet_hours_end = Some("06:00".to_string());
        preference.timezone = Some("+02:00".to_string());
        store.add_preference(preference);
        let resolver = make_resolver(store);

        // 21:00 UTC is 23:00 local — inside the window.
        assert!(
            resolver
                .is_quiet_hours(user, NotificationCategory::Activity, utc(21, 0))
                .await
                .unwrap()
        );
        // 12:00 UTC is 14:00 local — outside.
        assert!(
            !resolver
                .is_quiet_hours(user, NotificationCategory::Activity, utc(12, 0))
                .await
                .unwrap()
        );
    }

    #[test]
    fn test_parse_offset_formats() {
        assert_eq!(parse_offset(None).local_minus_utc(), 0);
        assert_eq!(parse_offset(Some("UTC")).local_minus_utc(), 0);
        assert_eq!(parse_offset(Some("+02:00")).local_minus_utc(), 7200);
        assert_eq!(parse_offset(Some("UTC-05:30")).local_minus_utc(), -19800);
        assert_eq!(parse_offset(Some("-0530")).local_minus_utc(), -19800);
        assert_eq!(parse_offset(Some("+7")).local_minus_utc(), 25200);
        assert_eq!(parse_offset(Some("Mars/Olympus")).local_minus_utc(), 0);
    }
}
