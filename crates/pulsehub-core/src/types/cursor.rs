//! Keyset cursor pagination types for list endpoints.
//!
//! Cursors are opaque to callers: base64 of the last item's
//! `(created_at, id)` pair. Listing is ordered by `(created_at, id)`
//! descending, so a cursor marks the position *after* which to continue.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::result::AppResult;

/// Default page size.
const DEFAULT_PAGE_LIMIT: usize = 25;
/// Maximum page size. Larger requests are silently clamped.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Request parameters for cursor-paginated queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorRequest {
    /// Maximum number of items to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Opaque continuation cursor from a previous page.
    #[serde(default)]
    pub cursor: Option<String>,
}

impl CursorRequest {
    /// Create a new cursor request.
    pub fn new(limit: usize, cursor: Option<String>) -> Self {
        Self { limit, cursor }
    }

    /// Return the effective page size, clamped to [`MAX_PAGE_LIMIT`].
    pub fn effective_limit(&self) -> usize {
        self.limit.clamp(1, MAX_PAGE_LIMIT)
    }

    /// Decode the continuation cursor, if present.
    pub fn position(&self) -> AppResult<Option<(DateTime<Utc>, Uuid)>> {
        match &self.cursor {
            Some(cursor) => decode_cursor(cursor).map(Some),
            None => Ok(None),
        }
    }
}

impl Default for CursorRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            cursor: None,
        }
    }
}

/// Cursor-paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPage<T: Serialize> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Cursor for the next page, absent on the last page.
    pub next_cursor: Option<String>,
    /// Whether more items exist beyond this page.
    pub has_more: bool,
}

impl<T: Serialize> CursorPage<T> {
    /// Create a page from items plus the position of the last item.
    pub fn new(items: Vec<T>, has_more: bool, last: Option<(DateTime<Utc>, Uuid)>) -> Self {
        let next_cursor = if has_more {
            last.map(|(created_at, id)| encode_cursor(created_at, id))
        } else {
            None
        };
        Self {
            items,
            next_cursor,
            has_more,
        }
    }

    /// Create an empty page.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }
}

/// Encode a `(created_at, id)` position into an opaque cursor string.
pub fn encode_cursor(created_at: DateTime<Utc>, id: Uuid) -> String {
    let raw = format!("{}|{}", created_at.to_rfc3339(), id);
    URL_SAFE_NO_PAD.encode(raw)
}

/// Decode an opaque cursor string back into a `(created_at, id)` position.
pub fn decode_cursor(cursor: &str) -> AppResult<(DateTime<Utc>, Uuid)> {
    let raw = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| AppError::validation("Malformed pagination cursor"))?;
    let raw = String::from_utf8(raw)
        .map_err(|_| AppError::validation("Malformed pagination cursor"))?;

    let (ts, id) = raw
        .split_once('|')
        .ok_or_else(|| AppError::validation("Malformed pagination cursor"))?;

    let created_at = DateTime::parse_from_rfc3339(ts)
        .map_err(|_| AppError::validation("Malformed pagination cursor"))?
        .with_timezone(&Utc);
    let id = id
        .parse::<Uuid>()
        .map_err(|_| AppError::validation("Malformed pagination cursor"))?;

    Ok((created_at, id))
}

fn default_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}
