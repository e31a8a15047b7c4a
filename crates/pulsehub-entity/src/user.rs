//! User account entity as seen by the notification engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of a user account the engine needs for delivery.
///
/// User rows are owned by the accounts subsystem; the engine only reads
/// them through its user store port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// Unique user identifier.
    pub id: Uuid,
    /// Display username.
    pub username: String,
    /// Email address for the email channel, if the user has one.
    pub email: Option<String>,
    /// Whether the account is active. Inactive accounts fail validation.
    pub is_active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}
