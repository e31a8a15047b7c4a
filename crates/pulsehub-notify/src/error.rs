//! Notification engine error taxonomy.
//!
//! Callers of the engine branch on these variants (or on [`NotifyError::code`]
//! across a serialization boundary). Infrastructure failures from stores and
//! caches arrive wrapped as [`NotifyError::App`].

use thiserror::Error;
use uuid::Uuid;

use pulsehub_core::error::AppError;

/// A specialized `Result` type for notification engine operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors produced by the notification engine.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The target user does not exist or is inactive.
    #[error("user {0} does not exist or is inactive")]
    InvalidUser(Uuid),

    /// The referenced template does not exist or is inactive.
    #[error("template '{0}' not found or inactive")]
    TemplateNotFound(String),

    /// The per-user creation rate limit was exceeded.
    #[error("rate limit exceeded for user {user_id}: {max} notifications per window")]
    RateLimited {
        /// The limited user.
        user_id: Uuid,
        /// The configured window maximum.
        max: u32,
    },

    /// A batch fan-out exceeded the configured recipient maximum.
    #[error("batch of {requested} recipients exceeds the maximum of {max}")]
    BatchTooLarge {
        /// Requested recipient count.
        requested: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The notification does not exist.
    #[error("notification {0} not found")]
    NotFound(Uuid),

    /// The batch does not exist.
    #[error("batch {0} not found")]
    BatchNotFound(Uuid),

    /// The notification expired before delivery was attempted.
    #[error("notification {0} expired before delivery")]
    Expired(Uuid),

    /// No email transport is configured.
    #[error("email transport is not configured")]
    EmailUnavailable,

    /// Push delivery has no implementation yet.
    #[error("push delivery is not implemented")]
    PushUnimplemented,

    /// Infrastructure failure (store, cache, configuration).
    #[error(transparent)]
    App(#[from] AppError),
}

impl NotifyError {
    /// Machine-readable error code for API consumers and logs.
    pub fn code(&self) -> String {
        match self {
            Self::InvalidUser(_) => "INVALID_USER".to_string(),
            Self::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND".to_string(),
            Self::RateLimited { .. } => "RATE_LIMITED".to_string(),
            Self::BatchTooLarge { .. } => "BATCH_TOO_LARGE".to_string(),
            Self::NotFound(_) => "NOT_FOUND".to_string(),
            Self::BatchNotFound(_) => "BATCH_NOT_FOUND".to_string(),
            Self::Expired(_) => "NOTIFICATION_EXPIRED".to_string(),
            Self::EmailUnavailable => "EMAIL_UNAVAILABLE".to_string(),
            Self::PushUnimplemented => "PUSH_UNIMPLEMENTED".to_string(),
            Self::App(err) => err.kind.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(NotifyError::InvalidUser(Uuid::nil()).code(), "INVALID_USER");
        assert_eq!(
            NotifyError::TemplateNotFound("x".into()).code(),
            "TEMPLATE_NOT_FOUND"
        );
        assert_eq!(NotifyError::EmailUnavailable.code(), "EMAIL_UNAVAILABLE");
        assert_eq!(NotifyError::PushUnimplemented.code(), "PUSH_UNIMPLEMENTED");
        assert_eq!(
            NotifyError::Expired(Uuid::nil()).code(),
            "NOTIFICATION_EXPIRED"
        );
    }

    #[test]
    fn test_app_errors_surface_their_kind() {
        let err = NotifyError::from(AppError::store("connection lost"));
        assert_eq!(err.code(), "STORE");
    }
}
