//! # pulsehub-notify
//!
//! The PulseHub notification delivery engine. Turns domain events
//! (activity logged, milestone reached, team goal completed) into
//! multi-channel messages, applies per-user delivery policy (channel
//! preferences, quiet hours, rate limits), schedules and retries delivery
//! with exponential backoff, and tracks lifecycle state through to
//! read/expiry.
//!
//! External collaborators are reached only through traits: persistence via
//! the store ports in [`store`], the real-time transport via
//! [`channel::Broadcaster`], and outbound email via
//! [`channel::EmailTransport`]. All dependencies are injected at
//! construction time via `Arc` references.

pub mod admin;
pub mod batch;
pub mod channel;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod preference;
pub mod query;
pub mod queue;
pub mod rate_limit;
pub mod service;
pub mod store;
pub mod template;

pub use batch::{BatchCoordinator, BatchDeliveryResult, BatchInput};
pub use channel::{ChannelAdapter, ChannelRegistry, DeliveryOutcome};
pub use dispatch::Dispatcher;
pub use engine::{NotificationEngine, NotificationStores};
pub use error::{NotifyError, NotifyResult};
pub use preference::PreferenceResolver;
pub use query::NotificationQueries;
pub use rate_limit::RateLimiter;
pub use service::{CreateNotificationInput, NotificationService};
pub use template::TemplateRenderer;
