//! # pulsehub-realtime
//!
//! In-process real-time delivery hub for PulseHub. Keeps one pub/sub
//! channel per user and implements the notification engine's
//! [`Broadcaster`](pulsehub_notify::channel::Broadcaster) collaborator
//! contract. The wire transport in front of the hub (WebSocket, SSE) is
//! out of scope here — consumers subscribe in-process and bridge outward.

pub mod hub;

pub use hub::NotificationHub;
