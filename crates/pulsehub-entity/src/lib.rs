//! # pulsehub-entity
//!
//! Domain entity models for PulseHub notifications. Every struct in this
//! crate represents a stored row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, and `Deserialize`.

pub mod batch;
pub mod notification;
pub mod preference;
pub mod template;
pub mod user;
