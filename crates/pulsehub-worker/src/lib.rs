//! Scheduled background tasks for PulseHub notifications.
//!
//! This crate provides the cron scheduler that drives the engine's two
//! time-based entry points: the due-notification dispatch scan and the
//! expired-notification cleanup sweep.

pub mod scheduler;

pub use scheduler::CronScheduler;
