//! Core trait definitions shared across PulseHub crates.

pub mod cache;
