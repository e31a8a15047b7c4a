//! # pulsehub-cache
//!
//! Cache provider implementations for PulseHub. The engine uses the cache
//! as an explicit read-through layer for notification statistics and
//! preference lookups — never as a hidden global.
//!
//! Currently ships a single in-process backend built on
//! [moka](https://crates.io/crates/moka).

pub mod keys;
pub mod memory;
pub mod provider;

pub use memory::MemoryCacheProvider;
pub use provider::CacheManager;
