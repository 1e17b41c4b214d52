//! # boxoffice-cache
//!
//! Providers for the two shared key-value concerns of BoxOffice:
//!
//! - the read-through **view cache** ([`CacheProvider`](boxoffice_core::traits::CacheProvider)),
//! - the **coordination store** for purchase locks and waitlist queues
//!   ([`CoordinationStore`](boxoffice_core::traits::CoordinationStore)).
//!
//! Each has an in-process implementation (feature `memory`) and a Redis
//! implementation (feature `redis-backend`), selected at runtime from
//! configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::{CacheManager, connect_coordination};
