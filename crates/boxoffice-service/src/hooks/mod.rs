//! Post-commit side effects.
//!
//! Hooks run only after a transaction has committed. They log their own
//! failures and never surface them to the caller.

pub mod cache;
pub mod notify;

pub use cache::CacheInvalidator;
pub use notify::{OutboundNotification, Outbox};
