//! # boxoffice-service
//!
//! The inventory concurrency and waitlist engine. Services are built once
//! at startup with explicit `Arc` dependencies on the store traits, so the
//! same code runs against PostgreSQL and Redis in production and against
//! the in-process stores in tests.

pub mod booking;
pub mod catalog;
pub mod error;
pub mod hooks;
pub mod waitlist;

pub use booking::{BookingReceipt, BookingService, CancellationReceipt};
pub use catalog::EventCatalog;
pub use error::{BookingError, ErrorClass, WaitlistError};
pub use hooks::{CacheInvalidator, OutboundNotification, Outbox};
pub use waitlist::{JoinReceipt, QueuePosition, WaitlistOverview, WaitlistService};
