//! Background work for BoxOffice.
//!
//! This crate provides:
//! - A cron scheduler that runs the promotion expiry sweep
//! - A dispatcher that drains the notification outbox into a sender
//! - The database-backed notification sender

pub mod dispatcher;
pub mod executor;
pub mod jobs;
pub mod scheduler;
pub mod sender;

pub use dispatcher::NotificationDispatcher;
pub use executor::{JobExecutionError, ScheduledJob};
pub use scheduler::CronScheduler;
pub use sender::DatabaseNotificationSender;
