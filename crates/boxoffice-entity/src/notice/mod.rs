//! Persisted notification records.

pub mod model;

pub use model::NotificationRecord;
