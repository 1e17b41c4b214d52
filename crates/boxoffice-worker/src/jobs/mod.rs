//! Built-in scheduled jobs.

pub mod expiry;

pub use expiry::PromotionExpiryJob;
