//! Priority waitlist with timed promotions.

pub mod estimate;
pub mod service;

pub use estimate::WaitEstimate;
pub use service::{JoinReceipt, QueuePosition, WaitlistOverview, WaitlistService};
