//! Waitlist entities: queue entries, promotions, and queue ordering.

pub mod entry;
pub mod promotion;
pub mod score;

pub use entry::{WaitlistEntry, WaitlistStatus};
pub use promotion::{PromotionStatus, WaitlistPromotion};
pub use score::QueueScore;
