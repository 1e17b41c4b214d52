//! PostgreSQL repository implementations.

pub mod booking;
pub mod event;
pub mod inventory;
pub mod notification;
pub mod user;
pub mod waitlist;

pub use booking::BookingRepository;
pub use event::EventRepository;
pub use inventory::{PgInventoryStore, PgInventoryTx};
pub use notification::NotificationRepository;
pub use user::UserRepository;
pub use waitlist::WaitlistRepository;
