//! Core traits defined in `boxoffice-core` and implemented by other crates.

pub mod cache;
pub mod coordination;
pub mod notification;

pub use cache::CacheProvider;
pub use coordination::CoordinationStore;
pub use notification::NotificationSender;
