//! # boxoffice-database
//!
//! PostgreSQL connection management, the inventory and waitlist store
//! traits, and their PostgreSQL repositories. The `memory` feature adds
//! in-process stores with the same locking semantics for tests and
//! single-node runs.

pub mod connection;
#[cfg(feature = "memory")]
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{InventoryStore, InventoryTx, WaitlistStore};
