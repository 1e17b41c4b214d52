//! In-process providers for single-node deployments and tests.

pub mod cache;
pub mod coordination;

pub use cache::MemoryCacheProvider;
pub use coordination::MemoryCoordinationStore;
