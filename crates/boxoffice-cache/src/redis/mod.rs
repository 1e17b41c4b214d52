//! Redis-backed providers.

pub mod cache;
pub mod client;
pub mod coordination;

pub use cache::RedisCacheProvider;
pub use client::RedisClient;
pub use coordination::RedisCoordinationStore;
