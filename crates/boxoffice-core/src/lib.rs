//! # boxoffice-core
//!
//! Core crate for BoxOffice. Contains the coordination, cache and
//! notification traits, configuration schemas, typed identifiers,
//! outbound notification messages, and the unified error system.
//!
//! This crate has **no** internal dependencies on other BoxOffice crates.

pub mod config;
pub mod error;
pub mod notification;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
