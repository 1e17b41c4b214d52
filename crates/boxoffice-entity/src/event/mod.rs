//! Ticketed event entities.

pub mod model;
pub mod status;

pub use model::{CreateEvent, Event};
pub use status::EventStatus;
