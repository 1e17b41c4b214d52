//! Seat booking and cancellation.

pub mod reference;
pub mod service;

pub use service::{BookingReceipt, BookingService, CancellationReceipt};
