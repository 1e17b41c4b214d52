//! # boxoffice-api
//!
//! HTTP API layer for BoxOffice built on Axum.
//!
//! Exposes booking, cancellation, waitlist, and event administration
//! endpoints under `/api`, with CORS, request tracing, and a mapping from
//! domain error codes to HTTP statuses.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
