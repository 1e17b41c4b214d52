//! Route definitions for the BoxOffice HTTP API.
//!
//! All routes are mounted under `/api` and receive `AppState` through
//! Axum's `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with every route and the request logger.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(booking_routes())
        .merge(event_routes())
        .merge(waitlist_routes())
        .merge(user_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Booking, lookup and cancellation
fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(handlers::booking::create_booking))
        .route("/bookings/{id}", get(handlers::booking::get_booking))
        .route("/bookings/{id}/cancel", post(handlers::booking::cancel_booking))
}

/// Event administration and cached lookup
fn event_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/events",
            get(handlers::event::list_events).post(handlers::event::create_event),
        )
        .route("/events/{id}", get(handlers::event::get_event))
}

/// Waitlist queue
fn waitlist_routes() -> Router<AppState> {
    Router::new()
        .route("/events/{id}/waitlist", post(handlers::waitlist::join_waitlist))
        .route("/events/{id}/waitlist/stats", get(handlers::waitlist::get_stats))
        .route(
            "/events/{id}/waitlist/promote",
            post(handlers::waitlist::promote),
        )
        .route(
            "/events/{id}/waitlist/rebuild",
            post(handlers::waitlist::rebuild),
        )
        .route(
            "/events/{id}/waitlist/{user_id}",
            get(handlers::waitlist::get_position).delete(handlers::waitlist::leave_waitlist),
        )
}

fn user_routes() -> Router<AppState> {
    Router::new().route("/users", post(handlers::user::create_user))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health_check))
}
