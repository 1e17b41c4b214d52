//! Booking handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use boxoffice_core::types::{BookingId, EventId, UserId};
use boxoffice_entity::booking::Booking;
use boxoffice_service::{BookingReceipt, CancellationReceipt};

use crate::dto::request::CreateBookingRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingReceipt>>), ApiError> {
    let receipt = state
        .booking
        .book_tickets(
            UserId::from_uuid(req.user_id),
            EventId::from_uuid(req.event_id),
            req.quantity,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(receipt))))
}

/// GET /api/bookings/{id}
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, ApiError> {
    let booking = state.booking.find_booking(BookingId::from_uuid(id)).await?;
    Ok(Json(ApiResponse::ok(booking)))
}

/// POST /api/bookings/{id}/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CancellationReceipt>>, ApiError> {
    let receipt = state
        .booking
        .cancel_booking(BookingId::from_uuid(id))
        .await?;
    Ok(Json(ApiResponse::ok(receipt)))
}
