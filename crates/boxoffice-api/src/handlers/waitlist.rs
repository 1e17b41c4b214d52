//! Waitlist handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use boxoffice_core::types::{EventId, UserId};
use boxoffice_service::{JoinReceipt, QueuePosition, WaitlistOverview};

use crate::dto::request::{JoinWaitlistRequest, PromoteRequest};
use crate::dto::response::{ApiResponse, LeaveWaitlistResponse, PromoteResponse, RebuildResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/events/{id}/waitlist
pub async fn join_waitlist(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<JoinWaitlistRequest>,
) -> Result<(StatusCode, Json<ApiResponse<JoinReceipt>>), ApiError> {
    let user_id = req.user();
    let receipt = state
        .waitlist
        .join_waitlist(EventId::from_uuid(event_id), user_id, req.tier)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(receipt))))
}

/// DELETE /api/events/{id}/waitlist/{user_id}
pub async fn leave_waitlist(
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<LeaveWaitlistResponse>>, ApiError> {
    let removed = state
        .waitlist
        .leave_waitlist(EventId::from_uuid(event_id), UserId::from_uuid(user_id))
        .await?;
    Ok(Json(ApiResponse::ok(LeaveWaitlistResponse { removed })))
}

/// GET /api/events/{id}/waitlist/{user_id}
pub async fn get_position(
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<QueuePosition>>, ApiError> {
    let position = state
        .waitlist
        .position(EventId::from_uuid(event_id), UserId::from_uuid(user_id))
        .await?;
    Ok(Json(ApiResponse::ok(position)))
}

/// GET /api/events/{id}/waitlist/stats
pub async fn get_stats(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<ApiResponse<WaitlistOverview>>, ApiError> {
    let stats = state.waitlist.stats(EventId::from_uuid(event_id)).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// POST /api/events/{id}/waitlist/promote
pub async fn promote(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<PromoteRequest>,
) -> Result<Json<ApiResponse<PromoteResponse>>, ApiError> {
    req.validate()?;
    let promoted = state
        .waitlist
        .process_promotions(EventId::from_uuid(event_id), req.freed_seats)
        .await?;
    Ok(Json(ApiResponse::ok(PromoteResponse { promoted })))
}

/// POST /api/events/{id}/waitlist/rebuild
pub async fn rebuild(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<ApiResponse<RebuildResponse>>, ApiError> {
    let restored = state
        .waitlist
        .rebuild_queue(EventId::from_uuid(event_id))
        .await?;
    Ok(Json(ApiResponse::ok(RebuildResponse { restored })))
}
