//! Event administration handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use boxoffice_core::types::EventId;
use boxoffice_entity::event::Event;

use crate::dto::request::CreateEventRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Event>>), ApiError> {
    req.validate()?;
    let event = state.catalog.create_event(req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(event))))
}

/// GET /api/events
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Event>>>, ApiError> {
    let events = state.catalog.list_events().await?;
    Ok(Json(ApiResponse::ok(events)))
}

/// GET /api/events/{id}
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Event>>, ApiError> {
    let event = state.catalog.get_event(EventId::from_uuid(id)).await?;
    Ok(Json(ApiResponse::ok(event)))
}
