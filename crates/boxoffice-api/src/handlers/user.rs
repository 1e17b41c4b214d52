//! User registration handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use validator::Validate;

use boxoffice_entity::account::User;

use crate::dto::request::CreateUserRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    req.validate()?;
    let user = state.catalog.create_user(req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user))))
}
