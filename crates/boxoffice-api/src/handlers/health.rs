//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

fn describe(result: Result<bool, boxoffice_core::AppError>) -> (bool, String) {
    match result {
        Ok(true) => (true, "connected".to_string()),
        Ok(false) => (false, "unreachable".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Dependency health check failed");
            (false, "error".to_string())
        }
    }
}

/// GET /api/health
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let (db_ok, database) = match &state.database {
        Some(pool) => describe(pool.health_check().await),
        None => (true, "in-memory".to_string()),
    };
    let (cache_ok, cache) = describe(state.cache.health_check().await);
    let (coord_ok, coordination) = describe(state.coordination.health_check().await);

    let healthy = db_ok && cache_ok && coord_ok;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::ok(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database,
            cache,
            coordination,
        })),
    )
}
