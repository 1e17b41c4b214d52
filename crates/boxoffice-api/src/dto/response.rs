//! Response DTOs.

use serde::{Deserialize, Serialize};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` when every dependency answered, `"degraded"` otherwise.
    pub status: String,
    pub version: String,
    pub database: String,
    pub cache: String,
    pub coordination: String,
}

/// Result of leaving a waitlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveWaitlistResponse {
    pub removed: bool,
}

/// Result of a manual promotion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoteResponse {
    pub promoted: u32,
}

/// Result of a queue rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildResponse {
    pub restored: u64,
}
