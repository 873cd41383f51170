//! HTTP handlers for labelry-api.
//!
//! Every response body is an envelope: `{"success": true, "data": ...}` on
//! success, `{"success": false, "error": "..."}` on failure (see
//! [`ApiError`](crate::ApiError)).

pub mod ai_usage;
pub mod health;
pub mod images;
pub mod tags;

use axum::Json;
use serde::Serialize;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

/// Wrap `data` in a success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}
