//! Liveness and store reachability.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use tracing::warn;

use crate::AppState;

/// Health check.
///
/// GET /health
#[utoipa::path(get, path = "/health", tag = "System",
    responses((status = 200, description = "Service status")))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.health.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            warn!(subsystem = "api", component = "health", error = %e, "Store unreachable");
            "unreachable"
        }
    };
    let status = if database == "connected" {
        "healthy"
    } else {
        "degraded"
    };

    Json(serde_json::json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
    }))
}
