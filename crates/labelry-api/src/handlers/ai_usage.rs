//! AI-assist usage guard for the calling user.

use axum::extract::State;
use axum::response::IntoResponse;
use uuid::Uuid;

use super::ok;
use crate::auth::RequireCaller;
use crate::error::ApiPath;
use crate::{ApiError, AppState};

/// Whether the caller has already used AI suggestions on an image.
///
/// GET /api/v1/images/:id/ai-usage
#[utoipa::path(get, path = "/api/v1/images/{id}/ai-usage", tag = "AI usage",
    params(("id" = Uuid, Path, description = "Image id")),
    responses((status = 200, description = "Usage flag")))]
pub async fn has_used_ai(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(image_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let used = state.engine.has_used_ai(caller.user_id, image_id).await?;
    Ok(ok(serde_json::json!({ "used": used })))
}

/// Record that the caller consumed AI suggestions on an image. Idempotent.
///
/// POST /api/v1/images/:id/ai-usage
#[utoipa::path(post, path = "/api/v1/images/{id}/ai-usage", tag = "AI usage",
    params(("id" = Uuid, Path, description = "Image id")),
    responses((status = 200, description = "Recorded"), (status = 404, description = "Image not found")))]
pub async fn record_ai_usage(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(image_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.record_ai_usage(caller.user_id, image_id).await?;
    Ok(ok(serde_json::json!({ "used": true })))
}
