//! Tag handlers: edit, approve, delete.

use axum::extract::State;
use axum::response::IntoResponse;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use labelry_core::TagSource;

use super::ok;
use crate::auth::RequireCaller;
use crate::error::{ApiJson, ApiPath};
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTagRequest {
    pub value: String,
    /// Source recorded for the edit; defaults to USER.
    #[serde(default)]
    pub source: TagSource,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveTagRequest {
    /// Final label value.
    pub value: String,
}

/// Edit a tag's value and source.
///
/// PATCH /api/v1/tags/:id
#[utoipa::path(patch, path = "/api/v1/tags/{id}", tag = "Tags",
    params(("id" = Uuid, Path, description = "Tag id")),
    request_body = UpdateTagRequest,
    responses((status = 200, description = "Updated tag"), (status = 403, description = "Not the owner"), (status = 404, description = "Not found")))]
pub async fn update_tag(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .engine
        .update_tag(&caller, id, &req.value, req.source)
        .await?;
    Ok(ok(tag))
}

/// Approve a tag, rewriting it as ADMIN-sourced. Admin only.
///
/// POST /api/v1/tags/:id/approve
#[utoipa::path(post, path = "/api/v1/tags/{id}/approve", tag = "Tags",
    params(("id" = Uuid, Path, description = "Tag id")),
    request_body = ApproveTagRequest,
    responses((status = 200, description = "Approved tag"), (status = 403, description = "Not an administrator")))]
pub async fn approve_tag(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ApproveTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state.engine.approve_tag(&caller, id, &req.value).await?;
    Ok(ok(tag))
}

/// Delete a tag.
///
/// DELETE /api/v1/tags/:id
#[utoipa::path(delete, path = "/api/v1/tags/{id}", tag = "Tags",
    params(("id" = Uuid, Path, description = "Tag id")),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Not found")))]
pub async fn remove_tag(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.remove_tag(&caller, id).await?;
    Ok(ok(serde_json::json!({ "id": id })))
}
