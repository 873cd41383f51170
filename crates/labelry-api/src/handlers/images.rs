//! Image handlers: registration, lookup, status and tag creation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use labelry_core::{ImageStatus, NewImage, TagSource};

use super::ok;
use crate::auth::RequireCaller;
use crate::error::{ApiJson, ApiPath, ApiQuery};
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStatusRequest {
    pub status: ImageStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddTagRequest {
    pub value: String,
    /// Provenance of the label; defaults to USER.
    #[serde(default)]
    pub source: TagSource,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusCountsQuery {
    /// Restrict counts to one group.
    pub group_id: Option<Uuid>,
}

/// Register an uploaded image. Admin only.
///
/// POST /api/v1/images
#[utoipa::path(post, path = "/api/v1/images", tag = "Images",
    request_body = NewImage,
    responses((status = 201, description = "Created"), (status = 403, description = "Not an administrator")))]
pub async fn register_image(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiJson(req): ApiJson<NewImage>,
) -> Result<impl IntoResponse, ApiError> {
    let image = state.engine.register_image(&caller, req).await?;
    Ok((StatusCode::CREATED, ok(image)))
}

/// Get an image with its tags, newest first.
///
/// GET /api/v1/images/:id
#[utoipa::path(get, path = "/api/v1/images/{id}", tag = "Images",
    params(("id" = Uuid, Path, description = "Image id")),
    responses((status = 200, description = "Image with tags"), (status = 404, description = "Not found")))]
pub async fn get_image(
    State(state): State<AppState>,
    RequireCaller(_caller): RequireCaller,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.engine.get_image(id).await?))
}

/// Force an image status. Admin only.
///
/// PUT /api/v1/images/:id/status
#[utoipa::path(put, path = "/api/v1/images/{id}/status", tag = "Images",
    params(("id" = Uuid, Path, description = "Image id")),
    request_body = SetStatusRequest,
    responses((status = 200, description = "Updated image"), (status = 403, description = "Not an administrator")))]
pub async fn set_image_status(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SetStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let image = state
        .engine
        .set_image_status(&caller, id, req.status)
        .await?;
    Ok(ok(image))
}

/// List the tags on an image, newest first.
///
/// GET /api/v1/images/:id/tags
#[utoipa::path(get, path = "/api/v1/images/{id}/tags", tag = "Tags",
    params(("id" = Uuid, Path, description = "Image id")),
    responses((status = 200, description = "Tags"), (status = 404, description = "Not found")))]
pub async fn list_tags(
    State(state): State<AppState>,
    RequireCaller(_caller): RequireCaller,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.engine.list_tags(id).await?))
}

/// Add a tag authored by the caller.
///
/// POST /api/v1/images/:id/tags
#[utoipa::path(post, path = "/api/v1/images/{id}/tags", tag = "Tags",
    params(("id" = Uuid, Path, description = "Image id")),
    request_body = AddTagRequest,
    responses((status = 201, description = "Created"), (status = 400, description = "Invalid value"), (status = 404, description = "Not found")))]
pub async fn add_tag(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AddTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .engine
        .add_tag(&caller, id, &req.value, req.source)
        .await?;
    Ok((StatusCode::CREATED, ok(tag)))
}

/// Count images per status. Admin only.
///
/// GET /api/v1/stats/status
#[utoipa::path(get, path = "/api/v1/stats/status", tag = "Images",
    params(StatusCountsQuery),
    responses((status = 200, description = "Counts per status")))]
pub async fn status_counts(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiQuery(query): ApiQuery<StatusCountsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let counts = state.engine.status_counts(&caller, query.group_id).await?;
    Ok(ok(counts))
}
