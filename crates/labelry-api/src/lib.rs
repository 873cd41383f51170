//! # labelry-api
//!
//! HTTP surface for the labeling workflow engine.
//!
//! [`build_router`] wires the handlers, caller extraction and middleware
//! around an [`AppState`]; the binary in `main.rs` builds that state over
//! PostgreSQL, while tests build it over the in-memory store.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod notifier;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use uuid::Uuid;

use labelry_core::{LabelingEngine, SessionRepository};

pub use config::ApiConfig;
pub use error::ApiError;
pub use notifier::HttpScoringNotifier;

/// Store reachability probe for the health endpoint.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> labelry_core::Result<()>;
}

#[async_trait]
impl HealthProbe for labelry_db::Database {
    async fn ping(&self) -> labelry_core::Result<()> {
        labelry_db::Database::ping(self).await
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: LabelingEngine,
    pub sessions: Arc<dyn SessionRepository>,
    pub health: Arc<dyn HealthProbe>,
}

impl AppState {
    pub fn new(
        engine: LabelingEngine,
        sessions: Arc<dyn SessionRepository>,
        health: Arc<dyn HealthProbe>,
    ) -> Self {
        Self {
            engine,
            sessions,
            health,
        }
    }
}

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "labelry API",
        description = "Image labeling workflow: tags, image status and AI-assist usage"
    ),
    paths(
        handlers::health::health_check,
        handlers::images::register_image,
        handlers::images::get_image,
        handlers::images::set_image_status,
        handlers::images::list_tags,
        handlers::images::add_tag,
        handlers::images::status_counts,
        handlers::tags::update_tag,
        handlers::tags::approve_tag,
        handlers::tags::remove_tag,
        handlers::ai_usage::has_used_ai,
        handlers::ai_usage::record_ai_usage,
    ),
    components(schemas(
        labelry_core::Image,
        labelry_core::Tag,
        labelry_core::ImageStatus,
        labelry_core::TagSource,
        labelry_core::ImageWithTags,
        labelry_core::StatusCounts,
        labelry_core::NewImage,
        handlers::images::SetStatusRequest,
        handlers::images::AddTagRequest,
        handlers::tags::UpdateTagRequest,
        handlers::tags::ApproveTagRequest,
    )),
    tags(
        (name = "Images", description = "Image registration, lookup and status"),
        (name = "Tags", description = "Tag lifecycle"),
        (name = "AI usage", description = "One AI-assist request per user and image"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Build the application router.
pub fn build_router(state: AppState, config: &ApiConfig) -> Router {
    use handlers::{ai_usage, health, images, tags};

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/openapi.json", get(openapi_json))
        .route("/api/v1/images", post(images::register_image))
        .route("/api/v1/images/:id", get(images::get_image))
        .route(
            "/api/v1/images/:id/status",
            axum::routing::put(images::set_image_status),
        )
        .route(
            "/api/v1/images/:id/tags",
            get(images::list_tags).post(images::add_tag),
        )
        .route(
            "/api/v1/images/:id/ai-usage",
            get(ai_usage::has_used_ai).post(ai_usage::record_ai_usage),
        )
        .route(
            "/api/v1/tags/:id",
            axum::routing::patch(tags::update_tag).delete(tags::remove_tag),
        )
        .route("/api/v1/tags/:id/approve", post(tags::approve_tag))
        .route("/api/v1/stats/status", get(images::status_counts))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(config))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(axum::middleware::map_response(error::envelope_oversized_body))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
