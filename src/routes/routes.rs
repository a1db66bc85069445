//! Defines the gateway's HTTP surface.
//!
//! ## Structure
//! - `GET  /api/health`        - liveness, bucket and region
//! - `GET  /api/debug/config`  - which store settings are present
//! - `POST /api/upload`        - multipart upload (`image`, `keywords`)
//! - `GET  /api/search?q=`     - keyword substring search

use crate::{
    handlers::{
        health_handlers::{debug_config, health},
        image_handlers::{search_images, upload_image},
    },
    services::image_service::ImageService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Room for multipart framing and the `keywords` field on top of the image.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the route table. The router carries `ImageService` to all handlers.
pub fn routes() -> Router<ImageService> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/debug/config", get(debug_config))
        .route("/api/upload", post(upload_image))
        .route("/api/search", get(search_images))
}

/// Routes plus transport layers, bound to `service`.
///
/// The body limit admits a maximal image; the exact size check happens in
/// the service so it can answer with a validation error.
pub fn app(service: ImageService) -> Router {
    let body_limit = service
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    routes()
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
