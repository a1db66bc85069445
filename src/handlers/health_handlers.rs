//! Health & diagnostics handlers.
//!
//! - GET /api/health        -> liveness plus the configured bucket/region
//! - GET /api/debug/config  -> which settings are present, never their values
//!
//! Neither endpoint touches the object store.

use crate::services::image_service::{ConfigReport, HealthReport, ImageService};
use axum::{Json, extract::State};

/// `GET /api/health`
///
/// Always 200 while the process is up, configured or not.
pub async fn health(State(service): State<ImageService>) -> Json<HealthReport> {
    Json(service.health())
}

/// `GET /api/debug/config`
pub async fn debug_config(State(service): State<ImageService>) -> Json<ConfigReport> {
    Json(service.config_report())
}
