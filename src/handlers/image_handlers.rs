//! HTTP handlers for image upload and keyword search.
//! Form parsing lives here; everything else is delegated to `ImageService`.

use crate::{
    errors::AppError,
    models::image::{ImageItem, ImageUpload, SearchResponse},
    services::image_service::ImageService,
};
use axum::{
    Json,
    extract::{Multipart, Query, State},
};
use serde::Deserialize;
use tracing::debug;

/// Query params accepted by `GET /api/search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// `POST /api/upload` - multipart form with an `image` file and an optional
/// comma-separated `keywords` field.
pub async fn upload_image(
    State(service): State<ImageService>,
    mut multipart: Multipart,
) -> Result<Json<ImageItem>, AppError> {
    // Unconfigured servers reject the request before reading the body.
    service.ensure_configured()?;

    let mut upload = ImageUpload::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") if upload.bytes.is_none() => {
                // A part without a filename is a plain form value, not a file.
                let Some(filename) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;

                // Browsers send an empty, nameless part when no file is picked.
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                debug!(filename = %filename, size = data.len(), "received image part");

                upload.original_filename = filename;
                upload.content_type = content_type;
                upload.bytes = Some(data);
            }
            Some("keywords") => {
                upload.keywords_csv = Some(field.text().await?);
            }
            _ => {}
        }
    }

    let item = service.store_image(upload).await?;
    Ok(Json(item))
}

/// `GET /api/search?q=` - images whose keywords contain `q`; all images when
/// `q` is empty or absent.
pub async fn search_images(
    State(service): State<ImageService>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = params.q.unwrap_or_default();
    let items = service.search_images(&query).await?;
    debug!(query = %query, hits = items.len(), "search complete");
    Ok(Json(SearchResponse { items }))
}
