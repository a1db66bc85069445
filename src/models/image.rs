//! Upload input and the projection returned for stored images.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// An image submitted for storage, as extracted from the upload form.
#[derive(Clone, Debug, Default)]
pub struct ImageUpload {
    /// Raw image bytes. `None` when the form carried no file.
    pub bytes: Option<Bytes>,

    /// MIME type declared for the file part.
    pub content_type: Option<String>,

    /// Filename as sent by the client.
    pub original_filename: String,

    /// Comma-separated free-text keywords.
    pub keywords_csv: Option<String>,
}

/// A stored image as seen by clients: storage key, public URL and keywords.
///
/// Returned by upload and by search; never stored on its own.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ImageItem {
    pub key: String,
    pub url: String,
    pub keywords: Vec<String>,
}

/// Body of `GET /api/search`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SearchResponse {
    pub items: Vec<ImageItem>,
}
