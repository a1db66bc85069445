//! src/services/image_service.rs
//!
//! ImageService: stores keyword-tagged images and searches them by keyword
//! substring. The object store is the only state: uploads write one object
//! with a `keywords` tag, and search lists `uploads/` then reads each
//! object's tags in turn.

use crate::{
    config::StoreSettings,
    models::image::{ImageItem, ImageUpload},
    services::{
        keywords::{KEYWORDS_TAG, decode_keywords, encode_keywords, matches_query, normalize_keywords},
        object_keys::{UPLOAD_PREFIX, object_key, public_url, sanitize_filename},
        object_store::{ObjectStore, ObjectTag, PutObject, StoreError},
    },
};
use chrono::Utc;
use serde::Serialize;
use std::{fmt, sync::Arc};
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Search,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Upload => f.write_str("Upload"),
            Operation::Search => f.write_str("Search"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No image uploaded")]
    MissingImage,
    #[error("image is {size} bytes; the limit is {limit} bytes")]
    ImageTooLarge { size: usize, limit: usize },
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Server not configured")]
    NotConfigured { missing: Vec<&'static str> },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{operation} failed")]
    Store {
        operation: Operation,
        #[source]
        source: StoreError,
    },
    #[error("{operation} failed")]
    MalformedTag { operation: Operation, key: String },
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Public view of the store configuration, without secret values.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigReport {
    pub bucket: String,
    pub region: String,
    pub has_access_key: bool,
    pub has_secret: bool,
}

/// Unset settings are reported as empty strings.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub ok: bool,
    pub region: String,
    pub bucket: String,
}

/// ImageService provides the two gateway operations:
/// - store an image with keyword tags
/// - list images whose keywords contain a query substring
///
/// Cloning is cheap; every clone shares the same store handle.
#[derive(Clone)]
pub struct ImageService {
    store: Arc<dyn ObjectStore>,
    settings: StoreSettings,
    max_upload_bytes: usize,
}

impl ImageService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        settings: StoreSettings,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            store,
            settings,
            max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Fail fast when any required setting is absent.
    ///
    /// Runs before any validation or store call.
    pub fn ensure_configured(&self) -> GatewayResult<()> {
        let missing = self.settings.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::NotConfigured { missing })
        }
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            ok: true,
            region: self.settings.region.clone().unwrap_or_default(),
            bucket: self.settings.bucket.clone().unwrap_or_default(),
        }
    }

    pub fn config_report(&self) -> ConfigReport {
        ConfigReport {
            bucket: self.settings.bucket.clone().unwrap_or_default(),
            region: self.settings.region.clone().unwrap_or_default(),
            has_access_key: self.settings.access_key_id.is_some(),
            has_secret: self.settings.secret_access_key.is_some(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        public_url(
            self.settings.bucket.as_deref().unwrap_or_default(),
            self.settings.region_or_default(),
            key,
        )
    }

    /// Store one image with its normalized keywords.
    ///
    /// Writes a single object; the `keywords` tag is only attached when at
    /// least one keyword survives normalization. No retry on failure.
    pub async fn store_image(&self, upload: ImageUpload) -> GatewayResult<ImageItem> {
        self.ensure_configured()?;

        let bytes = upload.bytes.ok_or(ValidationError::MissingImage)?;
        if bytes.len() > self.max_upload_bytes {
            return Err(ValidationError::ImageTooLarge {
                size: bytes.len(),
                limit: self.max_upload_bytes,
            }
            .into());
        }

        let filename = sanitize_filename(&upload.original_filename);
        let key = object_key(Utc::now(), &upload.original_filename);
        let keywords = normalize_keywords(upload.keywords_csv.as_deref().unwrap_or_default());
        let tags = encode_keywords(&keywords)
            .map(|value| vec![ObjectTag::new(KEYWORDS_TAG, value)])
            .unwrap_or_default();

        self.store
            .put_object(PutObject {
                key: key.clone(),
                body: bytes,
                content_type: upload
                    .content_type
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                metadata: vec![("originalname".to_string(), filename)],
                tags,
            })
            .await
            .map_err(|source| GatewayError::Store {
                operation: Operation::Upload,
                source,
            })?;

        info!(key = %key, keywords = keywords.len(), "stored image");

        Ok(ImageItem {
            url: self.url_for(&key),
            key,
            keywords,
        })
    }

    /// List stored images whose keywords contain `query` (case-insensitive).
    ///
    /// One listing call plus one tag fetch per non-empty object, made
    /// serially. Only the first listing page is considered. Any failure
    /// aborts the whole search.
    pub async fn search_images(&self, query: &str) -> GatewayResult<Vec<ImageItem>> {
        self.ensure_configured()?;

        let query = query.to_lowercase();
        let store_failed = |source| GatewayError::Store {
            operation: Operation::Search,
            source,
        };

        let listed = self
            .store
            .list_objects(UPLOAD_PREFIX)
            .await
            .map_err(store_failed)?;
        debug!(count = listed.len(), query = %query, "listed uploads");

        let mut items = Vec::new();
        for obj in listed {
            if obj.is_empty() {
                continue;
            }
            let Some(key) = obj.key else { continue };

            let tags = self
                .store
                .get_object_tags(&key)
                .await
                .map_err(store_failed)?;
            let keywords = match tags.iter().find(|tag| tag.key == KEYWORDS_TAG) {
                Some(tag) => decode_keywords(&tag.value).map_err(|_| {
                    GatewayError::MalformedTag {
                        operation: Operation::Search,
                        key: key.clone(),
                    }
                })?,
                None => Vec::new(),
            };

            if matches_query(&keywords, &query) {
                items.push(ImageItem {
                    url: self.url_for(&key),
                    key,
                    keywords,
                });
            }
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::object_store::memory::{MemoryObjectStore, StoredObject};
    use bytes::Bytes;

    fn configured() -> StoreSettings {
        StoreSettings {
            bucket: Some("photos".into()),
            region: Some("eu-west-1".into()),
            access_key_id: Some("AKIAEXAMPLE".into()),
            secret_access_key: Some("wJalrXUtnFEMI".into()),
        }
    }

    fn service_with(settings: StoreSettings) -> (ImageService, Arc<MemoryObjectStore>) {
        let store = Arc::new(MemoryObjectStore::new());
        let service = ImageService::new(store.clone(), settings, 1024);
        (service, store)
    }

    fn upload(name: &str, keywords: &str) -> ImageUpload {
        ImageUpload {
            bytes: Some(Bytes::from_static(b"\x89PNG fake image")),
            content_type: Some("image/png".into()),
            original_filename: name.into(),
            keywords_csv: Some(keywords.into()),
        }
    }

    #[tokio::test]
    async fn store_writes_object_with_encoded_keywords_tag() {
        let (service, store) = service_with(configured());

        let item = service.store_image(upload("my photo.png", "A, b ,C")).await.unwrap();

        assert!(item.key.starts_with("uploads/"));
        assert!(item.key.ends_with("Z-my_photo.png"));
        assert_eq!(item.keywords, vec!["a", "b", "c"]);
        assert_eq!(
            item.url,
            format!("https://photos.s3.eu-west-1.amazonaws.com/{}", item.key)
        );

        let stored = store.get(&item.key).unwrap();
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(stored.tags, vec![ObjectTag::new("keywords", "a%7Cb%7Cc")]);
        assert_eq!(
            stored.metadata,
            vec![("originalname".to_string(), "my_photo.png".to_string())]
        );
    }

    #[tokio::test]
    async fn blank_keywords_write_no_tag() {
        let (service, store) = service_with(configured());

        let item = service.store_image(upload("a.png", " ,  , ")).await.unwrap();

        assert!(item.keywords.is_empty());
        assert!(store.get(&item.key).unwrap().tags.is_empty());
    }

    #[tokio::test]
    async fn missing_content_type_defaults_to_octet_stream() {
        let (service, store) = service_with(configured());
        let mut input = upload("a.bin", "");
        input.content_type = None;

        let item = service.store_image(input).await.unwrap();

        assert_eq!(
            store.get(&item.key).unwrap().content_type,
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn missing_image_fails_validation_without_store_call() {
        let (service, store) = service_with(configured());
        let mut input = upload("a.png", "x");
        input.bytes = None;

        let err = service.store_image(input).await.unwrap_err();

        assert!(matches!(
            err,
            GatewayError::Validation(ValidationError::MissingImage)
        ));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn oversized_image_is_rejected_before_store_call() {
        let (service, store) = service_with(configured());
        let mut input = upload("big.png", "x");
        input.bytes = Some(Bytes::from(vec![0u8; 1025]));

        let err = service.store_image(input).await.unwrap_err();

        assert!(matches!(
            err,
            GatewayError::Validation(ValidationError::ImageTooLarge {
                size: 1025,
                limit: 1024
            })
        ));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn unconfigured_service_fails_before_any_store_call() {
        let mut settings = configured();
        settings.region = None;
        settings.secret_access_key = None;
        let (service, store) = service_with(settings);

        for result in [
            service.store_image(upload("a.png", "x")).await.map(|_| ()),
            service.search_images("").await.map(|_| ()),
        ] {
            match result {
                Err(GatewayError::NotConfigured { missing }) => {
                    assert_eq!(missing, vec!["AWS_REGION", "AWS_SECRET_ACCESS_KEY"]);
                }
                other => panic!("expected NotConfigured, got {:?}", other),
            }
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn configuration_is_checked_before_validation() {
        let (service, _store) = service_with(StoreSettings::default());

        let err = service.store_image(ImageUpload::default()).await.unwrap_err();

        assert!(matches!(err, GatewayError::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn empty_query_returns_every_upload() {
        let (service, _store) = service_with(configured());
        for (i, name) in ["a.png", "b.png", "c.png"].iter().enumerate() {
            service
                .store_image(upload(name, &format!("kw{}", i)))
                .await
                .unwrap();
        }

        let items = service.search_images("").await.unwrap();

        assert_eq!(items.len(), 3);
    }

    #[tokio::test]
    async fn query_filters_by_keyword_substring() {
        let (service, _store) = service_with(configured());
        let beach = service
            .store_image(upload("beach.png", "Beach, Sunset"))
            .await
            .unwrap();
        service
            .store_image(upload("city.png", "City, Night"))
            .await
            .unwrap();

        let hits = service.search_images("set").await.unwrap();
        assert_eq!(hits, vec![beach.clone()]);

        let upper = service.search_images("SET").await.unwrap();
        assert_eq!(upper, vec![beach]);

        assert!(service.search_images("zz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keywords_round_trip_through_search() {
        let (service, _store) = service_with(configured());
        let stored = service.store_image(upload("x.png", "A, b ,C")).await.unwrap();

        let found = service.search_images("").await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, stored.key);
        assert_eq!(found[0].keywords, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn search_skips_empty_objects_and_handles_untagged_ones() {
        let (service, store) = service_with(configured());
        store.insert(
            "uploads/folder-marker",
            StoredObject {
                body: Bytes::new(),
                content_type: "application/x-directory".into(),
                metadata: Vec::new(),
                tags: Vec::new(),
            },
        );
        store.insert(
            "uploads/untagged.png",
            StoredObject {
                body: Bytes::from_static(b"img"),
                content_type: "image/png".into(),
                metadata: Vec::new(),
                tags: Vec::new(),
            },
        );
        store.insert(
            "elsewhere/other.png",
            StoredObject {
                body: Bytes::from_static(b"img"),
                content_type: "image/png".into(),
                metadata: Vec::new(),
                tags: vec![ObjectTag::new("keywords", "other")],
            },
        );

        let items = service.search_images("").await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].key, "uploads/untagged.png");
        assert!(items[0].keywords.is_empty());
        // one listing + one tag fetch; the empty object is never fetched
        assert_eq!(store.calls(), 2);
        assert!(service.search_images("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_upload_error() {
        let (service, store) = service_with(configured());
        store.fail_with("AccessDenied");

        let err = service.store_image(upload("a.png", "x")).await.unwrap_err();

        match err {
            GatewayError::Store { operation, source } => {
                assert_eq!(operation, Operation::Upload);
                assert!(source.to_string().contains("AccessDenied"));
            }
            other => panic!("expected Store error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn store_failure_aborts_search_without_partial_results() {
        let (service, store) = service_with(configured());
        service.store_image(upload("a.png", "x")).await.unwrap();
        store.fail_with("SlowDown");

        let err = service.search_images("").await.unwrap_err();

        assert!(matches!(
            err,
            GatewayError::Store {
                operation: Operation::Search,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn undecodable_tag_aborts_search() {
        let (service, store) = service_with(configured());
        store.insert(
            "uploads/bad.png",
            StoredObject {
                body: Bytes::from_static(b"img"),
                content_type: "image/png".into(),
                metadata: Vec::new(),
                tags: vec![ObjectTag::new("keywords", "%FF")],
            },
        );

        let err = service.search_images("").await.unwrap_err();

        assert!(matches!(err, GatewayError::MalformedTag { .. }));
    }

    #[test]
    fn reports_never_include_secret_values() {
        let (service, _store) = service_with(configured());
        let report = serde_json::to_string(&service.config_report()).unwrap();
        assert!(!report.contains("wJalrXUtnFEMI"));
        assert!(!report.contains("AKIAEXAMPLE"));
        assert!(report.contains("\"hasAccessKey\":true"));
        assert_eq!(
            service.health(),
            HealthReport {
                ok: true,
                region: "eu-west-1".into(),
                bucket: "photos".into(),
            }
        );
    }
}
