//! S3-backed `ObjectStore` built on `aws-sdk-s3`.
//!
//! The client is constructed once at startup from `StoreSettings` and shared
//! through the gateway; nothing here is process-global.

use crate::config::StoreSettings;
use crate::services::object_store::{
    ListedObject, ObjectStore, ObjectTag, PutObject, StoreError, StoreResult,
};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::{Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
};
use std::collections::HashMap;
use tracing::{debug, error};

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build an SDK client for the configured region.
    ///
    /// Static credentials are used when both halves are configured; otherwise
    /// the SDK's default provider chain applies.
    pub async fn connect(settings: &StoreSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region_or_default().to_string()));

        if let (Some(access_key), Some(secret)) = (
            settings.access_key_id.as_deref(),
            settings.secret_access_key.as_deref(),
        ) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret,
                None,
                None,
                "tagged-image-gateway",
            ));
        }

        let sdk_config = loader.load().await;
        Self {
            client: Client::new(&sdk_config),
            bucket: settings.bucket.clone().unwrap_or_default(),
        }
    }
}

/// Render tags as the URL-query form S3 expects in `x-amz-tagging`.
fn tagging_header(tags: &[ObjectTag]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    Some(
        tags.iter()
            .map(|tag| {
                format!(
                    "{}={}",
                    urlencoding::encode(&tag.key),
                    urlencoding::encode(&tag.value)
                )
            })
            .collect::<Vec<_>>()
            .join("&"),
    )
}

fn request_failed<E>(operation: &'static str, key: &str, err: E) -> StoreError
where
    E: std::error::Error,
{
    let message = DisplayErrorContext(err).to_string();
    error!(operation, key, error = %message, "S3 request failed");
    StoreError::Request {
        operation,
        key: key.to_string(),
        message,
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, object: PutObject) -> StoreResult<()> {
        debug!(bucket = %self.bucket, key = %object.key, size = object.body.len(), "PutObject");

        let metadata: HashMap<String, String> = object.metadata.into_iter().collect();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object.key)
            .body(ByteStream::from(object.body))
            .content_type(object.content_type)
            .set_tagging(tagging_header(&object.tags))
            .set_metadata((!metadata.is_empty()).then_some(metadata))
            .send()
            .await
            .map_err(|err| request_failed("PutObject", &object.key, err))?;

        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> StoreResult<Vec<ListedObject>> {
        debug!(bucket = %self.bucket, prefix, "ListObjectsV2");

        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .send()
            .await
            .map_err(|err| request_failed("ListObjectsV2", prefix, err))?;

        if output.is_truncated().unwrap_or(false) {
            debug!(prefix, "listing truncated; only the first page is used");
        }

        Ok(output
            .contents()
            .iter()
            .map(|obj| ListedObject {
                key: obj.key().map(str::to_string),
                size: obj.size(),
            })
            .collect())
    }

    async fn get_object_tags(&self, key: &str) -> StoreResult<Vec<ObjectTag>> {
        let output = self
            .client
            .get_object_tagging()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| request_failed("GetObjectTagging", key, err))?;

        Ok(output
            .tag_set()
            .iter()
            .map(|tag| ObjectTag::new(tag.key(), tag.value()))
            .collect())
    }
}
