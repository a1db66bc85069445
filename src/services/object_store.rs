//! src/services/object_store.rs
//!
//! ObjectStore: the narrow slice of an S3-like API the gateway depends on:
//! put one object with tags, list one page under a prefix, read an object's
//! tag set. The gateway receives an implementation at construction time so
//! tests can swap the network-backed store for an in-memory one.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// One object write, including its tag set and user metadata.
#[derive(Clone, Debug)]
pub struct PutObject {
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    /// User metadata (`x-amz-meta-*` on S3).
    pub metadata: Vec<(String, String)>,
    pub tags: Vec<ObjectTag>,
}

/// A single key/value tag attached to an object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectTag {
    pub key: String,
    pub value: String,
}

impl ObjectTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An entry returned by a listing call.
#[derive(Clone, Debug)]
pub struct ListedObject {
    /// Missing keys are possible on the wire; callers skip them.
    pub key: Option<String>,
    /// `None` when the listing omitted the size.
    pub size: Option<i64>,
}

impl ListedObject {
    /// Zero-byte entries (folder markers and the like) hold no image.
    /// An unknown size is not treated as empty.
    pub fn is_empty(&self) -> bool {
        self.size == Some(0)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{operation} `{key}` failed: {message}")]
    Request {
        operation: &'static str,
        key: String,
        message: String,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write one object. Existing objects under the same key are replaced.
    async fn put_object(&self, object: PutObject) -> StoreResult<()>;

    /// List objects whose key starts with `prefix`.
    ///
    /// Returns a single page only; no continuation is followed.
    async fn list_objects(&self, prefix: &str) -> StoreResult<Vec<ListedObject>>;

    /// Fetch the tag set of one object.
    async fn get_object_tags(&self, key: &str) -> StoreResult<Vec<ObjectTag>>;
}
