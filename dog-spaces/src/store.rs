use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;

use crate::SpacesResult;

/// Object storage operations the provider is built on.
///
/// Implemented by [`crate::SpacesStore`] for S3-compatible services and by
/// [`crate::MemoryObjectStore`] for tests.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object
    async fn put(&self, object: PutObject) -> SpacesResult<PutOutput>;

    /// Delete an object by key
    async fn delete(&self, key: &str) -> SpacesResult<()>;

    /// Get object metadata without content
    async fn head(&self, key: &str) -> SpacesResult<ObjectHead>;

    /// Read bytes `start..=end` of an object
    async fn get_range(&self, key: &str, start: u64, end: u64) -> SpacesResult<Bytes>;
}

/// A fully resolved put request
#[derive(Debug, Clone)]
pub struct PutObject {
    pub key: String,
    pub body: Bytes,
    pub content_type: Option<String>,
    pub acl: String,
    pub cache_control: String,
    pub content_disposition: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

/// Result of a successful put
#[derive(Debug, Clone)]
pub struct PutOutput {
    /// Native URL of the object
    pub location: String,
    pub key: String,
    pub etag: Option<String>,
}

/// Metadata about a stored object
#[derive(Debug, Clone, Default)]
pub struct ObjectHead {
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<i64>,
    pub metadata: BTreeMap<String, String>,
}
