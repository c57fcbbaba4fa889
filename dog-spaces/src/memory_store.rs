use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::store::{ObjectHead, ObjectStore, PutObject, PutOutput};
use crate::{SpacesError, SpacesResult};

/// An object held by [`MemoryObjectStore`]
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: Option<String>,
    pub acl: String,
    pub cache_control: String,
    pub content_disposition: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub last_modified: i64,
}

/// In-process object store for tests and local development
#[derive(Clone)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    base_url: String,
    range_requests: Arc<AtomicUsize>,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::with_base_url("https://memory.invalid")
    }

    /// Locations are reported as `<base_url>/<key>`
    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            range_requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Snapshot of a stored object
    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Number of ranged reads served so far
    pub fn range_requests(&self) -> usize {
        self.range_requests.load(Ordering::Relaxed)
    }

    fn current_timestamp() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, object: PutObject) -> SpacesResult<PutOutput> {
        let etag = format!("\"{}\"", crate::location::md5_hex_bytes(&object.body));
        let location = format!("{}/{}", self.base_url, object.key);

        let stored = StoredObject {
            body: object.body,
            content_type: object.content_type,
            acl: object.acl,
            cache_control: object.cache_control,
            content_disposition: object.content_disposition,
            metadata: object.metadata,
            last_modified: Self::current_timestamp(),
        };
        self.objects.write().await.insert(object.key.clone(), stored);

        Ok(PutOutput {
            location,
            key: object.key,
            etag: Some(etag),
        })
    }

    async fn delete(&self, key: &str) -> SpacesResult<()> {
        // S3 semantics: deleting a missing key succeeds
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn head(&self, key: &str) -> SpacesResult<ObjectHead> {
        let objects = self.objects.read().await;
        let object = objects.get(key).ok_or_else(|| SpacesError::not_found(key))?;

        Ok(ObjectHead {
            size_bytes: object.body.len() as u64,
            content_type: object.content_type.clone(),
            etag: Some(format!("\"{}\"", crate::location::md5_hex_bytes(&object.body))),
            last_modified: Some(object.last_modified),
            metadata: object.metadata.clone(),
        })
    }

    async fn get_range(&self, key: &str, start: u64, end: u64) -> SpacesResult<Bytes> {
        self.range_requests.fetch_add(1, Ordering::Relaxed);

        let objects = self.objects.read().await;
        let object = objects.get(key).ok_or_else(|| SpacesError::not_found(key))?;
        let size = object.body.len() as u64;

        if start >= size || end < start {
            return Err(SpacesError::invalid_range(start, size));
        }

        let end = end.min(size - 1);
        Ok(object.body.slice(start as usize..=end as usize))
    }
}
