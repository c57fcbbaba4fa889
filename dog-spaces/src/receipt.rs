use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{ByteStream, FileRef};

/// Receipt returned after a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Key fields with the digested hash; pass this to delete and read calls
    pub file: FileRef,
    pub key: String,
    pub acl: String,
    /// Public URL, rewritten to the CDN when one is configured
    pub url: String,
    /// Location reported by the store
    pub location: String,
    pub etag: Option<String>,
    pub size_bytes: u64,
}

impl UploadReceipt {
    /// Create a new upload receipt
    pub fn new(file: FileRef, key: String, acl: String, size_bytes: u64) -> Self {
        Self {
            file,
            key,
            acl,
            url: String::new(),
            location: String::new(),
            etag: None,
            size_bytes,
        }
    }

    /// Set the public and native locations
    pub fn with_urls<U: Into<String>, L: Into<String>>(mut self, url: U, location: L) -> Self {
        self.url = url.into();
        self.location = location.into();
        self
    }

    /// Set etag
    pub fn with_etag<S: Into<String>>(mut self, etag: S) -> Self {
        self.etag = Some(etag.into());
        self
    }
}

/// Object metadata returned by a head request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileInfo {
    pub key: String,
    pub content_length: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    /// Seconds since the Unix epoch
    pub last_modified: Option<i64>,
    pub metadata: BTreeMap<String, String>,
}

/// Windowed read of a stored object
pub struct RangedRead {
    pub stream: ByteStream,
    /// Size of the whole object
    pub total_size: u64,
    /// Bytes requested per ranged GET
    pub window: u64,
    /// Offset of the first byte the stream yields
    pub start: u64,
}

impl RangedRead {
    /// Number of bytes the stream will yield
    pub fn remaining(&self) -> u64 {
        self.total_size.saturating_sub(self.start)
    }

    /// True when the read begins past the first byte
    pub fn is_partial(&self) -> bool {
        self.start > 0
    }
}
