use bytes::Bytes;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::pin::Pin;

/// Stream of bytes for object content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Content source of an upload
pub enum FileBody {
    /// Whole file already in memory
    Buffer(Bytes),
    /// Streamed file
    Stream(ByteStream),
}

impl std::fmt::Debug for FileBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// File handed to the provider for upload
#[derive(Debug)]
pub struct FileDescriptor {
    /// Original filename, may encode `mainFolder_subFolder_rest`
    pub name: String,
    /// Content hash chosen by the host; digested before it becomes part of the key
    pub hash: String,
    /// Extension including the leading dot
    pub ext: String,
    pub mime: String,
    pub body: FileBody,
}

impl FileDescriptor {
    /// Describe an in-memory file
    pub fn from_buffer<N, H, E, M, B>(name: N, hash: H, ext: E, mime: M, buffer: B) -> Self
    where
        N: Into<String>,
        H: Into<String>,
        E: Into<String>,
        M: Into<String>,
        B: Into<Bytes>,
    {
        Self {
            name: name.into(),
            hash: hash.into(),
            ext: ext.into(),
            mime: mime.into(),
            body: FileBody::Buffer(buffer.into()),
        }
    }

    /// Describe a streamed file
    pub fn from_stream<N, H, E, M>(name: N, hash: H, ext: E, mime: M, stream: ByteStream) -> Self
    where
        N: Into<String>,
        H: Into<String>,
        E: Into<String>,
        M: Into<String>,
    {
        Self {
            name: name.into(),
            hash: hash.into(),
            ext: ext.into(),
            mime: mime.into(),
            body: FileBody::Stream(stream),
        }
    }
}

/// The fields an object key is derived from.
///
/// `hash` is used as-is: after an upload it must be the digest from
/// [`UploadReceipt::file`], not the host's original hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub hash: String,
    pub ext: String,
}

impl FileRef {
    pub fn new<N: Into<String>, H: Into<String>, E: Into<String>>(name: N, hash: H, ext: E) -> Self {
        Self {
            name: name.into(),
            hash: hash.into(),
            ext: ext.into(),
        }
    }

    /// `hash` followed by `ext`
    pub fn filename(&self) -> String {
        format!("{}{}", self.hash, self.ext)
    }
}

/// Caller-supplied upload parameters. Every field that is set replaces the
/// value the provider would otherwise derive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOverrides {
    pub key: Option<String>,
    pub acl: Option<String>,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub content_disposition: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl UploadOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key<S: Into<String>>(mut self, key: S) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_acl<S: Into<String>>(mut self, acl: S) -> Self {
        self.acl = Some(acl.into());
        self
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_cache_control<S: Into<String>>(mut self, cache_control: S) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }

    pub fn with_content_disposition<S: Into<String>>(mut self, disposition: S) -> Self {
        self.content_disposition = Some(disposition.into());
        self
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
