use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::location::md5_hex;
use crate::range::{open_ranged, RangedReadOptions};
use crate::store::{ObjectStore, PutObject};
use crate::{
    ByteStream, FileBody, FileDescriptor, FileInfo, FileRef, LocationResolver, RangedRead,
    SpacesConfig, SpacesError, SpacesResult, UploadOverrides, UploadReceipt,
};

/// Operations a host application expects from an upload provider
#[async_trait]
pub trait UploadProvider: Send + Sync {
    /// Store a file and return where it went
    async fn upload(&self, file: FileDescriptor, overrides: UploadOverrides) -> SpacesResult<UploadReceipt>;

    /// Same as [`UploadProvider::upload`]; kept separate for hosts that call it for streamed files
    async fn upload_stream(
        &self,
        file: FileDescriptor,
        overrides: UploadOverrides,
    ) -> SpacesResult<UploadReceipt>;

    /// Remove a stored file
    async fn delete(&self, file: &FileRef) -> SpacesResult<()>;

    /// Read a stored file in `byte_range` sized windows starting at `cursor`
    async fn get_read_stream(
        &self,
        file: &FileRef,
        byte_range: Option<u64>,
        cursor: Option<u64>,
    ) -> SpacesResult<RangedRead>;

    /// Metadata of a stored file
    async fn get_file_info(&self, file: &FileRef) -> SpacesResult<FileInfo>;
}

/// Upload provider backed by an object store.
///
/// Keys, ACLs and public URLs come from the [`LocationResolver`]; the store
/// only ever sees fully resolved requests.
pub struct SpacesProvider {
    store: Arc<dyn ObjectStore>,
    resolver: LocationResolver,
}

impl SpacesProvider {
    /// Create a provider over a store.
    ///
    /// Fails with [`SpacesError::Config`](crate::SpacesError::Config) when the
    /// configuration does not validate, before anything reaches the store.
    pub fn new<S: ObjectStore + 'static>(store: S, config: SpacesConfig) -> SpacesResult<Self> {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create a provider over a store that is shared with other owners
    pub fn with_shared_store(store: Arc<dyn ObjectStore>, config: SpacesConfig) -> SpacesResult<Self> {
        Ok(Self {
            store,
            resolver: LocationResolver::new(config)?,
        })
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub fn config(&self) -> &SpacesConfig {
        self.resolver.config()
    }

    /// Upload a file.
    ///
    /// The host's hash is replaced by its MD5 digest before the key is
    /// derived; the receipt carries that digest in `file.hash`. Store errors
    /// are returned unchanged.
    #[instrument(skip(self, file, overrides), fields(name = %file.name))]
    pub async fn upload(&self, file: FileDescriptor, overrides: UploadOverrides) -> SpacesResult<UploadReceipt> {
        let FileDescriptor {
            name,
            hash,
            ext,
            mime,
            body,
        } = file;

        let file = FileRef::new(name, md5_hex(&hash), ext);
        let key = self.resolver.object_key(&file);
        let acl = self.resolver.acl(&file);

        let body = match body {
            FileBody::Buffer(buffer) => buffer,
            FileBody::Stream(mut stream) => Self::collect_stream(&mut stream).await?,
        };
        let size_bytes = body.len() as u64;

        let put = apply_overrides(
            PutObject {
                key,
                body,
                content_type: Some(mime).filter(|m| !m.is_empty()),
                acl,
                cache_control: self.config().cache_control().to_string(),
                content_disposition: None,
                metadata: BTreeMap::new(),
            },
            overrides,
        );
        let acl = put.acl.clone();

        debug!(key = %put.key, acl = %put.acl, size_bytes, "putting object");
        let output = self.store.put(put).await?;

        let url = self.resolver.public_url(&output.location, &output.key);
        info!(key = %output.key, url = %url, "uploaded object");

        let mut receipt =
            UploadReceipt::new(file, output.key, acl, size_bytes).with_urls(url, output.location);
        if let Some(etag) = output.etag {
            receipt = receipt.with_etag(etag);
        }

        Ok(receipt)
    }

    /// Identical to [`SpacesProvider::upload`]
    pub async fn upload_stream(
        &self,
        file: FileDescriptor,
        overrides: UploadOverrides,
    ) -> SpacesResult<UploadReceipt> {
        self.upload(file, overrides).await
    }

    /// Delete a file. The key is derived from `file` as given, without digesting the hash again.
    #[instrument(skip(self, file), fields(name = %file.name))]
    pub async fn delete(&self, file: &FileRef) -> SpacesResult<()> {
        let key = self.resolver.object_key(file);
        self.store.delete(&key).await?;
        info!(key = %key, "deleted object");
        Ok(())
    }

    /// Head the object behind `file`
    #[instrument(skip(self, file), fields(name = %file.name))]
    pub async fn get_file_info(&self, file: &FileRef) -> SpacesResult<FileInfo> {
        let key = self.resolver.object_key(file);
        let head = self
            .store
            .head(&key)
            .await
            .map_err(|err| read_failure(&key, "head", err))?;

        Ok(FileInfo {
            key,
            content_length: head.size_bytes,
            content_type: head.content_type,
            etag: head.etag,
            last_modified: head.last_modified,
            metadata: head.metadata,
        })
    }

    /// Open a windowed reader over the object behind `file`.
    ///
    /// Heads the object first to learn its size. `byte_range` of `None` or
    /// `0` reads 5 MiB per request; `cursor` defaults to the first byte.
    #[instrument(skip(self, file), fields(name = %file.name))]
    pub async fn get_read_stream(
        &self,
        file: &FileRef,
        byte_range: Option<u64>,
        cursor: Option<u64>,
    ) -> SpacesResult<RangedRead> {
        let key = self.resolver.object_key(file);
        let head = self
            .store
            .head(&key)
            .await
            .map_err(|err| read_failure(&key, "head", err))?;

        let options = RangedReadOptions::new(key.clone(), head.size_bytes, byte_range, cursor);
        debug!(key = %key, total_size = options.total_size, window = options.window, start = options.start, "opening ranged read");

        open_ranged(self.store.clone(), options).map_err(|err| read_failure(&key, "read", err))
    }

    async fn collect_stream(stream: &mut ByteStream) -> SpacesResult<Bytes> {
        let mut data = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk?);
        }
        Ok(data.freeze())
    }
}

#[async_trait]
impl UploadProvider for SpacesProvider {
    async fn upload(&self, file: FileDescriptor, overrides: UploadOverrides) -> SpacesResult<UploadReceipt> {
        SpacesProvider::upload(self, file, overrides).await
    }

    async fn upload_stream(
        &self,
        file: FileDescriptor,
        overrides: UploadOverrides,
    ) -> SpacesResult<UploadReceipt> {
        SpacesProvider::upload_stream(self, file, overrides).await
    }

    async fn delete(&self, file: &FileRef) -> SpacesResult<()> {
        SpacesProvider::delete(self, file).await
    }

    async fn get_read_stream(
        &self,
        file: &FileRef,
        byte_range: Option<u64>,
        cursor: Option<u64>,
    ) -> SpacesResult<RangedRead> {
        SpacesProvider::get_read_stream(self, file, byte_range, cursor).await
    }

    async fn get_file_info(&self, file: &FileRef) -> SpacesResult<FileInfo> {
        SpacesProvider::get_file_info(self, file).await
    }
}

/// Caller parameters replace derived ones
fn apply_overrides(mut put: PutObject, overrides: UploadOverrides) -> PutObject {
    let UploadOverrides {
        key,
        acl,
        content_type,
        cache_control,
        content_disposition,
        metadata,
    } = overrides;

    if let Some(key) = key {
        put.key = key;
    }
    if let Some(acl) = acl {
        put.acl = acl;
    }
    if let Some(content_type) = content_type {
        put.content_type = Some(content_type);
    }
    if let Some(cache_control) = cache_control {
        put.cache_control = cache_control;
    }
    if content_disposition.is_some() {
        put.content_disposition = content_disposition;
    }
    put.metadata.extend(metadata);
    put
}

/// Read failures are logged before they are returned to the caller
fn read_failure(key: &str, op: &str, err: SpacesError) -> SpacesError {
    if err.is_not_found() {
        warn!(key = %key, op, "object not found");
    } else {
        warn!(key = %key, op, error = %err, "read failed");
    }
    err
}
