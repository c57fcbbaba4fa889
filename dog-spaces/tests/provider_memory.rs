use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use tracing_test::traced_test;

use dog_spaces::{
    md5_hex, ByteStream, FileDescriptor, FileRef, MemoryObjectStore, ObjectHead, ObjectStore,
    PutObject, PutOutput, SpacesConfig, SpacesError, SpacesProvider, SpacesResult, UploadOverrides,
    UploadProvider, DEFAULT_CACHE_CONTROL,
};

const ABC_MD5: &str = "900150983cd24fb0d6963f7d28e17f72";

/// Test factory functions
fn create_test_config() -> SpacesConfig {
    SpacesConfig::new("key", "secret", "fra1.digitaloceanspaces.com", "media")
}

fn create_provider(config: SpacesConfig) -> (SpacesProvider, MemoryObjectStore) {
    let store = MemoryObjectStore::with_base_url("https://media.fra1.digitaloceanspaces.com");
    (SpacesProvider::new(store.clone(), config).unwrap(), store)
}

fn png(name: &str, body: &'static [u8]) -> FileDescriptor {
    FileDescriptor::from_buffer(name, "abc", ".png", "image/png", Bytes::from_static(body))
}

fn sized_body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[derive(Debug)]
struct BackendDown;

impl fmt::Display for BackendDown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("503 Slow Down")
    }
}

impl std::error::Error for BackendDown {}

/// Store whose every call fails with a backend error
struct FailingStore;

#[async_trait]
impl ObjectStore for FailingStore {
    async fn put(&self, _object: PutObject) -> SpacesResult<PutOutput> {
        Err(SpacesError::backend(BackendDown))
    }

    async fn delete(&self, _key: &str) -> SpacesResult<()> {
        Err(SpacesError::backend(BackendDown))
    }

    async fn head(&self, _key: &str) -> SpacesResult<ObjectHead> {
        Err(SpacesError::backend(BackendDown))
    }

    async fn get_range(&self, _key: &str, _start: u64, _end: u64) -> SpacesResult<Bytes> {
        Err(SpacesError::backend(BackendDown))
    }
}

fn assert_backend_down(err: SpacesError) {
    match err {
        SpacesError::Backend { source } => assert!(source.downcast_ref::<BackendDown>().is_some()),
        other => panic!("expected backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_upload_routes_folder_key_and_acl() {
    let config = create_test_config()
        .with_acl("public-read")
        .with_folder("docs", "private");
    let (provider, store) = create_provider(config);

    let receipt = provider
        .upload(png("docs_images_photo", b"png-bytes"), UploadOverrides::default())
        .await
        .unwrap();

    let expected_key = format!("docs/images/{}.png", ABC_MD5);
    assert_eq!(receipt.key, expected_key);
    assert_eq!(receipt.acl, "private");
    assert_eq!(receipt.file, FileRef::new("docs_images_photo", ABC_MD5, ".png"));
    assert_eq!(receipt.size_bytes, 9);
    assert_eq!(
        receipt.url,
        format!("https://media.fra1.digitaloceanspaces.com/{}", expected_key)
    );
    assert_eq!(receipt.url, receipt.location);

    let stored = store.object(&expected_key).await.unwrap();
    assert_eq!(stored.acl, "private");
    assert_eq!(stored.cache_control, DEFAULT_CACHE_CONTROL);
    assert_eq!(stored.content_type.as_deref(), Some("image/png"));
    assert_eq!(&stored.body[..], b"png-bytes");
}

#[tokio::test]
async fn test_upload_into_directory_with_cdn() {
    let config = create_test_config()
        .with_directory("uploads")
        .with_cdn("http://cdn.example.com");
    let (provider, _store) = create_provider(config);

    let receipt = provider
        .upload(png("photo", b"x"), UploadOverrides::default())
        .await
        .unwrap();

    assert_eq!(receipt.key, format!("uploads/{}.png", ABC_MD5));
    assert_eq!(receipt.acl, "public-read");
    assert_eq!(
        receipt.url,
        format!("https://cdn.example.com/uploads/{}.png", ABC_MD5)
    );
    assert!(receipt.location.starts_with("https://media.fra1.digitaloceanspaces.com/"));
}

#[tokio::test]
async fn test_empty_directory_uploads_flat() {
    let (provider, store) = create_provider(create_test_config().with_directory(""));

    let receipt = provider
        .upload(png("photo", b"x"), UploadOverrides::default())
        .await
        .unwrap();

    assert_eq!(receipt.key, format!("{}.png", ABC_MD5));
    assert!(store.contains(&receipt.key).await);
}

#[tokio::test]
async fn test_empty_cdn_returns_store_location() {
    let (provider, store) = create_provider(create_test_config().with_cdn(""));

    let receipt = provider
        .upload(png("photo", b"x"), UploadOverrides::default())
        .await
        .unwrap();

    assert_eq!(receipt.url, receipt.location);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_any_put() {
    let store = MemoryObjectStore::with_base_url("https://media.fra1.digitaloceanspaces.com");

    let err = SpacesProvider::new(store.clone(), create_test_config().with_cdn("https://"))
        .err()
        .unwrap();
    assert!(matches!(err, SpacesError::Config { .. }));

    let err = SpacesProvider::new(
        store.clone(),
        SpacesConfig::new("key", "", "fra1.digitaloceanspaces.com", "media"),
    )
    .err()
    .unwrap();
    assert!(matches!(err, SpacesError::Config { .. }));

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_upload_stream_collects_body() {
    let (provider, store) = create_provider(create_test_config());

    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"hello ")),
        Ok(Bytes::from_static(b"world")),
    ];
    let stream: ByteStream = Box::pin(futures_util::stream::iter(chunks));
    let file = FileDescriptor::from_stream("greeting", "h1", ".txt", "text/plain", stream);

    let receipt = provider
        .upload_stream(file, UploadOverrides::default())
        .await
        .unwrap();

    assert_eq!(receipt.key, format!("{}.txt", md5_hex("h1")));
    assert_eq!(receipt.size_bytes, 11);
    assert_eq!(&store.object(&receipt.key).await.unwrap().body[..], b"hello world");
}

#[tokio::test]
async fn test_upload_overrides_win() {
    let (provider, store) = create_provider(create_test_config().with_acl("public-read"));

    let overrides = UploadOverrides::new()
        .with_acl("private")
        .with_content_type("application/octet-stream")
        .with_cache_control("no-store")
        .with_content_disposition("attachment")
        .with_metadata("owner", "42");

    let receipt = provider.upload(png("photo", b"x"), overrides).await.unwrap();
    assert_eq!(receipt.acl, "private");

    let stored = store.object(&receipt.key).await.unwrap();
    assert_eq!(stored.acl, "private");
    assert_eq!(stored.cache_control, "no-store");
    assert_eq!(stored.content_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(stored.content_disposition.as_deref(), Some("attachment"));
    assert_eq!(stored.metadata.get("owner").map(String::as_str), Some("42"));
}

#[tokio::test]
async fn test_key_override_moves_object_and_url() {
    let (provider, store) = create_provider(create_test_config().with_cdn("cdn.example.com"));

    let receipt = provider
        .upload(png("photo", b"x"), UploadOverrides::new().with_key("custom/place.png"))
        .await
        .unwrap();

    assert_eq!(receipt.key, "custom/place.png");
    assert_eq!(receipt.url, "https://cdn.example.com/custom/place.png");
    assert!(store.contains("custom/place.png").await);
}

#[tokio::test]
async fn test_upload_then_file_info_round_trip() {
    let (provider, _store) = create_provider(create_test_config());
    let body = sized_body(4096);

    let file = FileDescriptor::from_buffer("report", "r1", ".bin", "application/octet-stream", body.clone());
    let receipt = provider.upload(file, UploadOverrides::default()).await.unwrap();

    let info = provider.get_file_info(&receipt.file).await.unwrap();
    assert_eq!(info.content_length, body.len() as u64);
    assert_eq!(info.key, receipt.key);
    assert_eq!(info.content_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(info.etag, receipt.etag);
}

#[tokio::test]
async fn test_delete_uses_digested_hash_as_given() {
    let (provider, store) = create_provider(create_test_config().with_directory("uploads"));

    let receipt = provider
        .upload(png("photo", b"x"), UploadOverrides::default())
        .await
        .unwrap();
    assert!(store.contains(&receipt.key).await);

    // the original hash does not address the object
    provider.delete(&FileRef::new("photo", "abc", ".png")).await.unwrap();
    assert!(store.contains(&receipt.key).await);

    provider.delete(&receipt.file).await.unwrap();
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_write_path_errors_propagate_verbatim() {
    let provider = SpacesProvider::new(FailingStore, create_test_config()).unwrap();

    let err = provider
        .delete(&FileRef::new("photo", ABC_MD5, ".png"))
        .await
        .unwrap_err();
    assert_backend_down(err);

    let err = provider
        .upload(png("photo", b"x"), UploadOverrides::default())
        .await
        .unwrap_err();
    assert_backend_down(err);
}

#[tokio::test]
#[traced_test]
async fn test_read_path_errors_are_logged_and_returned() {
    let provider = SpacesProvider::new(FailingStore, create_test_config()).unwrap();
    let file = FileRef::new("photo", ABC_MD5, ".png");

    assert_backend_down(provider.get_file_info(&file).await.unwrap_err());
    assert_backend_down(provider.get_read_stream(&file, None, None).await.err().unwrap());
    assert!(logs_contain("read failed"));
}

#[tokio::test]
#[traced_test]
async fn test_missing_object_is_not_found() {
    let (provider, _store) = create_provider(create_test_config());
    let file = FileRef::new("photo", ABC_MD5, ".png");

    let err = provider.get_file_info(&file).await.unwrap_err();
    assert!(err.is_not_found());

    let err = provider.get_read_stream(&file, Some(10), None).await.err().unwrap();
    assert!(err.is_not_found());
    assert!(logs_contain("object not found"));
}

#[tokio::test]
async fn test_read_stream_defaults_to_five_mib_window() {
    let (provider, store) = create_provider(create_test_config());
    let body = sized_body(6 * 1024 * 1024);

    let file = FileDescriptor::from_buffer("video", "v1", ".mp4", "video/mp4", body.clone());
    let receipt = provider.upload(file, UploadOverrides::default()).await.unwrap();

    let read = provider.get_read_stream(&receipt.file, None, None).await.unwrap();
    assert_eq!(read.window, 5_242_880);
    assert_eq!(read.total_size, body.len() as u64);
    assert_eq!(read.start, 0);
    assert!(!read.is_partial());

    let chunks: Vec<Bytes> = read.stream.map(|c| c.unwrap()).collect().await;
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].len(), 5_242_880);
    assert_eq!(chunks[1].len(), 1024 * 1024);
    assert_eq!(store.range_requests(), 2);

    let joined: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
    assert_eq!(joined, body);
}

#[tokio::test]
async fn test_read_stream_window_and_cursor() {
    let (provider, _store) = create_provider(create_test_config());
    let body = sized_body(100);

    let file = FileDescriptor::from_buffer("doc", "d1", ".txt", "text/plain", body.clone());
    let receipt = provider.upload(file, UploadOverrides::default()).await.unwrap();

    let read = provider
        .get_read_stream(&receipt.file, Some(30), Some(25))
        .await
        .unwrap();
    assert!(read.is_partial());
    assert_eq!(read.remaining(), 75);

    let chunks: Vec<Bytes> = read.stream.map(|c| c.unwrap()).collect().await;
    let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![30, 30, 15]);

    let joined: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
    assert_eq!(joined, &body[25..]);
}

#[tokio::test]
async fn test_read_stream_cursor_past_end_is_invalid_range() {
    let (provider, _store) = create_provider(create_test_config());

    let receipt = provider
        .upload(png("photo", b"abc"), UploadOverrides::default())
        .await
        .unwrap();

    let err = provider
        .get_read_stream(&receipt.file, None, Some(4))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SpacesError::InvalidRange { start: 4, size: 3 }));
}

#[tokio::test]
async fn test_provider_usable_as_trait_object() {
    let (provider, _store) = create_provider(create_test_config());
    let provider: Box<dyn UploadProvider> = Box::new(provider);

    let receipt = provider
        .upload(png("photo", b"abc"), UploadOverrides::default())
        .await
        .unwrap();
    let info = provider.get_file_info(&receipt.file).await.unwrap();
    assert_eq!(info.content_length, 3);

    provider.delete(&receipt.file).await.unwrap();
    assert!(provider.get_file_info(&receipt.file).await.unwrap_err().is_not_found());
}
