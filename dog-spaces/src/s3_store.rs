use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::{primitives::ByteStream as AwsByteStream, types::ObjectCannedAcl, Client};
use bytes::Bytes;
use url::Url;

use crate::store::{ObjectHead, ObjectStore, PutObject, PutOutput};
use crate::{SpacesConfig, SpacesError, SpacesResult};

/// Digital Ocean Spaces store using the AWS SDK (S3-compatible)
#[derive(Clone)]
pub struct SpacesStore {
    client: Client,
    space: String,
    /// `https://<space>.<endpoint-host>`, the base of reported locations
    location_base: Url,
}

impl SpacesStore {
    /// Build a client from a validated configuration
    pub async fn new(config: &SpacesConfig) -> SpacesResult<Self> {
        let endpoint = config.endpoint_url()?;
        let client = Self::create_client(config, &endpoint).await;
        Self::from_client(client, config.space.clone(), &endpoint)
    }

    /// Wrap an existing SDK client
    pub fn from_client(client: Client, space: String, endpoint: &Url) -> SpacesResult<Self> {
        let location_base = Self::location_base(&space, endpoint)?;
        Ok(Self {
            client,
            space,
            location_base,
        })
    }

    async fn create_client(config: &SpacesConfig, endpoint: &Url) -> Client {
        let credentials = Credentials::new(
            config.key.clone(),
            config.secret.clone(),
            None,
            None,
            "spaces",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region().to_string()))
            .credentials_provider(credentials)
            .endpoint_url(endpoint.as_str().trim_end_matches('/'))
            .load()
            .await;

        // Spaces serves buckets as <space>.<region>.digitaloceanspaces.com
        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(false)
                .build(),
        )
    }

    fn location_base(space: &str, endpoint: &Url) -> SpacesResult<Url> {
        let host = endpoint
            .host_str()
            .ok_or_else(|| SpacesError::config(format!("`endpoint` has no host: {}", endpoint)))?;

        let mut base = endpoint.clone();
        base.set_host(Some(&format!("{}.{}", space, host)))
            .map_err(|e| SpacesError::config(format!("`space` {} is not a valid host label: {}", space, e)))?;
        base.set_path("");
        Ok(base)
    }

    /// Native URL of an object
    pub fn object_location(&self, key: &str) -> String {
        let mut url = self.location_base.clone();
        url.set_path(key);
        url.to_string()
    }

    pub fn space(&self) -> &str {
        &self.space
    }

    fn format_range(start: u64, end: u64) -> String {
        format!("bytes={}-{}", start, end)
    }

    fn map_head_error(key: &str, err: SdkError<HeadObjectError>) -> SpacesError {
        if err.as_service_error().map_or(false, |e| e.is_not_found()) {
            SpacesError::not_found(key)
        } else {
            SpacesError::backend(err)
        }
    }

    fn map_get_error(key: &str, err: SdkError<GetObjectError>) -> SpacesError {
        if err.as_service_error().map_or(false, |e| e.is_no_such_key()) {
            SpacesError::not_found(key)
        } else {
            SpacesError::backend(err)
        }
    }
}

#[async_trait]
impl ObjectStore for SpacesStore {
    async fn put(&self, object: PutObject) -> SpacesResult<PutOutput> {
        let PutObject {
            key,
            body,
            content_type,
            acl,
            cache_control,
            content_disposition,
            metadata,
        } = object;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.space)
            .key(&key)
            .body(AwsByteStream::from(body))
            .acl(ObjectCannedAcl::from(acl.as_str()))
            .cache_control(cache_control);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }
        if let Some(disposition) = content_disposition {
            request = request.content_disposition(disposition);
        }
        for (name, value) in metadata {
            request = request.metadata(name, value);
        }

        let result = request.send().await.map_err(SpacesError::backend)?;

        Ok(PutOutput {
            location: self.object_location(&key),
            key,
            etag: result.e_tag().map(str::to_string),
        })
    }

    async fn delete(&self, key: &str) -> SpacesResult<()> {
        self.client
            .delete_object()
            .bucket(&self.space)
            .key(key)
            .send()
            .await
            .map_err(SpacesError::backend)?;
        Ok(())
    }

    async fn head(&self, key: &str) -> SpacesResult<ObjectHead> {
        let result = self
            .client
            .head_object()
            .bucket(&self.space)
            .key(key)
            .send()
            .await
            .map_err(|e| Self::map_head_error(key, e))?;

        Ok(ObjectHead {
            size_bytes: result.content_length().unwrap_or(0).max(0) as u64,
            content_type: result.content_type().map(str::to_string),
            etag: result.e_tag().map(str::to_string),
            last_modified: result.last_modified().map(|dt| dt.secs()),
            metadata: result
                .metadata()
                .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default(),
        })
    }

    async fn get_range(&self, key: &str, start: u64, end: u64) -> SpacesResult<Bytes> {
        let result = self
            .client
            .get_object()
            .bucket(&self.space)
            .key(key)
            .range(Self::format_range(start, end))
            .send()
            .await
            .map_err(|e| Self::map_get_error(key, e))?;

        let body = result.body.collect().await.map_err(SpacesError::backend)?;
        Ok(body.into_bytes())
    }
}
