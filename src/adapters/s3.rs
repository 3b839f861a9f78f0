use crate::adapters::lifecycle;
use crate::config::StorageConfig;
use crate::domain::model::{
    AdapterState, UploadSignedUrl, CLEANUP_TAG_ASSIGNMENT, DEFAULT_CONTENT_TYPE,
    DEFAULT_EXPIRES_IN, TAGGING_HEADER,
};
use crate::domain::ports::StorageAdapter;
use crate::utils::error::{Result, StorageError};
use crate::utils::validation::{validate_expires_in, Validate};
use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpRequest;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{ObjectCannedAcl, Tag, Tagging};
use aws_sdk_s3::Client as S3Client;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::OnceCell;

const ACL_HEADER: &str = "x-amz-acl";

/// S3-backed [`StorageAdapter`].
///
/// Starts Uninitialized. [`setup_lifecycle`](StorageAdapter::setup_lifecycle) builds the
/// client, and only after it succeeds do the service-backed operations work; before
/// that they return [`StorageError::NotInitialized`].
#[derive(Debug)]
pub struct S3StorageAdapter {
    config: StorageConfig,
    client: OnceCell<S3Client>,
}

impl S3StorageAdapter {
    pub fn new(config: StorageConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            client: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn state(&self) -> AdapterState {
        if self.client.initialized() {
            AdapterState::Ready
        } else {
            AdapterState::Uninitialized
        }
    }

    fn connect(&self) -> Result<S3Client> {
        let (access_key_id, secret_access_key) = self.config.credentials()?;
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None, // session token
            None, // expiration
            "storage-config",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.config.region.clone()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .force_path_style(self.config.force_path_style);

        if let Some(endpoint) = &self.config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Ok(S3Client::from_conf(builder.build()))
    }

    fn client(&self, operation: &'static str) -> Result<&S3Client> {
        self.client
            .get()
            .ok_or(StorageError::NotInitialized { operation })
    }

    fn presigning_config(expires_in: Option<Duration>) -> Result<(PresigningConfig, Duration)> {
        let expires_in = expires_in.unwrap_or(DEFAULT_EXPIRES_IN);
        validate_expires_in("expires_in", expires_in)?;
        let config =
            PresigningConfig::expires_in(expires_in).map_err(|e| StorageError::PresignError {
                message: e.to_string(),
            })?;
        Ok((config, expires_in))
    }

    /// Overwrites the full tag set of `key`.
    async fn put_tag_set(&self, operation: &'static str, key: &str, tags: Vec<Tag>) -> Result<()> {
        let client = self.client(operation)?;
        let tagging = Tagging::builder().set_tag_set(Some(tags)).build()?;

        client
            .put_object_tagging()
            .bucket(&self.config.bucket)
            .key(key)
            .tagging(tagging)
            .send()
            .await
            .map_err(|err| StorageError::service("PutObjectTagging", err))?;
        Ok(())
    }
}

/// 把 `x-amz-acl` 從 header 移到 query string，簽名後 uploader 只需帶 tagging header
fn hoist_acl_into_query(req: &mut HttpRequest, acl: &'static str) {
    let separator = if req.uri().contains('?') { '&' } else { '?' };
    let uri = format!("{}{}{}={}", req.uri(), separator, ACL_HEADER, acl);

    match req.set_uri(uri) {
        Ok(()) => {
            req.headers_mut().remove(ACL_HEADER);
        }
        // 保留 header 形式：簽名仍然有效，只是 uploader 需要多帶一個 header
        Err(e) => tracing::warn!(error = %e, "Failed to move ACL into presigned query"),
    }
}

#[async_trait]
impl StorageAdapter for S3StorageAdapter {
    async fn get_upload_signed_url(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Option<Duration>,
    ) -> Result<UploadSignedUrl> {
        let client = self.client("get_upload_signed_url")?;
        let (presigning, expires_in) = Self::presigning_config(expires_in)?;

        // x-amz-tagging stays a plain header; the uploader must send it verbatim.
        // The ACL is fixed by the URL itself.
        let acl = self.config.s3_acl.as_str();
        let presigned = client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .acl(ObjectCannedAcl::from(acl))
            .tagging(CLEANUP_TAG_ASSIGNMENT)
            .customize()
            .mutate_request(move |req| hoist_acl_into_query(req, acl))
            .presigned(presigning)
            .await
            .map_err(|err| StorageError::PresignError {
                message: DisplayErrorContext(&err).to_string(),
            })?;

        tracing::debug!(key, content_type, expires_in = expires_in.as_secs(), "Presigned upload");

        Ok(UploadSignedUrl {
            upload_url: presigned.uri().to_string(),
            upload_extra_params: HashMap::from([(
                TAGGING_HEADER.to_string(),
                CLEANUP_TAG_ASSIGNMENT.to_string(),
            )]),
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in.as_secs() as i64),
        })
    }

    async fn get_download_url(&self, key: &str, expires_in: Option<Duration>) -> Result<String> {
        if self.config.is_public_read() {
            return self.config.public_object_url(key);
        }

        let client = self.client("get_download_url")?;
        let (presigning, expires_in) = Self::presigning_config(expires_in)?;

        let presigned = client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|err| StorageError::PresignError {
                message: DisplayErrorContext(&err).to_string(),
            })?;

        tracing::debug!(key, expires_in = expires_in.as_secs(), "Presigned download");
        Ok(presigned.uri().to_string())
    }

    async fn mark_key_for_deletion(&self, key: &str) -> Result<()> {
        self.put_tag_set("mark_key_for_deletion", key, vec![lifecycle::cleanup_tag()?])
            .await?;
        tracing::debug!(key, "Marked object for cleanup");
        Ok(())
    }

    async fn mark_key_for_not_deletion(&self, key: &str) -> Result<()> {
        // 整組標籤覆寫為空，其他標籤也會一併清除
        self.put_tag_set("mark_key_for_not_deletion", key, Vec::new())
            .await?;
        tracing::debug!(key, "Cleared cleanup tag");
        Ok(())
    }

    async fn setup_lifecycle(&self) -> Result<()> {
        let client = match self.client.get() {
            Some(client) => client.clone(),
            None => self.connect()?,
        };

        lifecycle::probe_bucket(&client, &self.config.bucket).await?;
        lifecycle::ensure_cleanup_rule(&client, &self.config.bucket).await?;

        // A concurrent setup may have published its client first; either one is fine.
        if self.client.set(client).is_ok() {
            tracing::info!(
                bucket = %self.config.bucket,
                region = %self.config.region,
                acl = %self.config.s3_acl,
                "✅ S3 storage adapter ready"
            );
        }
        Ok(())
    }

    fn object_can_be_accessed_publicly(&self) -> bool {
        self.config.is_public_read()
    }

    async fn get_key_as_data_url(&self, key: &str) -> Result<String> {
        let client = self.client("get_key_as_data_url")?;

        let output = client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StorageError::service("GetObject", err))?;

        let content_type = output
            .content_type()
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::StreamError {
                key: key.to_string(),
                message: e.to_string(),
            })?
            .into_bytes();

        Ok(format!("data:{};base64,{}", content_type, B64.encode(&data)))
    }
}
