pub mod toml_config;

pub use crate::domain::model::AclMode;

use crate::utils::error::{Result, StorageError};
use crate::utils::validation::{
    validate_aws_region, validate_required_field, validate_s3_bucket_name, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Connection settings for one bucket. Immutable once handed to the adapter.
///
/// Field aliases accept the host's camelCase option names (`accessKeyId`, `s3ACL`, ...).
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    #[serde(default, alias = "accessKeyId")]
    pub access_key_id: Option<String>,
    #[serde(default, alias = "secretAccessKey", skip_serializing)]
    pub secret_access_key: Option<String>,
    #[serde(default, alias = "s3ACL", alias = "s3Acl")]
    pub s3_acl: AclMode,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...).
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default, alias = "forcePathStyle")]
    pub force_path_style: bool,
}

impl StorageConfig {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            access_key_id: None,
            secret_access_key: None,
            s3_acl: AclMode::default(),
            endpoint: None,
            force_path_style: false,
        }
    }

    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn with_acl(mut self, s3_acl: AclMode) -> Self {
        self.s3_acl = s3_acl;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>, force_path_style: bool) -> Self {
        self.endpoint = Some(endpoint.into());
        self.force_path_style = force_path_style;
        self
    }

    pub fn is_public_read(&self) -> bool {
        self.s3_acl == AclMode::PublicRead
    }

    /// 取得憑證；缺少或為空字串時回傳 `MissingConfigError`
    pub fn credentials(&self) -> Result<(&str, &str)> {
        let access_key_id = require_credential("access_key_id", &self.access_key_id)?;
        let secret_access_key = require_credential("secret_access_key", &self.secret_access_key)?;
        Ok((access_key_id, secret_access_key))
    }

    /// Direct, unsigned URL of an object. Only reachable when the object is public.
    pub fn public_object_url(&self, key: &str) -> Result<String> {
        let Some(endpoint) = &self.endpoint else {
            return Ok(format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ));
        };

        if self.force_path_style {
            return Ok(format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket,
                key
            ));
        }

        let base = Url::parse(endpoint).map_err(|e| StorageError::InvalidConfigValueError {
            field: "endpoint".to_string(),
            value: endpoint.clone(),
            reason: format!("Invalid URL format: {}", e),
        })?;
        let host = base
            .host_str()
            .ok_or_else(|| StorageError::InvalidConfigValueError {
                field: "endpoint".to_string(),
                value: endpoint.clone(),
                reason: "Endpoint has no host".to_string(),
            })?;
        let port = base.port().map(|p| format!(":{}", p)).unwrap_or_default();

        Ok(format!(
            "{}://{}.{}{}/{}",
            base.scheme(),
            self.bucket,
            host,
            port,
            key
        ))
    }
}

fn require_credential<'a>(field_name: &str, value: &'a Option<String>) -> Result<&'a str> {
    let value = validate_required_field(field_name, value)?;
    if value.trim().is_empty() {
        return Err(StorageError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    Ok(value)
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "***"),
            )
            .field("s3_acl", &self.s3_acl)
            .field("endpoint", &self.endpoint)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

impl Validate for StorageConfig {
    fn validate(&self) -> Result<()> {
        validate_s3_bucket_name("bucket", &self.bucket)?;
        validate_aws_region("region", &self.region)?;

        if let Some(endpoint) = &self.endpoint {
            validate_url("endpoint", endpoint)?;
        }

        // 憑證延後到 setup_lifecycle 才檢查
        tracing::debug!("Storage configuration validation passed");
        Ok(())
    }
}
