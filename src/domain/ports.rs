use crate::domain::model::UploadSignedUrl;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Capability contract the host application calls into.
///
/// `expires_in: None` means [`DEFAULT_EXPIRES_IN`](crate::domain::model::DEFAULT_EXPIRES_IN).
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    async fn get_upload_signed_url(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Option<Duration>,
    ) -> Result<UploadSignedUrl>;

    async fn get_download_url(&self, key: &str, expires_in: Option<Duration>) -> Result<String>;

    /// Replaces the object's whole tag set with the cleanup tag.
    async fn mark_key_for_deletion(&self, key: &str) -> Result<()>;

    /// Replaces the object's whole tag set with an empty one.
    async fn mark_key_for_not_deletion(&self, key: &str) -> Result<()>;

    /// Connects, checks the bucket and installs the cleanup lifecycle rule.
    /// Safe to call on every startup.
    async fn setup_lifecycle(&self) -> Result<()>;

    fn object_can_be_accessed_publicly(&self) -> bool;

    /// Buffers the whole object in memory; callers must bound object size.
    async fn get_key_as_data_url(&self, key: &str) -> Result<String>;
}
