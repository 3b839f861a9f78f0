use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Tag key that opts an object into lifecycle expiration.
pub const CLEANUP_TAG_KEY: &str = "adminforth-candidate-for-cleanup";
pub const CLEANUP_TAG_VALUE: &str = "true";
/// `CLEANUP_TAG_KEY=CLEANUP_TAG_VALUE`, as sent in the `x-amz-tagging` header.
pub const CLEANUP_TAG_ASSIGNMENT: &str = "adminforth-candidate-for-cleanup=true";
pub const TAGGING_HEADER: &str = "x-amz-tagging";

/// ID of the bucket lifecycle rule that expires tagged objects.
pub const LIFECYCLE_RULE_ID: &str = "adminforth-unused-cleaner";
pub const LIFECYCLE_EXPIRATION_DAYS: i32 = 2;

pub const DEFAULT_EXPIRES_IN: Duration = Duration::from_secs(3600);
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Object ACL applied to uploads. Also decides public vs signed downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AclMode {
    #[default]
    #[serde(rename = "private")]
    Private,
    #[serde(rename = "public-read")]
    PublicRead,
}

impl AclMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AclMode::Private => "private",
            AclMode::PublicRead => "public-read",
        }
    }
}

impl std::fmt::Display for AclMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upload authorization handed back to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSignedUrl {
    pub upload_url: String,
    /// Headers the uploader must add literally. Always just the tagging header.
    pub upload_extra_params: HashMap<String, String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Uninitialized,
    Ready,
}
