use crate::domain::model::{
    CLEANUP_TAG_KEY, CLEANUP_TAG_VALUE, LIFECYCLE_EXPIRATION_DAYS, LIFECYCLE_RULE_ID,
};
use crate::utils::error::{Result, StorageError};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::types::{
    BucketLifecycleConfiguration, ExpirationStatus, LifecycleExpiration, LifecycleRule,
    LifecycleRuleFilter, Tag,
};
use aws_sdk_s3::Client as S3Client;

const NO_SUCH_LIFECYCLE_CONFIGURATION: &str = "NoSuchLifecycleConfiguration";

pub(crate) fn cleanup_tag() -> Result<Tag> {
    Ok(Tag::builder()
        .key(CLEANUP_TAG_KEY)
        .value(CLEANUP_TAG_VALUE)
        .build()?)
}

/// Expire anything carrying the cleanup tag after two days.
pub(crate) fn cleanup_rule() -> Result<LifecycleRule> {
    let filter = LifecycleRuleFilter::builder().tag(cleanup_tag()?).build();

    Ok(LifecycleRule::builder()
        .id(LIFECYCLE_RULE_ID)
        .status(ExpirationStatus::Enabled)
        .filter(filter)
        .expiration(
            LifecycleExpiration::builder()
                .days(LIFECYCLE_EXPIRATION_DAYS)
                .build(),
        )
        .build()?)
}

pub(crate) fn has_cleanup_rule(rules: &[LifecycleRule]) -> bool {
    rules.iter().any(|rule| rule.id() == Some(LIFECYCLE_RULE_ID))
}

/// HeadBucket 探測：任何失敗（包含權限不足）都回報為 bucket 不存在
pub(crate) async fn probe_bucket(client: &S3Client, bucket: &str) -> Result<()> {
    client
        .head_bucket()
        .bucket(bucket)
        .send()
        .await
        .map(|_| ())
        .map_err(|err| {
            let detail = DisplayErrorContext(&err).to_string();
            tracing::warn!(bucket, %detail, "Bucket probe failed");
            StorageError::BucketNotFound {
                bucket: bucket.to_string(),
                detail,
            }
        })
}

/// Installs the cleanup rule unless a rule with the same ID exists.
/// Other rules already on the bucket are sent back unchanged.
/// Returns whether a rule was created.
pub(crate) async fn ensure_cleanup_rule(client: &S3Client, bucket: &str) -> Result<bool> {
    let existing = match client
        .get_bucket_lifecycle_configuration()
        .bucket(bucket)
        .send()
        .await
    {
        Ok(output) => output.rules().to_vec(),
        Err(err) if err.code() == Some(NO_SUCH_LIFECYCLE_CONFIGURATION) => {
            tracing::debug!(bucket, "No lifecycle configuration on bucket yet");
            Vec::new()
        }
        Err(err) => return Err(StorageError::service("GetBucketLifecycleConfiguration", err)),
    };

    if has_cleanup_rule(&existing) {
        tracing::debug!(bucket, rule = LIFECYCLE_RULE_ID, "Lifecycle rule already present");
        return Ok(false);
    }

    let mut rules = existing;
    rules.push(cleanup_rule()?);
    let configuration = BucketLifecycleConfiguration::builder()
        .set_rules(Some(rules))
        .build()?;

    client
        .put_bucket_lifecycle_configuration()
        .bucket(bucket)
        .lifecycle_configuration(configuration)
        .send()
        .await
        .map_err(|err| StorageError::service("PutBucketLifecycleConfiguration", err))?;

    tracing::info!(
        bucket,
        rule = LIFECYCLE_RULE_ID,
        days = LIFECYCLE_EXPIRATION_DAYS,
        "Created lifecycle rule for cleanup-tagged objects"
    );
    Ok(true)
}
