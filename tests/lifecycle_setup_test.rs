use anyhow::Result;
use httpmock::prelude::*;
use httpmock::Method::HEAD;
use regex::Regex;
use s3_storage_adapter::{
    AclMode, AdapterState, ErrorCategory, S3StorageAdapter, StorageAdapter, StorageConfig,
    StorageError,
};

const NO_LIFECYCLE_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>NoSuchLifecycleConfiguration</Code><Message>The lifecycle configuration does not exist</Message><BucketName>assets</BucketName><RequestId>4442587FB7D0A2F9</RequestId></Error>"#;

const CLEANER_RULE_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<LifecycleConfiguration xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Rule><ID>adminforth-unused-cleaner</ID><Filter><Tag><Key>adminforth-candidate-for-cleanup</Key><Value>true</Value></Tag></Filter><Status>Enabled</Status><Expiration><Days>2</Days></Expiration></Rule></LifecycleConfiguration>"#;

const OTHER_RULE_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<LifecycleConfiguration xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Rule><ID>archive-logs</ID><Filter><Prefix>logs/</Prefix></Filter><Status>Enabled</Status><Expiration><Days>30</Days></Expiration></Rule></LifecycleConfiguration>"#;

const ACCESS_DENIED_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>AccessDenied</Code><Message>Access Denied</Message><RequestId>4442587FB7D0A2F9</RequestId></Error>"#;

/// Bucket-level requests arrive as `/assets` or `/assets/` under path-style addressing.
fn bucket_path() -> Regex {
    Regex::new(r"^/assets/?$").unwrap()
}

fn adapter_for(server: &MockServer) -> S3StorageAdapter {
    let config = StorageConfig::new("assets", "us-east-1")
        .with_credentials("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY")
        .with_acl(AclMode::Private)
        .with_endpoint(server.base_url(), true);
    S3StorageAdapter::new(config).unwrap()
}

/// 沒有任何 lifecycle 設定時，建立唯一一條清理規則
#[tokio::test]
async fn test_setup_creates_rule_when_bucket_has_no_lifecycle() -> Result<()> {
    let server = MockServer::start_async().await;

    let head = server
        .mock_async(|when, then| {
            when.method(HEAD).path_matches(bucket_path());
            then.status(200);
        })
        .await;
    let get_lifecycle = server
        .mock_async(|when, then| {
            when.method(GET)
                .path_matches(bucket_path())
                .query_param_exists("lifecycle");
            then.status(404)
                .header("Content-Type", "application/xml")
                .body(NO_LIFECYCLE_BODY);
        })
        .await;
    let put_lifecycle = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path_matches(bucket_path())
                .query_param_exists("lifecycle")
                .body_contains("<ID>adminforth-unused-cleaner</ID>")
                .body_contains("<Key>adminforth-candidate-for-cleanup</Key>")
                .body_contains("<Days>2</Days>")
                .body_contains("<Status>Enabled</Status>");
            then.status(200);
        })
        .await;

    let adapter = adapter_for(&server);
    assert_eq!(adapter.state(), AdapterState::Uninitialized);

    adapter.setup_lifecycle().await?;

    head.assert_async().await;
    get_lifecycle.assert_async().await;
    put_lifecycle.assert_async().await;
    assert_eq!(adapter.state(), AdapterState::Ready);
    Ok(())
}

/// 連續呼叫兩次 setup，規則只會被建立一次
#[tokio::test]
async fn test_setup_twice_is_idempotent() -> Result<()> {
    let server = MockServer::start_async().await;

    let head = server
        .mock_async(|when, then| {
            when.method(HEAD).path_matches(bucket_path());
            then.status(200);
        })
        .await;
    let mut missing_lifecycle = server
        .mock_async(|when, then| {
            when.method(GET)
                .path_matches(bucket_path())
                .query_param_exists("lifecycle");
            then.status(404)
                .header("Content-Type", "application/xml")
                .body(NO_LIFECYCLE_BODY);
        })
        .await;
    let put_lifecycle = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path_matches(bucket_path())
                .query_param_exists("lifecycle");
            then.status(200);
        })
        .await;

    let adapter = adapter_for(&server);
    adapter.setup_lifecycle().await?;
    assert_eq!(put_lifecycle.hits_async().await, 1);

    // 第一次 setup 之後 bucket 上已經有規則
    missing_lifecycle.delete_async().await;
    let existing_lifecycle = server
        .mock_async(|when, then| {
            when.method(GET)
                .path_matches(bucket_path())
                .query_param_exists("lifecycle");
            then.status(200)
                .header("Content-Type", "application/xml")
                .body(CLEANER_RULE_BODY);
        })
        .await;

    adapter.setup_lifecycle().await?;

    assert_eq!(head.hits_async().await, 2);
    existing_lifecycle.assert_async().await;
    assert_eq!(put_lifecycle.hits_async().await, 1);
    assert_eq!(adapter.state(), AdapterState::Ready);
    Ok(())
}

/// 既有的其他規則要一併送回，不可被覆蓋掉
#[tokio::test]
async fn test_setup_keeps_unrelated_rules() -> Result<()> {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(HEAD).path_matches(bucket_path());
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path_matches(bucket_path())
                .query_param_exists("lifecycle");
            then.status(200)
                .header("Content-Type", "application/xml")
                .body(OTHER_RULE_BODY);
        })
        .await;
    let put_lifecycle = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path_matches(bucket_path())
                .query_param_exists("lifecycle")
                .body_contains("<ID>archive-logs</ID>")
                .body_contains("<ID>adminforth-unused-cleaner</ID>");
            then.status(200);
        })
        .await;

    let adapter = adapter_for(&server);
    adapter.setup_lifecycle().await?;

    put_lifecycle.assert_async().await;
    Ok(())
}

/// HeadBucket 被拒（403）也一律回報為 bucket 不存在
#[tokio::test]
async fn test_bucket_probe_failure_is_normalized() -> Result<()> {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(HEAD).path_matches(bucket_path());
            then.status(403);
        })
        .await;
    let get_lifecycle = server
        .mock_async(|when, then| {
            when.method(GET)
                .path_matches(bucket_path())
                .query_param_exists("lifecycle");
            then.status(200)
                .header("Content-Type", "application/xml")
                .body(CLEANER_RULE_BODY);
        })
        .await;

    let adapter = adapter_for(&server);
    let err = adapter.setup_lifecycle().await.unwrap_err();

    match &err {
        StorageError::BucketNotFound { bucket, .. } => assert_eq!(bucket, "assets"),
        other => panic!("expected BucketNotFound, got {:?}", other),
    }
    assert_eq!(err.to_string(), "Bucket assets does not exist");
    assert_eq!(err.category(), ErrorCategory::NotFound);
    assert_eq!(get_lifecycle.hits_async().await, 0);
    assert_eq!(adapter.state(), AdapterState::Uninitialized);

    // 尚未 Ready，依賴服務的操作必須明確失敗
    assert!(matches!(
        adapter.mark_key_for_deletion("f/1.png").await,
        Err(StorageError::NotInitialized { .. })
    ));
    Ok(())
}

/// 除了 NoSuchLifecycleConfiguration 以外的錯誤都要往外拋
#[tokio::test]
async fn test_lifecycle_check_errors_propagate() -> Result<()> {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(HEAD).path_matches(bucket_path());
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path_matches(bucket_path())
                .query_param_exists("lifecycle");
            then.status(403)
                .header("Content-Type", "application/xml")
                .body(ACCESS_DENIED_BODY);
        })
        .await;
    let put_lifecycle = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path_matches(bucket_path())
                .query_param_exists("lifecycle");
            then.status(200);
        })
        .await;

    let adapter = adapter_for(&server);
    let err = adapter.setup_lifecycle().await.unwrap_err();

    assert!(matches!(err, StorageError::ServiceError { .. }));
    assert_eq!(err.code(), Some("AccessDenied"));
    assert_eq!(put_lifecycle.hits_async().await, 0);
    assert_eq!(adapter.state(), AdapterState::Uninitialized);
    Ok(())
}

/// 缺少憑證時在任何網路請求之前就失敗
#[tokio::test]
async fn test_missing_credentials_fail_before_network() -> Result<()> {
    let server = MockServer::start_async().await;

    let head = server
        .mock_async(|when, then| {
            when.method(HEAD).path_matches(bucket_path());
            then.status(200);
        })
        .await;

    let config = StorageConfig::new("assets", "us-east-1").with_endpoint(server.base_url(), true);
    let adapter = S3StorageAdapter::new(config)?;

    let err = adapter.setup_lifecycle().await.unwrap_err();

    assert!(matches!(
        err,
        StorageError::MissingConfigError { ref field } if field == "access_key_id"
    ));
    assert_eq!(head.hits_async().await, 0);
    assert_eq!(adapter.state(), AdapterState::Uninitialized);
    Ok(())
}
