use aws_sdk_s3::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration parsing error: {message}")]
    ConfigParseError { message: String },

    /// HeadBucket 探測失敗一律回報為此錯誤，原始原因保留在 `detail`
    #[error("Bucket {bucket} does not exist")]
    BucketNotFound { bucket: String, detail: String },

    #[error("Storage client is not initialized, call setup_lifecycle before {operation}")]
    NotInitialized { operation: &'static str },

    #[error("S3 {operation} failed: {message}")]
    ServiceError {
        operation: &'static str,
        code: Option<String>,
        message: String,
    },

    #[error("Invalid request: {message}")]
    RequestError { message: String },

    #[error("Failed to presign request: {message}")]
    PresignError { message: String },

    #[error("Failed to read body of {key}: {message}")]
    StreamError { key: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    NotFound,
    State,
    Service,
    Io,
}

impl StorageError {
    /// 將 SDK 錯誤轉為 `ServiceError`，保留服務端錯誤碼
    pub(crate) fn service<E>(operation: &'static str, err: E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error,
    {
        let code = err.code().map(str::to_owned);
        let message = match err.message() {
            Some(message) => message.to_owned(),
            None => DisplayErrorContext(&err).to_string(),
        };
        StorageError::ServiceError {
            operation,
            code,
            message,
        }
    }

    /// Raw S3 error code, if the service returned one.
    pub fn code(&self) -> Option<&str> {
        match self {
            StorageError::ServiceError { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            StorageError::MissingConfigError { .. }
            | StorageError::InvalidConfigValueError { .. }
            | StorageError::ConfigParseError { .. } => ErrorCategory::Configuration,
            StorageError::BucketNotFound { .. } => ErrorCategory::NotFound,
            StorageError::ServiceError { code, .. }
                if matches!(code.as_deref(), Some("NoSuchKey" | "NotFound")) =>
            {
                ErrorCategory::NotFound
            }
            StorageError::NotInitialized { .. } => ErrorCategory::State,
            StorageError::IoError(_) | StorageError::StreamError { .. } => ErrorCategory::Io,
            StorageError::ServiceError { .. }
            | StorageError::RequestError { .. }
            | StorageError::PresignError { .. } => ErrorCategory::Service,
        }
    }
}

impl From<BuildError> for StorageError {
    fn from(err: BuildError) -> Self {
        StorageError::RequestError {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
