pub mod adapters;
pub mod config;
pub mod domain;
pub mod utils;

pub use adapters::S3StorageAdapter;
pub use config::{AclMode, StorageConfig};
pub use domain::model::{AdapterState, UploadSignedUrl};
pub use domain::ports::StorageAdapter;
pub use utils::error::{ErrorCategory, Result, StorageError};
