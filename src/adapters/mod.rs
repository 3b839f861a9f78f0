// Adapters layer: concrete implementations of the domain ports against external systems.

mod lifecycle;
pub mod s3;

pub use s3::S3StorageAdapter;
