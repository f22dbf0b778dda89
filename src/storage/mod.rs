//! # Object Storage
//!
//! Pluggable object storage: one operation set backed by either a
//! sandboxed local directory or an S3-compatible bucket, selected once
//! at process start.

pub mod backend;
pub mod errors;
pub mod local;
pub mod s3;
pub mod service;

pub use backend::{ObjectBackend, ObjectMetadata, SaveOptions, SignedUrlOptions};
pub use errors::{StorageError, StorageResult};
pub use local::LocalBackend;
pub use s3::S3Backend;
pub use service::{content_file_path, upload_file_path, ContentFormat, StorageService};
