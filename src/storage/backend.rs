//! # Object Backend Trait

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::errors::StorageResult;

/// Write options for a single object.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// MIME type recorded with the object.
    pub content_type: Option<String>,
    /// Upper bound on the write; the backend default applies when absent.
    pub timeout: Option<Duration>,
}

/// Options for issuing a signed transfer URL.
#[derive(Debug, Clone, Default)]
pub struct SignedUrlOptions {
    /// MIME type the token is bound to.
    pub content_type: Option<String>,
    /// Absolute expiry; the backend's default window applies when absent.
    pub expires_at: Option<DateTime<Utc>>,
    /// Alternate bucket (cloud backend only).
    pub bucket: Option<String>,
}

/// Integrity details returned after upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Hex-encoded content checksum.
    pub content_hash: String,
    /// Directly fetchable URL, when the backend can serve one.
    pub public_url: Option<String>,
}

/// Unified operation set both storage backends satisfy.
///
/// Object paths are opaque keys. Filesystem-backed implementations must
/// reject paths that resolve outside their base directory.
#[async_trait]
pub trait ObjectBackend: Send + Sync + std::fmt::Debug {
    /// Write data at path, overwriting existing content.
    async fn save(&self, path: &str, data: &[u8], options: &SaveOptions) -> StorageResult<()>;

    /// Read the full object.
    async fn download(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Probe for existence; absence is not an error.
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Object names under a prefix, ordered; empty when nothing matches.
    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Time-limited URL authorizing one upload of one object.
    async fn upload_signed_url(
        &self,
        path: &str,
        options: &SignedUrlOptions,
    ) -> StorageResult<String>;

    /// Time-limited URL authorizing one download of one object.
    async fn download_signed_url(
        &self,
        path: &str,
        options: &SignedUrlOptions,
    ) -> StorageResult<String>;

    /// Checksum and optional public URL for a stored object.
    async fn file_metadata(&self, path: &str) -> StorageResult<ObjectMetadata>;
}
