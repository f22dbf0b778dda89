//! # Storage Facade
//!
//! Single entry point consumed by the rest of the system. Chooses the
//! backend once at startup from configuration and delegates the unified
//! operation set; also derives canonical object paths for common
//! business cases.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{BackendKind, Config};
use crate::observability::Logger;

use super::backend::{ObjectBackend, ObjectMetadata, SaveOptions, SignedUrlOptions};
use super::errors::{StorageError, StorageResult};
use super::local::LocalBackend;
use super::s3::S3Backend;

/// Stored content renditions with canonical path extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    Original,
    Markdown,
    /// Markdown with annotations layered in. Keyed off the update time,
    /// since annotations change after the item is first saved.
    AnnotatedMarkdown,
}

impl ContentFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ContentFormat::Original => "original",
            ContentFormat::Markdown => "markdown",
            ContentFormat::AnnotatedMarkdown => "annotated",
        }
    }
}

/// Storage facade holding exactly one backend for the process lifetime.
#[derive(Debug, Clone)]
pub struct StorageService {
    backend: Arc<dyn ObjectBackend>,
}

impl StorageService {
    /// Build the service with the backend selected by configuration.
    /// The selection is immutable once made.
    pub async fn from_config(config: &Config) -> StorageResult<Self> {
        let kind = config
            .backend_kind()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        let backend: Arc<dyn ObjectBackend> = match kind {
            BackendKind::Local => Arc::new(LocalBackend::from_config(config)?),
            BackendKind::S3 => Arc::new(S3Backend::from_config(config).await?),
        };
        Logger::info("BACKEND_SELECTED", &[("backend", config.backend.as_str())]);

        Ok(Self { backend })
    }

    /// Wrap an already-built backend (used by tests and embedders).
    pub fn with_backend(backend: Arc<dyn ObjectBackend>) -> Self {
        Self { backend }
    }

    pub async fn save(&self, path: &str, data: &[u8], options: &SaveOptions) -> StorageResult<()> {
        self.backend.save(path, data, options).await
    }

    pub async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        self.backend.download(path).await
    }

    pub async fn exists(&self, path: &str) -> StorageResult<bool> {
        self.backend.exists(path).await
    }

    pub async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.backend.list_by_prefix(prefix).await
    }

    /// Number of stored objects under a prefix.
    pub async fn count_by_prefix(&self, prefix: &str) -> StorageResult<usize> {
        Ok(self.backend.list_by_prefix(prefix).await?.len())
    }

    pub async fn upload_signed_url(
        &self,
        path: &str,
        options: &SignedUrlOptions,
    ) -> StorageResult<String> {
        self.backend.upload_signed_url(path, options).await
    }

    pub async fn download_signed_url(
        &self,
        path: &str,
        options: &SignedUrlOptions,
    ) -> StorageResult<String> {
        self.backend.download_signed_url(path, options).await
    }

    pub async fn file_metadata(&self, path: &str) -> StorageResult<ObjectMetadata> {
        self.backend.file_metadata(path).await
    }
}

/// Canonical user upload location: `u/{owner}/{name}`.
pub fn upload_file_path(owner_id: &str, file_name: &str) -> String {
    format!("u/{}/{}", owner_id, file_name)
}

/// Canonical content rendition location:
/// `content/{owner}/{item}.{timestamp}.{ext}`.
///
/// The annotated rendition keys off `updated_at`; the rest key off
/// `saved_at`. A missing required timestamp is an error, not a guess.
pub fn content_file_path(
    owner_id: &str,
    item_id: &str,
    format: ContentFormat,
    saved_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
) -> StorageResult<String> {
    let stamp = match format {
        ContentFormat::AnnotatedMarkdown => updated_at,
        _ => saved_at,
    }
    .ok_or(StorageError::MissingTimestamp)?;

    Ok(format!(
        "content/{}/{}.{}.{}",
        owner_id,
        item_id,
        stamp.timestamp_millis(),
        format.extension()
    ))
}
