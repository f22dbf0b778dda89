//! # Local Filesystem Backend
//!
//! Maps object paths onto a sandboxed directory tree. Signed URLs are
//! emulated: each one points back at the transfer endpoint with an HMAC
//! token bound to the path, expiry, and content type.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::Config;
use crate::signing::UrlSigner;

use super::backend::{ObjectBackend, ObjectMetadata, SaveOptions, SignedUrlOptions};
use super::errors::{StorageError, StorageResult};

/// MIME type assumed when the caller declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Reject object paths that could escape the base directory.
///
/// Absolute paths and parent-directory components are refused outright;
/// `.` components are dropped. Returns the cleaned relative path.
pub fn sanitize_object_path(path: &str) -> StorageResult<PathBuf> {
    let raw = Path::new(path);
    if raw.is_absolute() {
        return Err(StorageError::InvalidPath(path.to_string()));
    }

    let mut clean = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return Err(StorageError::InvalidPath(path.to_string())),
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(StorageError::InvalidPath(path.to_string()));
    }

    Ok(clean)
}

/// Local filesystem storage backend
#[derive(Debug)]
pub struct LocalBackend {
    base_dir: PathBuf,
    signer: UrlSigner,
    public_base_url: Url,
    default_expiry: chrono::Duration,
    io_timeout: Duration,
}

impl LocalBackend {
    /// Build from configuration. Fails fast when the signing secret is
    /// absent or the public base URL does not parse.
    pub fn from_config(config: &Config) -> StorageResult<Self> {
        let signer = UrlSigner::new(config.local_secret_key.as_deref().unwrap_or_default())?;
        let public_base_url = Url::parse(&config.local_public_base_url)
            .map_err(|e| StorageError::Config(format!("invalid public base URL: {}", e)))?;

        Ok(Self {
            base_dir: PathBuf::from(&config.local_base_dir),
            signer,
            public_base_url,
            default_expiry: chrono::Duration::seconds(config.local_url_expiry_secs as i64),
            io_timeout: Duration::from_secs(config.transfer_timeout_secs),
        })
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    fn full_path(&self, path: &str) -> StorageResult<PathBuf> {
        Ok(self.base_dir.join(sanitize_object_path(path)?))
    }

    fn signed_url(
        &self,
        route: &str,
        path: &str,
        options: &SignedUrlOptions,
    ) -> StorageResult<String> {
        sanitize_object_path(path)?;

        let content_type = options.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
        let expires_at = options
            .expires_at
            .unwrap_or_else(|| Utc::now() + self.default_expiry);
        let token = self.signer.issue(path, content_type, Some(expires_at));

        let mut url = self.public_base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StorageError::Config("public base URL cannot be a base".to_string()))?;
            segments.pop_if_empty().push(route);
        }
        url.query_pairs_mut()
            .append_pair("filename", &token.path)
            .append_pair("expiry", &token.expiry.to_string())
            .append_pair("signature", &token.signature)
            .append_pair("contentType", &token.content_type);

        Ok(url.into())
    }
}

fn walk_tree(dir: &Path, base: &Path, names: &mut Vec<String>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk_tree(&path, base, names)?;
        } else if let Ok(rel) = path.strip_prefix(base) {
            let parts: Vec<&str> = rel
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .collect();
            names.push(parts.join("/"));
        }
    }
    Ok(())
}

#[async_trait]
impl ObjectBackend for LocalBackend {
    async fn save(&self, path: &str, data: &[u8], options: &SaveOptions) -> StorageResult<()> {
        let full_path = self.full_path(path)?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }

        let timeout = options.timeout.unwrap_or(self.io_timeout);
        match tokio::time::timeout(timeout, tokio::fs::write(&full_path, data)).await {
            Ok(result) => result.map_err(|e| StorageError::Io(e.to_string())),
            Err(_) => Err(StorageError::Timeout(timeout.as_secs())),
        }
    }

    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        let full_path = self.full_path(path)?;

        match tokio::time::timeout(self.io_timeout, tokio::fs::read(&full_path)).await {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::ObjectNotFound(path.to_string()))
            }
            Ok(Err(e)) => Err(StorageError::Io(e.to_string())),
            Err(_) => Err(StorageError::Timeout(self.io_timeout.as_secs())),
        }
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(self.full_path(path)?.exists())
    }

    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        if !self.base_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        walk_tree(&self.base_dir, &self.base_dir, &mut names)
            .map_err(|e| StorageError::Io(e.to_string()))?;

        names.retain(|name| name.starts_with(prefix));
        // directory iteration order is not portable
        names.sort();
        Ok(names)
    }

    async fn upload_signed_url(
        &self,
        path: &str,
        options: &SignedUrlOptions,
    ) -> StorageResult<String> {
        self.signed_url("upload", path, options)
    }

    async fn download_signed_url(
        &self,
        path: &str,
        options: &SignedUrlOptions,
    ) -> StorageResult<String> {
        self.signed_url("download", path, options)
    }

    async fn file_metadata(&self, path: &str) -> StorageResult<ObjectMetadata> {
        let data = self.download(path).await?;

        let mut hasher = Sha256::new();
        hasher.update(&data);

        Ok(ObjectMetadata {
            content_hash: format!("{:x}", hasher.finalize()),
            // no public serving capability; callers go through a signed URL
            public_url: None,
        })
    }
}
