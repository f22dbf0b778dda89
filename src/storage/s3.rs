//! # Cloud Object Backend
//!
//! Delegates the operation set to an S3-compatible object store. Signed
//! URLs are provider-native presigned requests, so the transfer endpoint
//! is never involved in this mode.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};

use crate::config::Config;

use super::backend::{ObjectBackend, ObjectMetadata, SaveOptions, SignedUrlOptions};
use super::errors::{StorageError, StorageResult};

/// Default presign validity, matching the provider's short-lived URL
/// convention.
const DEFAULT_PRESIGN_SECS: u64 = 900;

/// S3-compatible storage backend (AWS S3, Minio, Backblaze, etc.)
#[derive(Debug)]
pub struct S3Backend {
    client: Client,
    bucket: String,
    public_url_base: Option<String>,
    default_presign: Duration,
    io_timeout: Duration,
}

impl S3Backend {
    /// Create from an existing SDK client.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_url_base: None,
            default_presign: Duration::from_secs(DEFAULT_PRESIGN_SECS),
            io_timeout: Duration::from_secs(30),
        }
    }

    /// Build from configuration, resolving credentials and region from the
    /// ambient environment. Fails fast when no bucket is configured.
    pub async fn from_config(config: &Config) -> StorageResult<Self> {
        let bucket = config
            .s3_bucket
            .clone()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| StorageError::Config("s3 backend requires a bucket name".to_string()))?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = config.s3_region.clone() {
            loader = loader.region(Region::new(region));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = config.s3_endpoint.clone() {
            // path-style addressing for self-hosted S3-compatible stores
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        Ok(Self {
            client,
            bucket,
            public_url_base: config.s3_public_url_base.clone(),
            default_presign: Duration::from_secs(config.s3_url_expiry_secs),
            io_timeout: Duration::from_secs(config.transfer_timeout_secs),
        })
    }

    fn bucket_for<'a>(&'a self, options: &'a SignedUrlOptions) -> &'a str {
        options.bucket.as_deref().unwrap_or(&self.bucket)
    }

    fn presigning_config(&self, options: &SignedUrlOptions) -> StorageResult<PresigningConfig> {
        let window = presign_window(options.expires_at, self.default_presign)?;
        PresigningConfig::expires_in(window)
            .map_err(|e| StorageError::Backend(format!("presigning config: {}", e)))
    }
}

/// Canonical expiry unit is seconds; the SDK wants a duration from now,
/// so absolute expiries are converted here and rejected once past.
fn presign_window(
    expires_at: Option<DateTime<Utc>>,
    default: Duration,
) -> StorageResult<Duration> {
    match expires_at {
        Some(at) => {
            let remaining = at.timestamp() - Utc::now().timestamp();
            if remaining <= 0 {
                return Err(StorageError::UrlExpired);
            }
            Ok(Duration::from_secs(remaining as u64))
        }
        None => Ok(default),
    }
}

fn is_not_found<E>(err: &SdkError<E>) -> bool {
    matches!(err, SdkError::ServiceError(e) if e.raw().status().as_u16() == 404)
}

/// The ETag arrives quoted; the checksum inside is already hex.
fn strip_etag_quotes(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

fn join_public_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn save(&self, path: &str, data: &[u8], options: &SaveOptions) -> StorageResult<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(data.to_vec()));
        if let Some(content_type) = &options.content_type {
            request = request.content_type(content_type);
        }

        let timeout = options.timeout.unwrap_or(self.io_timeout);
        match tokio::time::timeout(timeout, request.send()).await {
            Ok(result) => {
                result.map_err(|e| StorageError::Backend(format!("S3 PUT failed: {}", e)))?;
                Ok(())
            }
            Err(_) => Err(StorageError::Timeout(timeout.as_secs())),
        }
    }

    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                if is_not_found(&e) {
                    StorageError::ObjectNotFound(path.to_string())
                } else {
                    StorageError::Backend(format!("S3 GET failed: {}", e))
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("failed to read object body: {}", e)))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(StorageError::Backend(format!("S3 HEAD failed: {}", e))),
        }
    }

    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StorageError::Backend(format!("S3 LIST failed: {}", e)))?;

            if let Some(contents) = response.contents {
                for object in contents {
                    if let Some(key) = object.key {
                        names.push(key);
                    }
                }
            }

            match response.next_continuation_token {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        Ok(names)
    }

    async fn upload_signed_url(
        &self,
        path: &str,
        options: &SignedUrlOptions,
    ) -> StorageResult<String> {
        let mut request = self
            .client
            .put_object()
            .bucket(self.bucket_for(options))
            .key(path);
        if let Some(content_type) = &options.content_type {
            request = request.content_type(content_type);
        }

        let presigned = request
            .presigned(self.presigning_config(options)?)
            .await
            .map_err(|e| StorageError::Backend(format!("S3 presign failed: {}", e)))?;

        Ok(presigned.uri().to_string())
    }

    async fn download_signed_url(
        &self,
        path: &str,
        options: &SignedUrlOptions,
    ) -> StorageResult<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(self.bucket_for(options))
            .key(path)
            .presigned(self.presigning_config(options)?)
            .await
            .map_err(|e| StorageError::Backend(format!("S3 presign failed: {}", e)))?;

        Ok(presigned.uri().to_string())
    }

    async fn file_metadata(&self, path: &str) -> StorageResult<ObjectMetadata> {
        let response = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                if is_not_found(&e) {
                    StorageError::ObjectNotFound(path.to_string())
                } else {
                    StorageError::Backend(format!("S3 HEAD failed: {}", e))
                }
            })?;

        let content_hash = response
            .e_tag
            .as_deref()
            .map(strip_etag_quotes)
            .unwrap_or_default();
        let public_url = self
            .public_url_base
            .as_deref()
            .map(|base| join_public_url(base, path));

        Ok(ObjectMetadata {
            content_hash,
            public_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_presign_window_defaults() {
        let window = presign_window(None, Duration::from_secs(900)).unwrap();
        assert_eq!(window, Duration::from_secs(900));
    }

    #[test]
    fn test_presign_window_from_absolute_expiry() {
        let at = Utc::now() + ChronoDuration::seconds(600);
        let window = presign_window(Some(at), Duration::from_secs(900)).unwrap();
        assert!((595..=600).contains(&window.as_secs()));
    }

    #[test]
    fn test_presign_window_rejects_past_expiry() {
        let at = Utc::now() - ChronoDuration::seconds(1);
        assert!(matches!(
            presign_window(Some(at), Duration::from_secs(900)),
            Err(StorageError::UrlExpired)
        ));
    }

    #[test]
    fn test_strip_etag_quotes() {
        assert_eq!(
            strip_etag_quotes("\"9a0364b9e99bb480dd25e1f0284c8555\""),
            "9a0364b9e99bb480dd25e1f0284c8555"
        );
        assert_eq!(strip_etag_quotes("bare"), "bare");
    }

    #[test]
    fn test_join_public_url() {
        assert_eq!(
            join_public_url("https://cdn.example.com/", "u/42/a.png"),
            "https://cdn.example.com/u/42/a.png"
        );
        assert_eq!(
            join_public_url("https://cdn.example.com", "u/42/a.png"),
            "https://cdn.example.com/u/42/a.png"
        );
    }
}
