//! # Configuration
//!
//! JSON configuration file with per-field defaults. Backend selection
//! happens here exactly once; the process must not start serving with an
//! invalid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which physical backend resolves object paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    S3,
}

/// Process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend selection: "local" or "s3".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Base directory for the local backend.
    #[serde(default = "default_base_dir")]
    pub local_base_dir: String,

    /// Signing secret for locally emulated signed URLs (required in local
    /// mode).
    #[serde(default)]
    pub local_secret_key: Option<String>,

    /// Public base URL the transfer endpoint is reachable at.
    #[serde(default = "default_public_base_url")]
    pub local_public_base_url: String,

    /// Bucket name (required in s3 mode).
    #[serde(default)]
    pub s3_bucket: Option<String>,

    #[serde(default)]
    pub s3_region: Option<String>,

    /// Custom endpoint for self-hosted S3-compatible stores.
    #[serde(default)]
    pub s3_endpoint: Option<String>,

    /// Public URL base when the bucket serves objects directly.
    #[serde(default)]
    pub s3_public_url_base: Option<String>,

    /// Signed-URL validity in seconds, local mode.
    #[serde(default = "default_local_url_expiry_secs")]
    pub local_url_expiry_secs: u64,

    /// Presigned-URL validity in seconds, s3 mode.
    #[serde(default = "default_s3_url_expiry_secs")]
    pub s3_url_expiry_secs: u64,

    /// Upper bound on a single read or write, seconds.
    #[serde(default = "default_transfer_timeout_secs")]
    pub transfer_timeout_secs: u64,

    /// Transfer endpoint request body cap, bytes.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,

    /// HTTP bind host.
    #[serde(default = "default_http_host")]
    pub http_host: String,

    /// HTTP bind port.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// CORS allowed origins; empty means permissive.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_backend() -> String {
    "local".to_string()
}

fn default_base_dir() -> String {
    "/tmp/blobgate-objects".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8090".to_string()
}

fn default_local_url_expiry_secs() -> u64 {
    3600
}

fn default_s3_url_expiry_secs() -> u64 {
    900
}

fn default_transfer_timeout_secs() -> u64 {
    30
}

fn default_max_payload_bytes() -> usize {
    8 * 1024 * 1024 // 8MB
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8090
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            local_base_dir: default_base_dir(),
            local_secret_key: None,
            local_public_base_url: default_public_base_url(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            s3_public_url_base: None,
            local_url_expiry_secs: default_local_url_expiry_secs(),
            s3_url_expiry_secs: default_s3_url_expiry_secs(),
            transfer_timeout_secs: default_transfer_timeout_secs(),
            max_payload_bytes: default_max_payload_bytes(),
            http_host: default_http_host(),
            http_port: default_http_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn backend_kind(&self) -> ConfigResult<BackendKind> {
        match self.backend.as_str() {
            "local" => Ok(BackendKind::Local),
            "s3" => Ok(BackendKind::S3),
            other => Err(ConfigError::Invalid(format!(
                "unknown backend '{}', expected 'local' or 's3'",
                other
            ))),
        }
    }

    /// Validate before serving; every failure here is fatal.
    pub fn validate(&self) -> ConfigResult<()> {
        match self.backend_kind()? {
            BackendKind::Local => {
                if self.local_secret_key.as_deref().unwrap_or("").is_empty() {
                    return Err(ConfigError::Invalid(
                        "local backend requires local_secret_key".to_string(),
                    ));
                }
                if Url::parse(&self.local_public_base_url).is_err() {
                    return Err(ConfigError::Invalid(format!(
                        "local_public_base_url is not a valid URL: {}",
                        self.local_public_base_url
                    )));
                }
            }
            BackendKind::S3 => {
                if self.s3_bucket.as_deref().unwrap_or("").is_empty() {
                    return Err(ConfigError::Invalid(
                        "s3 backend requires s3_bucket".to_string(),
                    ));
                }
            }
        }

        if self.max_payload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_payload_bytes must be positive".to_string(),
            ));
        }
        if self.transfer_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "transfer_timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_backend_requires_secret() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            local_secret_key: Some("secret".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_s3_backend_requires_bucket() {
        let config = Config {
            backend: "s3".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            backend: "s3".to_string(),
            s3_bucket: Some("uploads".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let config = Config {
            backend: "ftp".to_string(),
            ..Config::default()
        };
        assert!(config.backend_kind().is_err());
    }

    #[test]
    fn test_invalid_public_base_url_rejected() {
        let config = Config {
            local_secret_key: Some("secret".to_string()),
            local_public_base_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_defaults_applied_on_parse() {
        let config: Config =
            serde_json::from_str(r#"{"backend": "s3", "s3_bucket": "uploads"}"#).unwrap();

        assert_eq!(config.s3_url_expiry_secs, 900);
        assert_eq!(config.local_url_expiry_secs, 3600);
        assert_eq!(config.transfer_timeout_secs, 30);
        assert_eq!(config.max_payload_bytes, 8 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = Config {
            http_port: 8080,
            ..Config::default()
        };
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
    }
}
