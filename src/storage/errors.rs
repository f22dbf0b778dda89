//! # Storage Errors

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Object storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    // Configuration errors (fatal at startup)
    #[error("Storage configuration error: {0}")]
    Config(String),

    // Validation errors
    #[error("Missing required parameters")]
    MissingParameter,

    #[error("Malformed expiry timestamp: {0}")]
    MalformedExpiry(String),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Missing timestamp for content path")]
    MissingTimestamp,

    // Authorization errors
    #[error("Signed URL expired")]
    UrlExpired,

    #[error("Invalid signature")]
    InvalidSignature,

    // Object errors
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Payload too large: {0} bytes (max: {1})")]
    PayloadTooLarge(u64, u64),

    // I/O errors
    #[error("Transfer timed out after {0} seconds")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            StorageError::Config(_) => 500,
            StorageError::MissingParameter => 400,
            StorageError::MalformedExpiry(_) => 400,
            StorageError::InvalidPath(_) => 400,
            StorageError::MissingTimestamp => 400,
            StorageError::UrlExpired => 403,
            StorageError::InvalidSignature => 403,
            StorageError::ObjectNotFound(_) => 404,
            StorageError::PayloadTooLarge(_, _) => 413,
            StorageError::Timeout(_) => 504,
            StorageError::Io(_) => 500,
            StorageError::Backend(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(StorageError::MissingParameter.status_code(), 400);
        assert_eq!(StorageError::UrlExpired.status_code(), 403);
        assert_eq!(StorageError::InvalidSignature.status_code(), 403);
        assert_eq!(StorageError::ObjectNotFound("a/b".into()).status_code(), 404);
        assert_eq!(StorageError::PayloadTooLarge(100, 50).status_code(), 413);
        assert_eq!(StorageError::Timeout(30).status_code(), 504);
        assert_eq!(StorageError::Io("disk".into()).status_code(), 500);
    }

    #[test]
    fn test_authorization_errors_share_status() {
        // both forbidden variants must be indistinguishable at the HTTP layer
        assert_eq!(
            StorageError::UrlExpired.status_code(),
            StorageError::InvalidSignature.status_code()
        );
    }
}
