//! Self-contained signed transfer tokens.
//!
//! A token authorizes exactly one operation on one object. It is never
//! persisted; verification needs only the signing secret.

use chrono::{DateTime, Duration, Utc};

use super::UrlSigner;
use crate::storage::errors::{StorageError, StorageResult};

/// Validity window applied when the caller supplies no expiry.
pub const DEFAULT_VALIDITY_SECS: i64 = 3600;

/// One-operation access token carried in signed URL query parameters.
///
/// The signature covers exactly `path:expiry:content_type`; changing any
/// field invalidates it. Expiry is an absolute unix timestamp in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    pub path: String,
    pub expiry: i64,
    pub content_type: String,
    pub signature: String,
}

impl SignedToken {
    /// Canonical payload string the MAC is computed over.
    pub fn payload_for(path: &str, expiry: i64, content_type: &str) -> String {
        format!("{}:{}:{}", path, expiry, content_type)
    }

    pub fn payload(&self) -> String {
        Self::payload_for(&self.path, self.expiry, &self.content_type)
    }
}

impl UrlSigner {
    /// Issue a token for one transfer operation on one object.
    pub fn issue(
        &self,
        path: &str,
        content_type: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> SignedToken {
        let expires_at =
            expires_at.unwrap_or_else(|| Utc::now() + Duration::seconds(DEFAULT_VALIDITY_SECS));
        let expiry = expires_at.timestamp();
        let signature = self.sign(&SignedToken::payload_for(path, expiry, content_type));

        SignedToken {
            path: path.to_string(),
            expiry,
            content_type: content_type.to_string(),
            signature,
        }
    }

    /// Check a presented token: expiry window first, then the MAC.
    pub fn check(&self, token: &SignedToken) -> StorageResult<()> {
        if Utc::now().timestamp() > token.expiry {
            return Err(StorageError::UrlExpired);
        }

        if !self.verify(&token.payload(), &token.signature) {
            return Err(StorageError::InvalidSignature);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> UrlSigner {
        UrlSigner::new("token-test-secret").unwrap()
    }

    #[test]
    fn test_issue_and_check() {
        let signer = signer();
        let token = signer.issue("u/42/book.epub", "application/epub+zip", None);

        assert!(signer.check(&token).is_ok());
    }

    #[test]
    fn test_default_validity_window() {
        let signer = signer();
        let token = signer.issue("a/b", "text/plain", None);

        let delta = token.expiry - Utc::now().timestamp();
        assert!((DEFAULT_VALIDITY_SECS - 5..=DEFAULT_VALIDITY_SECS).contains(&delta));
    }

    #[test]
    fn test_expired_token_rejected_despite_valid_signature() {
        let signer = signer();
        let token = signer.issue("a/b", "text/plain", Some(Utc::now() - Duration::hours(1)));

        // the MAC itself is correct
        assert!(signer.verify(&token.payload(), &token.signature));
        assert!(matches!(signer.check(&token), Err(StorageError::UrlExpired)));
    }

    #[test]
    fn test_changing_path_invalidates() {
        let signer = signer();
        let mut token = signer.issue("a/b", "text/plain", None);
        token.path = "a/c".to_string();

        assert!(matches!(signer.check(&token), Err(StorageError::InvalidSignature)));
    }

    #[test]
    fn test_changing_expiry_invalidates() {
        let signer = signer();
        let mut token = signer.issue("a/b", "text/plain", None);
        token.expiry += 60;

        assert!(matches!(signer.check(&token), Err(StorageError::InvalidSignature)));
    }

    #[test]
    fn test_changing_content_type_invalidates() {
        let signer = signer();
        let mut token = signer.issue("a/b", "text/plain", None);
        token.content_type = "application/pdf".to_string();

        assert!(matches!(signer.check(&token), Err(StorageError::InvalidSignature)));
    }

    #[test]
    fn test_wrong_secret_invalidates() {
        let token = signer().issue("a/b", "text/plain", None);
        let other = UrlSigner::new("another-secret").unwrap();

        assert!(matches!(other.check(&token), Err(StorageError::InvalidSignature)));
    }
}
