//! # Signed-URL Protocol
//!
//! Keyed MAC over a canonical payload string, plus the self-contained
//! token format carried in signed URL query parameters. Used by the local
//! backend to issue URLs and by the transfer endpoint to verify them.

mod token;

pub use token::{SignedToken, DEFAULT_VALIDITY_SECS};

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::storage::errors::{StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies canonical payload strings with a process-wide secret.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
}

impl fmt::Debug for UrlSigner {
    // key material never appears in debug output
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}

impl UrlSigner {
    /// Key material is required up front; an empty secret is a
    /// configuration error surfaced at startup, not per call.
    pub fn new(secret: impl Into<Vec<u8>>) -> StorageResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(StorageError::Config("signing secret key is not set".to_string()));
        }
        Ok(Self { secret })
    }

    /// HMAC-SHA256 over the UTF-8 bytes of `payload`, lowercase hex.
    pub fn sign(&self, payload: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(payload.as_bytes());
        format!("{:x}", mac.finalize().into_bytes())
    }

    /// Recompute the MAC and compare in constant time.
    pub fn verify(&self, payload: &str, candidate: &str) -> bool {
        let expected = self.sign(payload);
        expected.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}
