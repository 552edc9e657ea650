//! Signed download URLs for purchased files.
//!
//! Files live behind an external storage front. Buyers never see raw paths;
//! the API hands out short-lived URLs signed with HMAC-SHA256 over the path
//! and expiry, and the storage front verifies the same signature.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::config::StorageConfig;

type HmacSha256 = Hmac<Sha256>;

/// How long a signed download URL stays valid.
#[must_use]
pub fn download_url_ttl() -> Duration {
    Duration::hours(1)
}

/// Issues and verifies signed download URLs.
#[derive(Clone)]
pub struct StorageService {
    base_url: String,
    signing_secret: SecretString,
}

impl StorageService {
    /// Create a new storage service.
    #[must_use]
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            signing_secret: config.signing_secret.clone(),
        }
    }

    /// Build a signed URL for a stored file, valid for [`download_url_ttl`].
    #[must_use]
    pub fn signed_url(&self, file_path: &str, now: DateTime<Utc>) -> String {
        let expires = (now + download_url_ttl()).timestamp();
        let signature = self.sign(file_path, expires);
        format!(
            "{}/{}?expires={expires}&signature={signature}",
            self.base_url,
            file_path.trim_start_matches('/')
        )
    }

    /// Verify a signature produced by [`Self::signed_url`].
    ///
    /// Rejects expired URLs and any path or expiry tampering. Comparison is
    /// constant-time via the HMAC verify primitive.
    #[must_use]
    pub fn verify(
        &self,
        file_path: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> bool {
        if expires < now.timestamp() {
            return false;
        }

        let Ok(provided) = hex::decode(signature) else {
            return false;
        };

        let mut mac = self.keyed_mac();
        mac.update(Self::payload(file_path, expires).as_bytes());
        mac.verify_slice(&provided).is_ok()
    }

    fn sign(&self, file_path: &str, expires: i64) -> String {
        let mut mac = self.keyed_mac();
        mac.update(Self::payload(file_path, expires).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn keyed_mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        #[allow(clippy::expect_used)]
        HmacSha256::new_from_slice(self.signing_secret.expose_secret().as_bytes())
            .expect("HMAC key of any length is valid")
    }

    fn payload(file_path: &str, expires: i64) -> String {
        format!("{}:{expires}", file_path.trim_start_matches('/'))
    }
}
