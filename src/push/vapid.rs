//! VAPID (Voluntary Application Server Identification) credentials
//!
//! VAPID keys authenticate this server to the browser vendors' push services.
//! They are supplied through configuration; `generate_vapid_keys` produces a
//! fresh pair for operators who don't have one yet.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

/// Uncompressed P-256 point length
const PUBLIC_KEY_LEN: usize = 65;
/// P-256 scalar length
const PRIVATE_KEY_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VapidError {
    #[error("VAPID {which} key is not valid base64url: {reason}")]
    InvalidEncoding { which: &'static str, reason: String },

    #[error("VAPID {which} key must be {expected} bytes, got {actual}")]
    InvalidLength {
        which: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("VAPID contact claim is empty")]
    MissingSubject,
}

/// Key pair and contact claim used to sign push requests
#[derive(Clone)]
pub struct VapidCredentials {
    /// The public key (shared with clients) - base64url encoded
    pub public_key: String,
    /// The private key (kept secret on server) - base64url encoded
    pub private_key: String,
    /// Contact claim (`mailto:` or `https:` URI)
    pub subject: String,
}

impl std::fmt::Debug for VapidCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapidCredentials")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("subject", &self.subject)
            .finish()
    }
}

impl VapidCredentials {
    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        contact: &str,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
            subject: normalize_subject(contact),
        }
    }

    /// Check that both keys decode to P-256 sized material
    pub fn validate(&self) -> Result<(), VapidError> {
        check_key("public", &self.public_key, PUBLIC_KEY_LEN)?;
        check_key("private", &self.private_key, PRIVATE_KEY_LEN)?;
        if self.subject.is_empty() {
            return Err(VapidError::MissingSubject);
        }
        Ok(())
    }
}

/// Push services expect a URI; a bare address becomes a `mailto:` URI.
fn normalize_subject(contact: &str) -> String {
    let contact = contact.trim();
    if contact.is_empty() || contact.starts_with("mailto:") || contact.starts_with("https:") {
        contact.to_string()
    } else {
        format!("mailto:{}", contact)
    }
}

fn check_key(which: &'static str, encoded: &str, expected: usize) -> Result<(), VapidError> {
    // Some key generators emit padded base64url
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .map_err(|e| VapidError::InvalidEncoding {
            which,
            reason: e.to_string(),
        })?;

    if bytes.len() != expected {
        return Err(VapidError::InvalidLength {
            which,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Freshly generated VAPID key pair, base64url encoded
#[derive(Debug, Clone)]
pub struct VapidKeyPair {
    pub public_key: String,
    pub private_key: String,
}

/// Generate a new VAPID key pair using P-256 curve
pub fn generate_vapid_keys() -> VapidKeyPair {
    use p256::ecdsa::SigningKey;
    use rand::rngs::OsRng;

    let signing_key = SigningKey::random(&mut OsRng);
    let private_key = URL_SAFE_NO_PAD.encode(signing_key.to_bytes());

    let public_key_bytes = signing_key.verifying_key().to_encoded_point(false);
    let public_key = URL_SAFE_NO_PAD.encode(public_key_bytes.as_bytes());

    VapidKeyPair {
        public_key,
        private_key,
    }
}
