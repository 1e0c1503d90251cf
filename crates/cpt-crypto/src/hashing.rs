//! # SHA-256 Hashing
//!
//! One-shot SHA-256 helpers and the public key fingerprint type.

use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 output (256-bit).
pub type Hash = [u8; 32];

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hash data with SHA-256 and render as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// SHA-256 hex digest of a public key's canonical PEM encoding.
///
/// Sent as `cpt-ecc-pub` on signed calls instead of the key itself, and
/// echoed back by the server as the `success` field when an account is bound.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PublicKeyFingerprint(String);

impl PublicKeyFingerprint {
    /// Fingerprint a canonical (trimmed) PEM encoding.
    pub fn of_pem(pem: &str) -> Self {
        Self(sha256_hex(pem.trim().as_bytes()))
    }

    /// Wrap a hex digest received from elsewhere (normalized to lowercase).
    pub fn from_hex(hex_digest: &str) -> Self {
        Self(hex_digest.trim().to_ascii_lowercase())
    }

    /// Hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a hex digest received on the wire.
    pub fn matches(&self, candidate: &str) -> bool {
        use subtle::ConstantTimeEq;
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl fmt::Display for PublicKeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
