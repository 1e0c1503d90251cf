//! # Trust Anchor
//!
//! The server's secp256k1 public key, compiled into the binary. Every
//! server-signed message (account acknowledgments, ECC callbacks) is checked
//! against it and never against a key supplied at runtime by the peer.

use super::errors::ConfigError;
use cpt_crypto::{AsymmetricSigner, CryptoError, EccPublicKey};
use lazy_static::lazy_static;

/// Production server public key.
pub const SERVER_PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----
MFYwEAYHKoZIzj0CAQYFK4EEAAoDQgAEWp9wd4EuLhIZNaoUgZxQztSjrbqgTT0w
LBq8RwigNE6nOOXFEoGCjGfekugjrHWHUi8ms7bcfrowpaJKqMfZXg==
-----END PUBLIC KEY-----";

lazy_static! {
    static ref PRODUCTION_ANCHOR: Result<TrustAnchor, CryptoError> =
        EccPublicKey::from_pem(SERVER_PUBLIC_KEY_PEM).map(TrustAnchor);
}

/// Server public key used to verify inbound ECC-signed messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustAnchor(EccPublicKey);

impl TrustAnchor {
    /// The compiled-in production anchor.
    pub fn production() -> Result<Self, ConfigError> {
        PRODUCTION_ANCHOR.clone().map_err(ConfigError::InvalidKey)
    }

    /// Anchor from an explicit PEM (test servers, staging environments).
    pub fn from_pem(pem: &str) -> Result<Self, ConfigError> {
        EccPublicKey::from_pem(pem)
            .map(Self)
            .map_err(ConfigError::InvalidKey)
    }

    /// Anchor from an already-parsed key.
    pub fn from_public_key(public_key: EccPublicKey) -> Self {
        Self(public_key)
    }

    /// The anchor key.
    pub fn public_key(&self) -> &EccPublicKey {
        &self.0
    }

    /// Check a hex signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &str) -> bool {
        AsymmetricSigner::new().verify(message, signature, &self.0)
    }
}
