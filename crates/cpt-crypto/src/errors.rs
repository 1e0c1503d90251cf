//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The OS entropy source could not be read
    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    /// Requested nonce length is zero
    #[error("Invalid nonce length: {0}")]
    InvalidNonceLength(usize),

    /// Key is on a curve other than secp256k1
    #[error("Unsupported curve: key must be on secp256k1")]
    UnsupportedCurve,

    /// Invalid public key
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Imported public key does not belong to the imported private key
    #[error("Public key does not match private key")]
    KeyMismatch,

    /// Key could not be serialized
    #[error("Key encoding failed: {0}")]
    KeyEncoding(String),

    /// Invalid signature format (not 128 hex characters of r || s)
    #[error("Invalid signature format")]
    InvalidSignatureFormat,
}
