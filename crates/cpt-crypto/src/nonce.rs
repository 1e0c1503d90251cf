//! # Anti-Replay Nonces
//!
//! Hex tokens drawn from the OS entropy source. There is no fallback
//! generator: if the OS cannot supply entropy the call fails.

use crate::CryptoError;
use rand::rngs::OsRng;
use rand::RngCore;

/// Largest nonce a caller may request, in hex characters.
pub const MAX_NONCE_LENGTH: usize = 256;

/// Source of unpredictable, fixed-length hex nonces.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonceSource;

impl NonceSource {
    /// Create a nonce source.
    pub fn new() -> Self {
        Self
    }

    /// Produce a fresh nonce of exactly `length` lowercase hex characters.
    ///
    /// Every call reads the OS entropy source; nothing is cached between calls.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidNonceLength` if `length` is zero or above `MAX_NONCE_LENGTH`
    /// - `CryptoError::EntropyUnavailable` if the OS entropy source fails
    pub fn next(&self, length: usize) -> Result<String, CryptoError> {
        if length == 0 || length > MAX_NONCE_LENGTH {
            return Err(CryptoError::InvalidNonceLength(length));
        }

        let mut bytes = vec![0u8; length.div_ceil(2)];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))?;

        let mut nonce = hex::encode(&bytes);
        nonce.truncate(length);
        Ok(nonce)
    }
}

/// Fill `buf` from the OS entropy source.
pub(crate) fn fill_from_os(buf: &mut [u8]) -> Result<(), CryptoError> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))
}
