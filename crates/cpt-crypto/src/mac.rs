//! # Shared-Secret Signing (HMAC-SHA512)
//!
//! Signs the base64 request payload under the secret issued alongside an
//! API key. The output is the lowercase hex of the 64-byte tag.

use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// HMAC-SHA512 signer.
///
/// Verification returns a plain `bool`; the authentication layer decides
/// which error a failed comparison becomes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymmetricSigner;

impl SymmetricSigner {
    /// Create a new signer.
    pub fn new() -> Self {
        Self
    }

    /// Compute `HMAC-SHA512(secret, message)` as lowercase hex.
    pub fn sign(&self, message: &[u8], secret: &[u8]) -> String {
        hex::encode(mac_for(message, secret).finalize().into_bytes())
    }

    /// Recompute the tag and compare with `candidate` in constant time.
    ///
    /// A candidate that is not valid hex is simply a mismatch.
    pub fn verify(&self, message: &[u8], secret: &[u8], candidate: &str) -> bool {
        let Ok(tag) = hex::decode(candidate.trim()) else {
            return false;
        };
        mac_for(message, secret).verify_slice(&tag).is_ok()
    }
}

fn mac_for(message: &[u8], secret: &[u8]) -> HmacSha512 {
    let mut mac =
        <HmacSha512 as Mac>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message);
    mac
}
