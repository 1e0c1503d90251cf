//! # ECDSA Signatures (secp256k1)
//!
//! Per-client keypairs and the server trust anchor both live on secp256k1.
//! Messages are hashed with SHA-256 and signed with RFC 6979 nonces.
//!
//! ## Wire Format
//!
//! - Signatures: `r || s`, 32 bytes each, big-endian, lowercase hex (128 chars)
//! - Public keys: SubjectPublicKeyInfo PEM, uncompressed point, trimmed
//! - Private keys: SEC1 `EC PRIVATE KEY` PEM (PKCS#8 accepted on import)
//!
//! ## Curve Enforcement
//!
//! Keys are parsed into k256 types, so a key on any other curve is rejected
//! when it is imported. Once an `EccPublicKey` exists it is on secp256k1.

use crate::hashing::PublicKeyFingerprint;
use crate::nonce::fill_from_os;
use crate::CryptoError;
use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use k256::pkcs8::{spki, DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use k256::SecretKey;
use std::fmt;
use zeroize::Zeroizing;

/// ECDSA signature (64 bytes, r||s format).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EccSignature([u8; 64]);

impl EccSignature {
    /// Create from bytes (64 bytes).
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Parse the 128-character hex form.
    pub fn from_hex(signature: &str) -> Result<Self, CryptoError> {
        let mut bytes = [0u8; 64];
        hex::decode_to_slice(signature.trim(), &mut bytes)
            .map_err(|_| CryptoError::InvalidSignatureFormat)?;
        Ok(Self(bytes))
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

/// secp256k1 public key with its canonical PEM encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct EccPublicKey {
    verifying_key: VerifyingKey,
    pem: String,
    fingerprint: PublicKeyFingerprint,
}

impl EccPublicKey {
    /// Import a SubjectPublicKeyInfo PEM.
    ///
    /// # Errors
    ///
    /// - `CryptoError::UnsupportedCurve` if the key names a curve other than secp256k1
    /// - `CryptoError::InvalidPublicKey` if the PEM is malformed
    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        let verifying_key = VerifyingKey::from_public_key_pem(pem.trim()).map_err(|e| match e {
            spki::Error::OidUnknown { .. } => CryptoError::UnsupportedCurve,
            other => CryptoError::InvalidPublicKey(other.to_string()),
        })?;
        Self::from_verifying_key(verifying_key)
    }

    /// Wrap a k256 verifying key, computing its canonical PEM and fingerprint.
    pub fn from_verifying_key(verifying_key: VerifyingKey) -> Result<Self, CryptoError> {
        let pem = verifying_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?
            .trim()
            .to_string();
        let fingerprint = PublicKeyFingerprint::of_pem(&pem);

        Ok(Self {
            verifying_key,
            pem,
            fingerprint,
        })
    }

    /// Canonical PEM encoding, surrounding whitespace trimmed.
    pub fn pem(&self) -> &str {
        &self.pem
    }

    /// SHA-256 fingerprint of `pem()`.
    pub fn fingerprint(&self) -> &PublicKeyFingerprint {
        &self.fingerprint
    }

    /// Underlying k256 key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }
}

impl fmt::Debug for EccPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EccPublicKey")
            .field("fingerprint", &self.fingerprint.as_str())
            .finish()
    }
}

/// secp256k1 ECDSA keypair.
///
/// The k256 `SigningKey` zeroizes its scalar on drop.
#[derive(Clone)]
pub struct EccKeyPair {
    signing_key: SigningKey,
    public: EccPublicKey,
}

impl EccKeyPair {
    /// Generate a fresh keypair from the OS entropy source.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut seed = Zeroizing::new([0u8; 32]);
        loop {
            fill_from_os(&mut seed[..])?;
            // Rejects zero and values >= n; the odds of looping are ~2^-128.
            if let Ok(signing_key) = SigningKey::from_bytes((&*seed).into()) {
                return Self::from_signing_key(signing_key);
            }
        }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(bytes);
        let signing_key = SigningKey::from_bytes((&*bytes).into())
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Self::from_signing_key(signing_key)
    }

    /// Import a keypair from PEM.
    ///
    /// The private key may be SEC1 (`EC PRIVATE KEY`) or PKCS#8
    /// (`PRIVATE KEY`). The public key must be on secp256k1 and must be the
    /// one derived from the private key.
    pub fn from_pem(private_pem: &str, public_pem: &str) -> Result<Self, CryptoError> {
        let public = EccPublicKey::from_pem(public_pem)?;
        let signing_key = parse_private_pem(private_pem.trim())?;

        if signing_key.verifying_key() != public.verifying_key() {
            return Err(CryptoError::KeyMismatch);
        }

        Ok(Self {
            signing_key,
            public,
        })
    }

    fn from_signing_key(signing_key: SigningKey) -> Result<Self, CryptoError> {
        let public = EccPublicKey::from_verifying_key(*signing_key.verifying_key())?;
        Ok(Self {
            signing_key,
            public,
        })
    }

    /// Public half.
    pub fn public_key(&self) -> &EccPublicKey {
        &self.public
    }

    /// Fingerprint of the public half.
    pub fn fingerprint(&self) -> &PublicKeyFingerprint {
        self.public.fingerprint()
    }

    /// Canonical SPKI PEM of the public half.
    pub fn public_key_pem(&self) -> &str {
        self.public.pem()
    }

    /// Export the private key as SEC1 PEM.
    pub fn private_key_pem(&self) -> Result<Zeroizing<String>, CryptoError> {
        let secret = SecretKey::from_bytes(&self.signing_key.to_bytes())
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?;
        secret
            .to_sec1_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
    }

    /// Sign a message (deterministic RFC 6979, SHA-256 digest).
    pub fn sign(&self, message: &[u8]) -> EccSignature {
        let sig: Signature = self.signing_key.sign(message);
        EccSignature(sig.to_bytes().into())
    }
}

impl fmt::Debug for EccKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EccKeyPair")
            .field("fingerprint", &self.fingerprint().as_str())
            .finish_non_exhaustive()
    }
}

fn parse_private_pem(pem: &str) -> Result<SigningKey, CryptoError> {
    if let Ok(secret) = SecretKey::from_sec1_pem(pem) {
        return Ok(SigningKey::from(secret));
    }
    SigningKey::from_pkcs8_pem(pem).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
}

/// secp256k1 ECDSA signer/verifier over hex-encoded signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsymmetricSigner;

impl AsymmetricSigner {
    /// Create a new signer.
    pub fn new() -> Self {
        Self
    }

    /// Sign `message` and return the hex `r || s` signature.
    pub fn sign(&self, message: &[u8], keypair: &EccKeyPair) -> String {
        keypair.sign(message).to_hex()
    }

    /// Verify a hex `r || s` signature over `message`.
    ///
    /// High-S signatures are normalized before verification. A malformed
    /// signature is a failed verification, not an error.
    pub fn verify(&self, message: &[u8], signature: &str, public_key: &EccPublicKey) -> bool {
        let Ok(parsed) = EccSignature::from_hex(signature) else {
            return false;
        };
        let Ok(sig) = Signature::from_slice(parsed.as_bytes()) else {
            return false;
        };
        let sig = sig.normalize_s().unwrap_or(sig);

        public_key.verifying_key().verify(message, &sig).is_ok()
    }
}
