//! # CPT Crypto - Request Signing Primitives
//!
//! Leaf cryptography used by the CPT authentication layer. Nothing here
//! performs I/O or knows about HTTP; callers hand in bytes and get hex back.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `nonce` | OS entropy, hex | Anti-replay tokens |
//! | `mac` | HMAC-SHA512 | Shared-secret request signing |
//! | `ecdsa` | secp256k1 + SHA-256 | Per-client keypair signing, server trust anchor |
//! | `hashing` | SHA-256 | Public key fingerprints |
//!
//! ## Security Properties
//!
//! - **HMAC-SHA512**: deterministic, constant-time verification
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S on signing
//! - **Nonces**: drawn from the OS entropy source, no fallback generator

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod mac;
pub mod nonce;

// Re-exports
pub use ecdsa::{AsymmetricSigner, EccKeyPair, EccPublicKey, EccSignature};
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_hex, PublicKeyFingerprint};
pub use mac::SymmetricSigner;
pub use nonce::NonceSource;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
