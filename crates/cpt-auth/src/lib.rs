//! # CPT Authentication Layer
//!
//! Makes every outbound call to the CPT API tamper-evident and
//! replay-resistant, and verifies that inbound responses and callbacks really
//! come from the server.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): envelope encoding, signing, verification,
//!   account binding. No I/O.
//! - **Ports Layer** (`ports/`): `AuthenticatedApi` (inbound) and `Transport`
//!   (outbound, supplied by the caller)
//! - **Service Layer** (`service.rs`): `ApiClient`, wiring domain logic to ports
//!
//! ## Trust model
//!
//! | Mechanism | Key | Used for |
//! |-----------|-----|----------|
//! | HMAC-SHA512 | Shared secret issued with the API key | Signed calls, HMAC callbacks |
//! | secp256k1 ECDSA | Per-client keypair | Signed calls after account binding |
//! | secp256k1 ECDSA | Compiled-in server key (trust anchor) | Acknowledgments, ECC callbacks |
//!
//! ## Security Notes
//!
//! - The signed bytes are the transmitted bytes: the base64 envelope is never
//!   re-derived after signing.
//! - Every signed call carries a fresh timestamp and OS-entropy nonce.
//! - Server-signed messages are verified against the trust anchor only, never
//!   against a key supplied by the peer.

#![warn(missing_docs)]

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use config::AuthConfig;
pub use domain::binding::{AccountBinding, BindingState, BoundAccount, KeySource};
pub use domain::callback::CallbackAuthenticator;
pub use domain::entities::{
    AuthContext, AuthMode, AuthTag, CallKind, Credentials, FieldMap, HttpMethod,
    OutboundRequest, SignedMessage,
};
pub use domain::envelope::{decode_payload, Envelope};
pub use domain::errors::{
    AuthError, ConfigError, PolicyError, ProtocolError, SignatureError, StateError,
};
pub use domain::request::RequestBuilder;
pub use domain::trust_anchor::TrustAnchor;
pub use domain::verifier::ResponseVerifier;
pub use ports::inbound::AuthenticatedApi;
pub use ports::outbound::{Transport, TransportError};
pub use service::ApiClient;
