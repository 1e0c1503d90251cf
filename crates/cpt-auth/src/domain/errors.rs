//! # Authentication Errors
//!
//! The error taxonomy callers see. Each family maps to a different reaction:
//!
//! | Variant | Meaning | Caller reaction |
//! |---------|---------|-----------------|
//! | `Configuration` | Bad key material or settings at construction | Fix setup, never retry |
//! | `Protocol` | Server-reported error or structurally bad response | Surface, maybe retry |
//! | `Signature` | HMAC/ECDSA mismatch, wrong key bound | Security event, never retry blindly |
//! | `State` | Missing capability or out-of-order handshake step | Programming error |
//! | `Policy` | Terms of service digest mismatch | Ask the operator |
//! | `Transport` | The external transport failed | Caller's retry policy |

use super::binding::BindingState;
use crate::ports::outbound::TransportError;
use cpt_crypto::CryptoError;
use thiserror::Error;

/// Construction-time failures. Fatal; never raised mid-call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required credential field is empty or absent
    #[error("Missing required credential field: {0}")]
    MissingCredential(&'static str),

    /// Key material was rejected (wrong curve, malformed PEM, mismatched pair)
    #[error("Invalid key material: {0}")]
    InvalidKey(#[source] CryptoError),

    /// A configuration value is out of range or unparsable
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending setting
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// The server said no, or said something we cannot parse.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The response carried an `error` field
    #[error("Server error: {0}")]
    Server(String),

    /// A required response field is absent
    #[error("Missing field in response: {0}")]
    MissingField(&'static str),

    /// Response is not the expected JSON/base64 shape
    #[error("Malformed message: {0}")]
    Malformed(String),
}

/// Cryptographic authentication failures. Always a security event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// HMAC recomputed over the payload does not match
    #[error("HMAC signature does not match")]
    HmacMismatch,

    /// ECDSA signature does not verify against the trust anchor
    #[error("ECC signature does not match")]
    EccVerificationFailed,

    /// Callback claims an API key that is not ours
    #[error("Unexpected API key received")]
    UnexpectedApiKey,

    /// Server acknowledged a different public key than the one submitted
    #[error("Unexpected public key: expected {expected}, server bound {received}")]
    BoundKeyMismatch {
        /// Fingerprint we submitted
        expected: String,
        /// Fingerprint the server acknowledged
        received: String,
    },
}

/// Operation attempted without the state it needs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    /// ECC signing requested but no keypair is configured
    #[error("ECC authentication unavailable: no keypair configured")]
    EccUnavailable,

    /// HMAC signing requested but no credentials are configured
    #[error("HMAC authentication unavailable: no credentials configured")]
    NoCredentials,

    /// System clock reads earlier than the Unix epoch
    #[error("System clock is before the Unix epoch")]
    ClockBeforeEpoch,

    /// Account binding step called in the wrong state
    #[error("Account binding step '{step}' not allowed in state {state:?}")]
    OutOfOrder {
        /// Step that was attempted
        step: &'static str,
        /// State the binding was in
        state: BindingState,
    },
}

/// Policy rejections that are not cryptographic failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// Server terms digest differs from the locally accepted one
    #[error("Terms of service is out-of-date: expected {expected}, received {received:?}")]
    TermsOutdated {
        /// Locally accepted digest
        expected: String,
        /// Digest in the acknowledgment, if any
        received: Option<String>,
    },
}

/// Top-level error for every `cpt-auth` operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// See [`ConfigError`]
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// See [`ProtocolError`]
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// See [`SignatureError`]
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// See [`StateError`]
    #[error(transparent)]
    State(#[from] StateError),

    /// See [`PolicyError`]
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Failure reported by the transport
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Signing primitive failed (entropy source unavailable)
    #[error("Cryptographic failure: {0}")]
    Crypto(#[source] CryptoError),
}

impl AuthError {
    /// True when the failure should be logged and alerted as a security event.
    pub fn is_security_event(&self) -> bool {
        matches!(self, AuthError::Signature(_))
    }

    /// Message reported by the server, if this error carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            AuthError::Protocol(ProtocolError::Server(message)) => Some(message),
            _ => None,
        }
    }
}
