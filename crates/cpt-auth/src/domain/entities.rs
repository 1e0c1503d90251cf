//! # Domain Entities
//!
//! Credentials, the immutable authentication context, and the wire-level
//! shapes produced by the request builder.

use super::errors::{ConfigError, StateError};
use cpt_crypto::{EccKeyPair, PublicKeyFingerprint};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Ordered request/response field mapping. Insertion order is preserved so
/// that encoding the same mapping twice yields the same bytes.
pub type FieldMap = Map<String, Value>;

// =============================================================================
// Wire constants
// =============================================================================

/// Header carrying the cleartext API key (HMAC mode).
pub const HEADER_API_KEY: &str = "cpt-key";
/// Header carrying the hex HMAC-SHA512 of the payload.
pub const HEADER_HMAC: &str = "cpt-hmac";
/// Header carrying the SHA-256 fingerprint of the client public key.
pub const HEADER_ECC_PUB: &str = "cpt-ecc-pub";
/// Header carrying the base64 public key PEM on account creation.
pub const HEADER_ECC_NEW: &str = "cpt-ecc-new";
/// Header carrying the hex ECDSA signature of the payload.
pub const HEADER_ECC_SIGN: &str = "cpt-ecc-sign";
/// Body field carrying the base64 envelope.
pub const BODY_DATA: &str = "data";

// =============================================================================
// Credentials
// =============================================================================

/// Shared-secret credentials issued out-of-band with an API key.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    secret: Zeroizing<Vec<u8>>,
}

impl Credentials {
    /// Build credentials; both fields are required.
    pub fn new(api_key: impl Into<String>, secret: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential("api_key"));
        }
        if secret.as_ref().is_empty() {
            return Err(ConfigError::MissingCredential("secret"));
        }

        Ok(Self {
            api_key,
            secret: Zeroizing::new(secret.as_ref().to_vec()),
        })
    }

    /// Read `CPT_API_KEY` / `CPT_API_SECRET`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("CPT_API_KEY")
            .map_err(|_| ConfigError::MissingCredential("CPT_API_KEY"))?;
        let secret = Zeroizing::new(
            std::env::var("CPT_API_SECRET")
                .map_err(|_| ConfigError::MissingCredential("CPT_API_SECRET"))?,
        );
        Self::new(api_key, secret.as_bytes())
    }

    /// Cleartext API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Shared secret bytes.
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Authentication context
// =============================================================================

/// Which signer a signed call uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Shared-secret HMAC (`cpt-key` / `cpt-hmac`)
    #[default]
    #[serde(alias = "creds")]
    Hmac,
    /// secp256k1 ECDSA (`cpt-ecc-pub` / `cpt-ecc-sign`)
    Ecc,
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hmac" | "creds" => Ok(AuthMode::Hmac),
            "ecc" => Ok(AuthMode::Ecc),
            other => Err(ConfigError::InvalidValue {
                field: "auth_mode",
                reason: format!("unknown mode '{other}'"),
            }),
        }
    }
}

/// Immutable authentication state for a client.
///
/// Operations read a snapshot; only account binding produces a new one.
#[derive(Clone, Debug, Default)]
pub struct AuthContext {
    credentials: Option<Credentials>,
    keypair: Option<Arc<EccKeyPair>>,
    mode: AuthMode,
}

impl AuthContext {
    /// Context with neither credential configured (unsigned calls only).
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// HMAC context.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
            keypair: None,
            mode: AuthMode::Hmac,
        }
    }

    /// ECC context around an existing keypair.
    pub fn with_keypair(keypair: EccKeyPair) -> Self {
        Self {
            credentials: None,
            keypair: Some(Arc::new(keypair)),
            mode: AuthMode::Ecc,
        }
    }

    /// ECC context from PEM key material.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidKey` if the PEMs are malformed, name a curve other
    /// than secp256k1, or do not form one keypair.
    pub fn with_keypair_pem(private_pem: &str, public_pem: &str) -> Result<Self, ConfigError> {
        let keypair =
            EccKeyPair::from_pem(private_pem, public_pem).map_err(ConfigError::InvalidKey)?;
        Ok(Self::with_keypair(keypair))
    }

    /// Copy of this context carrying `keypair`.
    pub fn replace_keypair(&self, keypair: Arc<EccKeyPair>) -> Self {
        Self {
            keypair: Some(keypair),
            ..self.clone()
        }
    }

    /// Copy of this context with credentials added.
    pub fn add_credentials(&self, credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
            ..self.clone()
        }
    }

    /// Copy of this context using `mode` for signed calls.
    pub fn switch_mode(&self, mode: AuthMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    /// Signer used by signed calls.
    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// HMAC credentials, or `StateError::NoCredentials`.
    pub fn credentials(&self) -> Result<&Credentials, StateError> {
        self.credentials.as_ref().ok_or(StateError::NoCredentials)
    }

    /// ECC keypair, or `StateError::EccUnavailable`.
    pub fn keypair(&self) -> Result<&Arc<EccKeyPair>, StateError> {
        self.keypair.as_ref().ok_or(StateError::EccUnavailable)
    }

    /// Fingerprint of the configured keypair, if any.
    pub fn fingerprint(&self) -> Option<&PublicKeyFingerprint> {
        self.keypair.as_deref().map(EccKeyPair::fingerprint)
    }
}

// =============================================================================
// Wire shapes
// =============================================================================

/// How a signed message identifies its signer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthTag {
    /// HMAC mode: the cleartext API key
    ApiKey(String),
    /// ECC mode: fingerprint of a public key the server already knows
    Fingerprint(PublicKeyFingerprint),
    /// ECC account creation: base64 of the full public key PEM
    NewAccount(String),
}

/// A payload plus its signature and signer identification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedMessage {
    /// Base64 envelope; these exact bytes were signed
    pub payload: String,
    /// Hex signature (HMAC tag or ECDSA `r || s`)
    pub signature: String,
    /// Signer identification
    pub tag: AuthTag,
}

impl SignedMessage {
    /// Transport headers for this message.
    pub fn headers(&self) -> Vec<(String, String)> {
        match &self.tag {
            AuthTag::ApiKey(key) => vec![
                (HEADER_API_KEY.to_string(), key.clone()),
                (HEADER_HMAC.to_string(), self.signature.clone()),
            ],
            AuthTag::Fingerprint(fingerprint) => vec![
                (HEADER_ECC_PUB.to_string(), fingerprint.to_string()),
                (HEADER_ECC_SIGN.to_string(), self.signature.clone()),
            ],
            AuthTag::NewAccount(encoded_pem) => vec![
                (HEADER_ECC_NEW.to_string(), encoded_pem.clone()),
                (HEADER_ECC_SIGN.to_string(), self.signature.clone()),
            ],
        }
    }
}

/// HTTP verb for the outbound call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// Params go in the query string
    Get,
    /// Params go in the form body
    Post,
}

/// Everything the transport needs to perform one call.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundRequest {
    /// HTTP verb
    pub method: HttpMethod,
    /// Absolute URL
    pub url: String,
    /// API path as given by the caller
    pub path: String,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// Query (GET) or form (POST) parameters
    pub params: FieldMap,
}

impl OutboundRequest {
    /// Look up a header by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The base64 envelope, on signed calls.
    pub fn data(&self) -> Option<&str> {
        self.params.get(BODY_DATA).and_then(Value::as_str)
    }
}

/// Kind of call issued through the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// Unsigned, fields as query parameters
    Get,
    /// Unsigned, fields as form body
    Post,
    /// Signed with the context's active mode
    Signed,
}
