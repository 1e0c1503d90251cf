//! # Response Verification
//!
//! Server-originated ECC messages arrive as `{ "sign": <hex>, "data": <base64 JSON> }`.
//! `data` is only decoded after `sign` verifies against the trust anchor.

use super::entities::FieldMap;
use super::envelope::decode_payload;
use super::errors::{AuthError, ProtocolError, SignatureError};
use super::trust_anchor::TrustAnchor;
use serde_json::Value;
use tracing::warn;

/// Response field carrying the server's hex signature.
pub const FIELD_SIGN: &str = "sign";
/// Response field carrying the base64 payload.
pub const FIELD_DATA: &str = "data";

/// A structurally valid server-signed message, not yet verified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EccResponse {
    /// Hex ECDSA signature
    pub sign: String,
    /// Base64 JSON payload
    pub data: String,
}

impl EccResponse {
    /// Extract `sign` and `data` from a decoded JSON response.
    pub fn from_value(response: &Value) -> Result<Self, ProtocolError> {
        let object = response
            .as_object()
            .ok_or_else(|| ProtocolError::Malformed("Invalid ECC message".to_string()))?;

        let field = |name: &'static str| {
            object
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or(ProtocolError::MissingField(name))
        };

        Ok(Self {
            sign: field(FIELD_SIGN)?,
            data: field(FIELD_DATA)?,
        })
    }
}

/// Verifies inbound messages against the trust anchor.
#[derive(Clone, Debug)]
pub struct ResponseVerifier {
    anchor: TrustAnchor,
}

impl ResponseVerifier {
    /// Verifier bound to `anchor`.
    pub fn new(anchor: TrustAnchor) -> Self {
        Self { anchor }
    }

    /// The anchor in use.
    pub fn anchor(&self) -> &TrustAnchor {
        &self.anchor
    }

    /// Check a server signature over a raw payload.
    pub fn verify_server_signature(
        &self,
        signature: &str,
        payload: &str,
    ) -> Result<(), SignatureError> {
        if self.anchor.verify(payload.as_bytes(), signature) {
            Ok(())
        } else {
            warn!(
                anchor = %self.anchor.public_key().fingerprint(),
                "Server ECC signature rejected"
            );
            Err(SignatureError::EccVerificationFailed)
        }
    }

    /// Validate structure, verify, then decode a server-signed response.
    pub fn verify_server_message(&self, response: &Value) -> Result<FieldMap, AuthError> {
        let message = EccResponse::from_value(response)?;
        self.verify_server_signature(&message.sign, &message.data)?;
        Ok(decode_payload(&message.data)?)
    }
}
