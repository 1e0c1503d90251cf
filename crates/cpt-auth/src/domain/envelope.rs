//! # Envelope
//!
//! Canonical encoding of a request's fields. The mapping is serialized to
//! compact JSON (insertion order preserved) and base64-encoded; that base64
//! text is both the `data` body field and the exact byte string signed.

use super::entities::FieldMap;
use super::errors::ProtocolError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

/// Field name for the anti-replay timestamp (epoch seconds).
pub const FIELD_TIMESTAMP: &str = "timestamp";
/// Field name for the anti-replay nonce.
pub const FIELD_NONCE: &str = "nonce";
/// Field name for the API path the envelope was sent to.
pub const FIELD_ENDPOINT: &str = "endpoint";

/// Anti-replay fields injected before encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Augmentation {
    /// Epoch seconds
    pub timestamp: u64,
    /// Hex nonce; absent on account-creation calls
    pub nonce: Option<String>,
    /// Path with the transport prefix stripped; absent on account-creation calls
    pub endpoint: Option<String>,
}

/// A request's field set on its way to being signed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Envelope {
    fields: FieldMap,
}

impl Envelope {
    /// Wrap business fields. Unknown keys pass through untouched.
    pub fn new(fields: FieldMap) -> Self {
        Self { fields }
    }

    /// Inject `timestamp`, then `nonce` and `endpoint` when present.
    ///
    /// Existing keys with these names are overwritten in place.
    pub fn augment(mut self, augmentation: Augmentation) -> Self {
        self.fields.insert(
            FIELD_TIMESTAMP.to_string(),
            Value::from(augmentation.timestamp),
        );
        if let Some(nonce) = augmentation.nonce {
            self.fields
                .insert(FIELD_NONCE.to_string(), Value::String(nonce));
        }
        if let Some(endpoint) = augmentation.endpoint {
            self.fields
                .insert(FIELD_ENDPOINT.to_string(), Value::String(endpoint));
        }
        self
    }

    /// Current fields.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Serialize and base64-encode.
    pub fn encode(&self) -> Result<EncodedPayload, ProtocolError> {
        let json = serde_json::to_vec(&self.fields)
            .map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        Ok(EncodedPayload(STANDARD.encode(json)))
    }
}

/// Base64 text of an encoded envelope.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EncodedPayload(String);

impl EncodedPayload {
    /// The base64 text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The bytes a signer signs.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Take the base64 text.
    pub fn into_string(self) -> String {
        self.0
    }
}

/// Decode a base64 JSON object, as carried in `data` fields.
pub fn decode_payload(data: &str) -> Result<FieldMap, ProtocolError> {
    let raw = STANDARD
        .decode(data.trim())
        .map_err(|e| ProtocolError::Malformed(format!("payload is not base64: {e}")))?;

    match serde_json::from_slice::<Value>(&raw) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(ProtocolError::Malformed(
            "payload is not a JSON object".to_string(),
        )),
        Err(e) => Err(ProtocolError::Malformed(format!(
            "payload is not JSON: {e}"
        ))),
    }
}

/// Strip a fixed leading transport segment (e.g. `/api`) from a path.
pub fn strip_transport_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return path;
    }
    path.strip_prefix(prefix).unwrap_or(path)
}
