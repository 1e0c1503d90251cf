//! # Authenticated Request Builder
//!
//! Composes an [`Envelope`] with one signer and produces the transport-level
//! request:
//!
//! | Call | Envelope fields added | Headers |
//! |------|-----------------------|---------|
//! | Unsigned GET/POST | none, fields sent as-is | none |
//! | HMAC | timestamp, nonce, endpoint | `cpt-key`, `cpt-hmac` |
//! | ECC | timestamp, nonce, endpoint | `cpt-ecc-pub`, `cpt-ecc-sign` |
//! | ECC new account | timestamp | `cpt-ecc-new`, `cpt-ecc-sign` |

use super::entities::{
    AuthContext, AuthMode, AuthTag, FieldMap, HttpMethod, OutboundRequest, SignedMessage,
    BODY_DATA,
};
use super::envelope::{strip_transport_prefix, Augmentation, Envelope};
use super::errors::{AuthError, StateError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cpt_crypto::{AsymmetricSigner, EccKeyPair, NonceSource, SymmetricSigner};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Current time in whole seconds since the Unix epoch.
///
/// # Errors
///
/// `StateError::ClockBeforeEpoch` if the system clock is set before 1970.
pub fn unix_timestamp() -> Result<u64, StateError> {
    seconds_since_epoch(SystemTime::now())
}

fn seconds_since_epoch(now: SystemTime) -> Result<u64, StateError> {
    match now.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => Ok(elapsed.as_secs()),
        Err(e) => {
            warn!(behind_by = ?e.duration(), "System clock is before the Unix epoch");
            Err(StateError::ClockBeforeEpoch)
        }
    }
}

/// Builds unsigned and signed outbound requests.
#[derive(Clone, Debug)]
pub struct RequestBuilder {
    base_url: String,
    transport_prefix: String,
    nonce_length: usize,
    nonces: NonceSource,
    hmac: SymmetricSigner,
    ecdsa: AsymmetricSigner,
}

impl RequestBuilder {
    /// Builder for `base_url`, stripping `transport_prefix` from signed endpoints.
    pub fn new(
        base_url: impl Into<String>,
        transport_prefix: impl Into<String>,
        nonce_length: usize,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            transport_prefix: transport_prefix.into(),
            nonce_length,
            nonces: NonceSource::new(),
            hmac: SymmetricSigner::new(),
            ecdsa: AsymmetricSigner::new(),
        }
    }

    /// Unsigned request; fields are sent unencoded.
    pub fn unsigned(&self, method: HttpMethod, path: &str, fields: FieldMap) -> OutboundRequest {
        OutboundRequest {
            method,
            url: self.url_for(path),
            path: path.to_string(),
            headers: Vec::new(),
            params: fields,
        }
    }

    /// Signed request using `ctx`'s active mode.
    pub fn signed(
        &self,
        ctx: &AuthContext,
        path: &str,
        fields: FieldMap,
        timestamp: u64,
    ) -> Result<OutboundRequest, AuthError> {
        let message = match ctx.mode() {
            AuthMode::Hmac => self.sign_hmac(ctx, path, fields, timestamp)?,
            AuthMode::Ecc => self.sign_ecc(ctx.keypair()?, path, fields, timestamp)?,
        };
        Ok(self.into_request(path, message))
    }

    /// Account-creation style request: carries the full public key.
    pub fn new_account(
        &self,
        keypair: &EccKeyPair,
        path: &str,
        fields: FieldMap,
        timestamp: u64,
    ) -> Result<OutboundRequest, AuthError> {
        let message = self.sign_new_account(keypair, fields, timestamp)?;
        Ok(self.into_request(path, message))
    }

    /// HMAC-sign `fields` for `path`.
    pub fn sign_hmac(
        &self,
        ctx: &AuthContext,
        path: &str,
        fields: FieldMap,
        timestamp: u64,
    ) -> Result<SignedMessage, AuthError> {
        let credentials = ctx.credentials()?;
        let payload = Envelope::new(fields)
            .augment(self.anti_replay(path, timestamp)?)
            .encode()?;
        let signature = self.hmac.sign(payload.as_bytes(), credentials.secret());

        debug!(path, api_key = %credentials.api_key(), "Signed request with HMAC");
        Ok(SignedMessage {
            payload: payload.into_string(),
            signature,
            tag: AuthTag::ApiKey(credentials.api_key().to_string()),
        })
    }

    /// ECDSA-sign `fields` for `path` under `keypair`.
    pub fn sign_ecc(
        &self,
        keypair: &EccKeyPair,
        path: &str,
        fields: FieldMap,
        timestamp: u64,
    ) -> Result<SignedMessage, AuthError> {
        let payload = Envelope::new(fields)
            .augment(self.anti_replay(path, timestamp)?)
            .encode()?;
        let signature = self.ecdsa.sign(payload.as_bytes(), keypair);

        debug!(path, fingerprint = %keypair.fingerprint(), "Signed request with ECC");
        Ok(SignedMessage {
            payload: payload.into_string(),
            signature,
            tag: AuthTag::Fingerprint(keypair.fingerprint().clone()),
        })
    }

    /// ECDSA-sign `fields` as an account-creation message.
    pub fn sign_new_account(
        &self,
        keypair: &EccKeyPair,
        fields: FieldMap,
        timestamp: u64,
    ) -> Result<SignedMessage, AuthError> {
        let payload = Envelope::new(fields)
            .augment(Augmentation {
                timestamp,
                nonce: None,
                endpoint: None,
            })
            .encode()?;
        let signature = self.ecdsa.sign(payload.as_bytes(), keypair);

        Ok(SignedMessage {
            payload: payload.into_string(),
            signature,
            tag: AuthTag::NewAccount(STANDARD.encode(keypair.public_key().pem())),
        })
    }

    fn anti_replay(&self, path: &str, timestamp: u64) -> Result<Augmentation, AuthError> {
        let nonce = self
            .nonces
            .next(self.nonce_length)
            .map_err(AuthError::Crypto)?;

        Ok(Augmentation {
            timestamp,
            nonce: Some(nonce),
            endpoint: Some(strip_transport_prefix(path, &self.transport_prefix).to_string()),
        })
    }

    fn into_request(&self, path: &str, message: SignedMessage) -> OutboundRequest {
        let headers = message.headers();
        let mut params = FieldMap::new();
        params.insert(BODY_DATA.to_string(), Value::String(message.payload));

        OutboundRequest {
            method: HttpMethod::Post,
            url: self.url_for(path),
            path: path.to_string(),
            headers,
            params,
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
