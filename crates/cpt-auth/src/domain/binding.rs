//! # Account Binding Protocol
//!
//! Binds a locally generated (or imported) secp256k1 keypair to a new
//! server-side account.
//!
//! ```text
//! Idle ──prepare──▶ KeyPrepared ──submission──▶ Submitted ──complete──▶ Bound
//!                                                   │  ▲
//!                                                   │  └─ transport/server/malformed: stays, may resend
//!                                                   └────▶ Rejected
//! ```
//!
//! A resend from `Submitted` reuses the prepared key. Binding a different key
//! means starting a new `AccountBinding`.

use super::entities::{AuthContext, AuthMode, FieldMap, OutboundRequest};
use super::errors::{AuthError, ConfigError, PolicyError, ProtocolError, SignatureError, StateError};
use super::request::RequestBuilder;
use super::verifier::ResponseVerifier;
use cpt_crypto::{EccKeyPair, PublicKeyFingerprint};
use serde_json::Value;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

/// Acknowledgment field carrying the fingerprint the server bound.
pub const FIELD_SUCCESS: &str = "success";
/// Acknowledgment field carrying the terms of service digest.
pub const FIELD_TERMS: &str = "terms";

/// Where the handshake currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingState {
    /// No key yet
    Idle,
    /// Key generated or imported, nothing sent
    KeyPrepared,
    /// Public key sent, acknowledgment pending
    Submitted,
    /// Acknowledgment verified; terminal
    Bound,
    /// Acknowledgment refused; terminal
    Rejected,
}

/// Origin of the keypair to bind.
#[derive(Clone, Debug)]
pub enum KeySource {
    /// Fresh keypair from the OS entropy source
    Generate,
    /// Caller-supplied keypair
    Import(EccKeyPair),
}

impl KeySource {
    /// Import source from PEM key material.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidKey` if the pair is not a valid secp256k1 keypair.
    pub fn from_pem(private_pem: &str, public_pem: &str) -> Result<Self, ConfigError> {
        EccKeyPair::from_pem(private_pem, public_pem)
            .map(KeySource::Import)
            .map_err(ConfigError::InvalidKey)
    }
}

/// Result of a successful binding.
#[derive(Clone, Debug)]
pub struct BoundAccount {
    /// New authentication context carrying the bound keypair
    pub context: AuthContext,
    /// Fingerprint the server acknowledged
    pub fingerprint: PublicKeyFingerprint,
    /// Verified, decoded acknowledgment
    pub acknowledgment: FieldMap,
}

/// One instance of the handshake.
#[derive(Debug)]
pub struct AccountBinding {
    state: BindingState,
    keypair: Option<Arc<EccKeyPair>>,
    terms_digest: Option<String>,
}

impl AccountBinding {
    /// New handshake. `terms_digest` is the locally accepted terms digest, if
    /// the acknowledgment's `terms` field should be checked.
    pub fn new(terms_digest: Option<String>) -> Self {
        Self {
            state: BindingState::Idle,
            keypair: None,
            terms_digest: terms_digest.map(|d| d.to_ascii_lowercase()),
        }
    }

    /// Current handshake state.
    pub fn state(&self) -> BindingState {
        self.state
    }

    /// Fingerprint of the prepared key.
    pub fn fingerprint(&self) -> Option<&PublicKeyFingerprint> {
        self.keypair.as_deref().map(EccKeyPair::fingerprint)
    }

    /// `Idle -> KeyPrepared`.
    pub fn prepare(&mut self, source: KeySource) -> Result<&PublicKeyFingerprint, AuthError> {
        self.expect_state("prepare", &[BindingState::Idle])?;

        let keypair = match source {
            KeySource::Generate => EccKeyPair::generate().map_err(AuthError::Crypto)?,
            KeySource::Import(keypair) => keypair,
        };
        let keypair = self.keypair.insert(Arc::new(keypair));
        self.state = BindingState::KeyPrepared;

        info!(fingerprint = %keypair.fingerprint(), "Account key prepared");
        Ok(keypair.fingerprint())
    }

    /// `KeyPrepared -> Submitted`: build the new-account request.
    ///
    /// Also allowed from `Submitted` to resend with the same key.
    pub fn submission(
        &mut self,
        builder: &RequestBuilder,
        path: &str,
        metadata: FieldMap,
        timestamp: u64,
    ) -> Result<OutboundRequest, AuthError> {
        self.expect_state(
            "submit",
            &[BindingState::KeyPrepared, BindingState::Submitted],
        )?;
        let keypair = self.keypair.as_ref().ok_or(StateError::EccUnavailable)?;

        let request = builder.new_account(keypair, path, metadata, timestamp)?;
        self.state = BindingState::Submitted;
        Ok(request)
    }

    /// `Submitted -> Bound | Rejected`: check the server acknowledgment.
    ///
    /// Structural problems leave the binding in `Submitted`; everything that
    /// proves the server did not bind our key moves it to `Rejected`.
    pub fn complete(
        &mut self,
        verifier: &ResponseVerifier,
        response: &Value,
        base: &AuthContext,
        switch_to_ecc: bool,
    ) -> Result<BoundAccount, AuthError> {
        self.expect_state("complete", &[BindingState::Submitted])?;
        let keypair = Arc::clone(self.keypair.as_ref().ok_or(StateError::EccUnavailable)?);

        let acknowledgment = match verifier.verify_server_message(response) {
            Ok(fields) => fields,
            Err(err @ AuthError::Signature(_)) => return Err(self.reject(err)),
            Err(err) => return Err(err),
        };

        let Some(bound) = acknowledgment.get(FIELD_SUCCESS).and_then(Value::as_str) else {
            return Err(self.reject(ProtocolError::MissingField(FIELD_SUCCESS).into()));
        };
        if !keypair.fingerprint().matches(bound) {
            return Err(self.reject(
                SignatureError::BoundKeyMismatch {
                    expected: keypair.fingerprint().to_string(),
                    received: bound.to_string(),
                }
                .into(),
            ));
        }

        if let Some(expected) = self.terms_digest.clone() {
            let received = acknowledgment.get(FIELD_TERMS).and_then(Value::as_str);
            let current = received
                .map(|r| bool::from(r.to_ascii_lowercase().as_bytes().ct_eq(expected.as_bytes())))
                .unwrap_or(false);
            if !current {
                return Err(self.reject(
                    PolicyError::TermsOutdated {
                        expected,
                        received: received.map(str::to_owned),
                    }
                    .into(),
                ));
            }
        }

        let mut context = base.replace_keypair(Arc::clone(&keypair));
        if switch_to_ecc {
            context = context.switch_mode(AuthMode::Ecc);
        }
        self.state = BindingState::Bound;

        info!(
            fingerprint = %keypair.fingerprint(),
            mode = ?context.mode(),
            "Account bound"
        );
        Ok(BoundAccount {
            context,
            fingerprint: keypair.fingerprint().clone(),
            acknowledgment,
        })
    }

    fn reject(&mut self, err: AuthError) -> AuthError {
        warn!(error = %err, "Account binding rejected");
        self.state = BindingState::Rejected;
        err
    }

    fn expect_state(
        &self,
        step: &'static str,
        allowed: &[BindingState],
    ) -> Result<(), StateError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(StateError::OutOfOrder {
                step,
                state: self.state,
            })
        }
    }
}
