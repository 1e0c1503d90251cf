//! # Callback Authentication
//!
//! Asynchronous notifications (payment confirmations and the like) arrive
//! with a claimed key id, a signature and a raw base64 payload. Nothing in
//! the payload may be acted on until [`CallbackAuthenticator::authenticate`]
//! succeeds.
//!
//! - No key id: the message is ECC-signed by the server; verify against the
//!   trust anchor.
//! - Key id present: it must be our own API key; recompute the HMAC under our
//!   shared secret and compare.

use super::entities::{AuthContext, FieldMap};
use super::envelope::decode_payload;
use super::errors::{AuthError, SignatureError};
use super::verifier::ResponseVerifier;
use cpt_crypto::SymmetricSigner;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

/// Side-effect-free check of inbound notifications.
#[derive(Clone, Debug)]
pub struct CallbackAuthenticator {
    context: Arc<AuthContext>,
    verifier: ResponseVerifier,
}

impl CallbackAuthenticator {
    /// Authenticator using `context`'s credentials and `verifier`'s anchor.
    pub fn new(context: Arc<AuthContext>, verifier: ResponseVerifier) -> Self {
        Self { context, verifier }
    }

    /// Authenticate a notification.
    ///
    /// Only a missing `claimed_key` selects the anchor path. Any key id that is
    /// present, including an empty one, must equal our API key byte for byte.
    ///
    /// # Errors
    ///
    /// - `SignatureError::EccVerificationFailed` - anchor signature does not verify
    /// - `SignatureError::UnexpectedApiKey` - key id is not ours
    /// - `SignatureError::HmacMismatch` - HMAC does not match
    /// - `StateError::NoCredentials` - HMAC callback but no credentials configured
    pub fn authenticate(
        &self,
        claimed_key: Option<&str>,
        signature: &str,
        raw_payload: &str,
    ) -> Result<(), AuthError> {
        let Some(claimed_key) = claimed_key else {
            debug!("Authenticating ECC callback against trust anchor");
            return Ok(self
                .verifier
                .verify_server_signature(signature, raw_payload)?);
        };

        let credentials = self.context.credentials()?;
        let key_matches: bool = claimed_key
            .as_bytes()
            .ct_eq(credentials.api_key().as_bytes())
            .into();
        if !key_matches {
            warn!("Callback rejected: unexpected API key");
            return Err(SignatureError::UnexpectedApiKey.into());
        }

        if !SymmetricSigner::new().verify(raw_payload.as_bytes(), credentials.secret(), signature)
        {
            warn!(api_key = %credentials.api_key(), "Callback rejected: HMAC mismatch");
            return Err(SignatureError::HmacMismatch.into());
        }

        debug!(api_key = %credentials.api_key(), "Callback authenticated");
        Ok(())
    }

    /// Authenticate, then decode the base64 JSON payload.
    pub fn authenticate_and_decode(
        &self,
        claimed_key: Option<&str>,
        signature: &str,
        raw_payload: &str,
    ) -> Result<FieldMap, AuthError> {
        self.authenticate(claimed_key, signature, raw_payload)?;
        Ok(decode_payload(raw_payload)?)
    }
}
