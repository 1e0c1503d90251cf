//! # API Client Service
//!
//! Application service layer that implements the `AuthenticatedApi` trait.
//!
//! ## Architecture
//!
//! This is the hexagonal "application service" that:
//! - Implements the inbound port (`AuthenticatedApi`)
//! - Uses the outbound port (`Transport`) for the HTTP round trip
//! - Delegates signing and verification to the domain layer
//!
//! ## Context swaps
//!
//! Every call reads an `Arc<AuthContext>` snapshot. Only a successful account
//! binding replaces it, under a short write lock; calls already in flight keep
//! the snapshot they started with.

use crate::config::AuthConfig;
use crate::domain::binding::{AccountBinding, BoundAccount, KeySource};
use crate::domain::callback::CallbackAuthenticator;
use crate::domain::entities::{AuthContext, CallKind, FieldMap, HttpMethod, OutboundRequest};
use crate::domain::errors::{AuthError, ProtocolError, StateError};
use crate::domain::request::{unix_timestamp, RequestBuilder};
use crate::domain::trust_anchor::TrustAnchor;
use crate::domain::verifier::ResponseVerifier;
use crate::ports::inbound::AuthenticatedApi;
use crate::ports::outbound::Transport;
use cpt_crypto::PublicKeyFingerprint;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Account creation endpoint.
pub const ACCOUNT_CREATE_PATH: &str = "/api/account/create";
/// Terms acceptance endpoint.
pub const ACCOUNT_ACTIVATE_PATH: &str = "/api/account/activate";

/// Authenticated client for the remote API.
pub struct ApiClient<T: Transport> {
    transport: T,
    config: AuthConfig,
    builder: RequestBuilder,
    verifier: ResponseVerifier,
    context: RwLock<Arc<AuthContext>>,
}

impl<T: Transport> ApiClient<T> {
    /// Client verifying server messages against the production trust anchor.
    ///
    /// `config.auth_mode`, when set, overrides the signer the context selects.
    ///
    /// # Errors
    /// * `ConfigError` - invalid configuration
    pub fn new(transport: T, config: AuthConfig, context: AuthContext) -> Result<Self, AuthError> {
        let anchor = TrustAnchor::production()?;
        Self::with_trust_anchor(transport, config, context, anchor)
    }

    /// Client with an explicit trust anchor (test servers, staging).
    pub fn with_trust_anchor(
        transport: T,
        config: AuthConfig,
        context: AuthContext,
        anchor: TrustAnchor,
    ) -> Result<Self, AuthError> {
        config.validate()?;

        let builder = RequestBuilder::new(
            config.base_url.clone(),
            config.transport_prefix.clone(),
            config.nonce_length,
        );
        let context = match config.auth_mode {
            Some(mode) => context.switch_mode(mode),
            None => context,
        };

        info!(
            base_url = %config.base_url,
            mode = ?context.mode(),
            anchor = %anchor.public_key().fingerprint(),
            "API client initialized"
        );

        Ok(Self {
            transport,
            config,
            builder,
            verifier: ResponseVerifier::new(anchor),
            context: RwLock::new(Arc::new(context)),
        })
    }

    /// Current authentication snapshot.
    pub fn context(&self) -> Arc<AuthContext> {
        self.context.read().clone()
    }

    /// Settings this client was built with.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Callback authenticator bound to the current snapshot.
    pub fn callback_authenticator(&self) -> CallbackAuthenticator {
        CallbackAuthenticator::new(self.context(), self.verifier.clone())
    }

    /// Execute `request` and decode the JSON object it returns.
    fn dispatch(&self, request: &OutboundRequest) -> Result<FieldMap, AuthError> {
        debug!(method = ?request.method, path = %request.path, "Dispatching request");
        let body = self.transport.execute(request)?;

        let response = match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                return Err(ProtocolError::Malformed("response is not a JSON object".into()).into())
            }
            Err(e) => return Err(ProtocolError::Malformed(format!("invalid JSON: {e}")).into()),
        };

        if let Some(error) = response.get("error") {
            let message = match error {
                Value::String(message) => message.clone(),
                other => other.to_string(),
            };
            warn!(path = %request.path, error = %message, "Server returned an error");
            return Err(ProtocolError::Server(message).into());
        }

        Ok(response)
    }
}

impl<T: Transport> AuthenticatedApi for ApiClient<T> {
    fn send_to_api(
        &self,
        endpoint: &str,
        fields: FieldMap,
        kind: CallKind,
    ) -> Result<FieldMap, AuthError> {
        let request = match kind {
            CallKind::Get => self.builder.unsigned(HttpMethod::Get, endpoint, fields),
            CallKind::Post => self.builder.unsigned(HttpMethod::Post, endpoint, fields),
            CallKind::Signed => {
                let context = self.context();
                self.builder
                    .signed(&context, endpoint, fields, unix_timestamp()?)?
            }
        };
        self.dispatch(&request)
    }

    fn create_account(
        &self,
        source: KeySource,
        metadata: FieldMap,
    ) -> Result<BoundAccount, AuthError> {
        let mut binding = AccountBinding::new(self.config.terms_digest.clone());
        binding.prepare(source)?;

        let request = binding.submission(
            &self.builder,
            ACCOUNT_CREATE_PATH,
            metadata,
            unix_timestamp()?,
        )?;
        let response = Value::Object(self.dispatch(&request)?);

        let base = self.context();
        let bound = binding.complete(
            &self.verifier,
            &response,
            &base,
            self.config.switch_to_ecc_on_bind,
        )?;

        *self.context.write() = Arc::new(bound.context.clone());
        Ok(bound)
    }

    fn activate_account(
        &self,
        agree: bool,
        fingerprint: Option<&PublicKeyFingerprint>,
    ) -> Result<FieldMap, AuthError> {
        let context = self.context();
        let keypair = context.keypair()?;
        let fingerprint = fingerprint
            .or_else(|| context.fingerprint())
            .ok_or(StateError::EccUnavailable)?;

        let mut fields = FieldMap::new();
        fields.insert("agree".to_string(), Value::Bool(agree));
        fields.insert("hash".to_string(), Value::String(fingerprint.to_string()));

        let request =
            self.builder
                .new_account(keypair, ACCOUNT_ACTIVATE_PATH, fields, unix_timestamp()?)?;
        let response = Value::Object(self.dispatch(&request)?);
        let acknowledgment = self.verifier.verify_server_message(&response)?;

        info!(fingerprint = %fingerprint, agree, "Account activation acknowledged");
        Ok(acknowledgment)
    }

    fn authenticate_callback(
        &self,
        claimed_key: Option<&str>,
        signature: &str,
        raw_payload: &str,
    ) -> Result<(), AuthError> {
        self.callback_authenticator()
            .authenticate(claimed_key, signature, raw_payload)
    }
}
