//! # Inbound Ports (Driving Ports / API)
//!
//! The public API of the authentication layer. Business operations
//! (transfers, quotes, balances) are built on top of `send_to_api`.

use crate::domain::binding::{BoundAccount, KeySource};
use crate::domain::entities::{CallKind, FieldMap};
use crate::domain::errors::AuthError;
use cpt_crypto::PublicKeyFingerprint;

/// Authenticated access to the remote API.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait AuthenticatedApi: Send + Sync {
    // =========================================================================
    // Calls
    // =========================================================================

    /// Send `fields` to `endpoint` and return the decoded JSON object.
    ///
    /// # Errors
    /// * `ProtocolError::Server` - the response carried an `error` field
    /// * `StateError` - signed call without the capability for the active mode
    /// * `TransportError` - the transport failed
    fn send_to_api(
        &self,
        endpoint: &str,
        fields: FieldMap,
        kind: CallKind,
    ) -> Result<FieldMap, AuthError>;

    // =========================================================================
    // Account binding
    // =========================================================================

    /// Bind a keypair to a new account.
    ///
    /// On success the client's context carries the keypair (and switches to
    /// ECC mode when configured).
    ///
    /// # Errors
    /// * `SignatureError` - acknowledgment forged or bound to another key
    /// * `PolicyError::TermsOutdated` - terms digest differs from the configured one
    /// * `ProtocolError` - server error or malformed acknowledgment
    fn create_account(
        &self,
        source: KeySource,
        metadata: FieldMap,
    ) -> Result<BoundAccount, AuthError>;

    /// Accept or decline the terms sent on account creation.
    ///
    /// `fingerprint` defaults to the context's bound key.
    fn activate_account(
        &self,
        agree: bool,
        fingerprint: Option<&PublicKeyFingerprint>,
    ) -> Result<FieldMap, AuthError>;

    // =========================================================================
    // Callbacks
    // =========================================================================

    /// Authenticate an inbound notification. See
    /// [`CallbackAuthenticator`](crate::domain::callback::CallbackAuthenticator).
    fn authenticate_callback(
        &self,
        claimed_key: Option<&str>,
        signature: &str,
        raw_payload: &str,
    ) -> Result<(), AuthError>;
}
