//! Account binding end to end.
//!
//! ## Flow Tested:
//!
//! 1. Client prepares a key and sends it in `cpt-ecc-new`
//! 2. Server registers the key and returns an anchor-signed acknowledgment
//! 3. Client checks the signature, the bound fingerprint and the terms digest
//! 4. Client switches to ECC; the server accepts fingerprint-signed calls

#[cfg(test)]
mod tests {
    use crate::integration::server::ScriptedServer;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use cpt_auth::{
        AuthConfig, AuthContext, AuthError, AuthMode, AuthenticatedApi, CallKind, FieldMap,
        KeySource, PolicyError, SignatureError, TransportError,
    };
    use cpt_crypto::{sha256_hex, EccKeyPair};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::thread;

    fn terms_digest() -> String {
        sha256_hex(b"CPT terms of service, revision 7")
    }

    // =============================================================================
    // SUCCESS
    // =============================================================================

    #[test]
    fn test_handshake_binds_generated_key() {
        let server = ScriptedServer::new();
        let client = server.client(AuthConfig::default()).unwrap();

        let bound = client
            .create_account(KeySource::Generate, FieldMap::new())
            .unwrap();

        assert!(server.is_registered(&bound.fingerprint));
        assert_eq!(client.context().fingerprint(), Some(&bound.fingerprint));
        assert_eq!(client.context().mode(), AuthMode::Ecc);
        assert_eq!(
            bound.acknowledgment["success"],
            json!(bound.fingerprint.as_str())
        );

        let request = server.last_request().unwrap();
        let pem = STANDARD.decode(request.header("cpt-ecc-new").unwrap()).unwrap();
        assert!(String::from_utf8(pem)
            .unwrap()
            .starts_with("-----BEGIN PUBLIC KEY-----"));
        assert!(request.header("cpt-ecc-pub").is_none());
        assert!(request.header("cpt-key").is_none());
    }

    #[test]
    fn test_signed_calls_after_binding_use_ecc() {
        let server = ScriptedServer::new();
        let client = server.client(AuthConfig::default()).unwrap();
        let bound = client
            .create_account(KeySource::Generate, FieldMap::new())
            .unwrap();

        let response = client
            .send_to_api("/api/accountInfo", FieldMap::new(), CallKind::Signed)
            .unwrap();

        assert_eq!(response["received"]["endpoint"], json!("/accountInfo"));
        let request = server.last_request().unwrap();
        assert_eq!(request.header("cpt-ecc-pub"), Some(bound.fingerprint.as_str()));
        assert!(request.header("cpt-hmac").is_none());
    }

    #[test]
    fn test_metadata_and_imported_key() {
        let server = ScriptedServer::new();
        let config = AuthConfig {
            switch_to_ecc_on_bind: false,
            ..AuthConfig::default()
        };
        let client = server.client(config).unwrap();
        let key = EccKeyPair::generate().unwrap();

        let mut metadata = FieldMap::new();
        metadata.insert("email".into(), json!("ops@example.test"));
        let bound = client
            .create_account(KeySource::Import(key.clone()), metadata)
            .unwrap();

        assert_eq!(&bound.fingerprint, key.fingerprint());
        assert_eq!(client.context().mode(), AuthMode::Hmac);

        let envelope = cpt_auth::decode_payload(server.last_request().unwrap().data().unwrap())
            .unwrap();
        assert_eq!(envelope["email"], json!("ops@example.test"));
        assert!(envelope.contains_key("timestamp"));
        assert!(!envelope.contains_key("nonce"));
    }

    #[test]
    fn test_terms_digest_accepted() {
        let digest = terms_digest();
        let server = ScriptedServer::with_terms(&digest);
        let config = AuthConfig {
            terms_digest: Some(digest.to_uppercase()),
            ..AuthConfig::default()
        };
        let client = server.client(config).unwrap();

        let bound = client
            .create_account(KeySource::Generate, FieldMap::new())
            .unwrap();
        assert_eq!(bound.acknowledgment["terms"], json!(digest));
    }

    #[test]
    fn test_activate_after_binding() {
        let server = ScriptedServer::new();
        let client = server.client(AuthConfig::default()).unwrap();
        let bound = client
            .create_account(KeySource::Generate, FieldMap::new())
            .unwrap();

        let ack = client.activate_account(true, None).unwrap();
        assert_eq!(ack["status"], json!("active"));
        assert_eq!(ack["hash"], json!(bound.fingerprint.as_str()));

        let declined = client
            .activate_account(false, Some(&bound.fingerprint))
            .unwrap();
        assert_eq!(declined["status"], json!("declined"));
    }

    // =============================================================================
    // REJECTION
    // =============================================================================

    #[test]
    fn test_handshake_key_mismatch() {
        let server = ScriptedServer::new();
        let client = server.client(AuthConfig::default()).unwrap();
        let other = EccKeyPair::generate().unwrap();
        server.bind_other_key(other.fingerprint().clone());

        let err = client
            .create_account(KeySource::Generate, FieldMap::new())
            .unwrap_err();

        match &err {
            AuthError::Signature(SignatureError::BoundKeyMismatch { received, .. }) => {
                assert_eq!(received, other.fingerprint().as_str());
            }
            unexpected => panic!("expected key mismatch, got {unexpected:?}"),
        }
        assert!(err.is_security_event());
        assert_eq!(client.context().mode(), AuthMode::Hmac);
        assert!(client.context().keypair().is_err());
    }

    #[test]
    fn test_acknowledgment_from_untrusted_server() {
        let real = ScriptedServer::new();
        let impostor = ScriptedServer::new();
        // Client trusts `real` but talks to `impostor`.
        let client = cpt_auth::ApiClient::with_trust_anchor(
            Arc::clone(&impostor),
            AuthConfig::default(),
            AuthContext::anonymous(),
            real.trust_anchor(),
        )
        .unwrap();

        assert_eq!(
            client
                .create_account(KeySource::Generate, FieldMap::new())
                .unwrap_err(),
            AuthError::Signature(SignatureError::EccVerificationFailed)
        );
        assert!(client.context().keypair().is_err());
    }

    #[test]
    fn test_outdated_terms() {
        let server = ScriptedServer::with_terms(&terms_digest());
        let config = AuthConfig {
            terms_digest: Some(sha256_hex(b"CPT terms of service, revision 6")),
            ..AuthConfig::default()
        };
        let client = server.client(config).unwrap();

        let err = client
            .create_account(KeySource::Generate, FieldMap::new())
            .unwrap_err();

        assert!(matches!(err, AuthError::Policy(PolicyError::TermsOutdated { .. })));
        assert!(!err.is_security_event());
        assert!(client.context().keypair().is_err());
    }

    #[test]
    fn test_transport_failure_is_not_retried_with_new_key() {
        let server = ScriptedServer::new();
        let client = server.client(AuthConfig::default()).unwrap();
        server.fail_next(TransportError::Timeout);

        assert_eq!(
            client
                .create_account(KeySource::Generate, FieldMap::new())
                .unwrap_err(),
            AuthError::Transport(TransportError::Timeout)
        );
        assert_eq!(server.requests().len(), 1);
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    #[test]
    fn test_calls_in_flight_during_binding() {
        let server = ScriptedServer::new();
        let client = server.client(AuthConfig::default()).unwrap();

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..10 {
                        let response = client
                            .send_to_api("/api/accountInfo", FieldMap::new(), CallKind::Signed)
                            .unwrap();
                        assert!(response["received"].is_object());
                    }
                });
            }
            scope.spawn(|| {
                client
                    .create_account(KeySource::Generate, FieldMap::new())
                    .unwrap();
            });
        });

        assert_eq!(client.context().mode(), AuthMode::Ecc);
        let signed: Vec<Value> = server
            .requests()
            .iter()
            .filter_map(|r| r.data().map(|d| json!(d)))
            .collect();
        assert_eq!(signed.len(), 41);
    }
}
