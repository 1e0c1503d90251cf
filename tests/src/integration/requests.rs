//! Signed and unsigned calls, checked by the server.

#[cfg(test)]
mod tests {
    use crate::integration::server::{ScriptedServer, TEST_API_KEY};
    use cpt_auth::{
        AuthConfig, AuthContext, AuthError, AuthMode, AuthenticatedApi, CallKind, Credentials,
        FieldMap, HttpMethod, ProtocolError, StateError, Transport, TransportError,
    };
    use serde_json::{json, Value};
    use std::collections::HashSet;

    fn fields(value: Value) -> FieldMap {
        match value {
            Value::Object(map) => map,
            _ => FieldMap::new(),
        }
    }

    // =============================================================================
    // UNSIGNED CALLS
    // =============================================================================

    #[test]
    fn test_unsigned_fields_sent_as_is() {
        let server = ScriptedServer::new();
        let client = server.client(AuthConfig::default()).unwrap();

        let response = client
            .send_to_api("/api/ticker", fields(json!({"market": "USD_BTC"})), CallKind::Get)
            .unwrap();

        assert_eq!(response["params"], json!({"market": "USD_BTC"}));
        let request = server.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.headers.is_empty());
    }

    // =============================================================================
    // HMAC
    // =============================================================================

    #[test]
    fn test_hmac_signed_call_accepted() {
        let server = ScriptedServer::new();
        let client = server.client(AuthConfig::default()).unwrap();

        let response = client
            .send_to_api(
                "/api/t/send/",
                fields(json!({"amount": 0.01, "currency": "BTC", "address": "1abc"})),
                CallKind::Signed,
            )
            .unwrap();

        let received = &response["received"];
        assert_eq!(received["amount"], json!(0.01));
        assert_eq!(received["endpoint"], json!("/t/send/"));
        assert_eq!(received["nonce"].as_str().unwrap().len(), 20);
        assert!(received["timestamp"].is_u64());

        let request = server.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.header("cpt-key"), Some(TEST_API_KEY));
        assert!(request.header("cpt-ecc-sign").is_none());
    }

    #[test]
    fn test_wrong_secret_rejected_by_server() {
        let server = ScriptedServer::new();
        let credentials = Credentials::new(TEST_API_KEY, "not-the-secret").unwrap();
        let client = server
            .client_with(AuthConfig::default(), AuthContext::with_credentials(credentials))
            .unwrap();

        let err = client
            .send_to_api("/api/accountInfo", FieldMap::new(), CallKind::Signed)
            .unwrap_err();

        assert_eq!(
            err,
            AuthError::Protocol(ProtocolError::Server("Invalid signature".into()))
        );
        assert_eq!(err.server_message(), Some("Invalid signature"));
        assert!(!err.is_security_event());
    }

    #[test]
    fn test_every_call_gets_a_fresh_nonce() {
        let server = ScriptedServer::new();
        let client = server.client(AuthConfig::default()).unwrap();

        for _ in 0..50 {
            client
                .send_to_api("/api/accountInfo", FieldMap::new(), CallKind::Signed)
                .unwrap();
        }

        let payloads: HashSet<_> = server
            .requests()
            .iter()
            .map(|r| r.data().unwrap().to_string())
            .collect();
        assert_eq!(payloads.len(), 50);
    }

    #[test]
    fn test_configured_nonce_length() {
        let server = ScriptedServer::new();
        let config = AuthConfig {
            nonce_length: 40,
            ..AuthConfig::default()
        };
        let client = server.client(config).unwrap();

        let response = client
            .send_to_api("/api/accountInfo", FieldMap::new(), CallKind::Signed)
            .unwrap();
        assert_eq!(response["received"]["nonce"].as_str().unwrap().len(), 40);
    }

    // =============================================================================
    // CAPABILITIES AND FAILURES
    // =============================================================================

    #[test]
    fn test_ecc_mode_without_key_is_state_error() {
        let server = ScriptedServer::new();
        let config = AuthConfig {
            auth_mode: Some(AuthMode::Ecc),
            ..AuthConfig::default()
        };
        let client = server.client(config).unwrap();

        assert_eq!(
            client
                .send_to_api("/api/accountInfo", FieldMap::new(), CallKind::Signed)
                .unwrap_err(),
            AuthError::State(StateError::EccUnavailable)
        );
        assert!(server.requests().is_empty());
    }

    #[test]
    fn test_transport_failure_propagates() {
        let server = ScriptedServer::new();
        let client = server.client(AuthConfig::default()).unwrap();
        server.fail_next(TransportError::Status {
            status: 502,
            body: "Bad Gateway".into(),
        });

        assert!(matches!(
            client.send_to_api("/api/accountInfo", FieldMap::new(), CallKind::Signed),
            Err(AuthError::Transport(TransportError::Status { status: 502, .. }))
        ));

        // Next call goes through.
        assert!(client
            .send_to_api("/api/accountInfo", FieldMap::new(), CallKind::Signed)
            .is_ok());
    }

    #[test]
    fn test_anonymous_client_limited_to_unsigned_calls() {
        let server = ScriptedServer::new();
        let anonymous = server
            .client_with(AuthConfig::default(), AuthContext::anonymous())
            .unwrap();

        let echoed = anonymous
            .send_to_api("/api/ticker", FieldMap::new(), CallKind::Post)
            .unwrap();
        assert_eq!(echoed["path"], json!("/api/ticker"));

        assert_eq!(
            anonymous
                .send_to_api("/api/t/send/", FieldMap::new(), CallKind::Signed)
                .unwrap_err(),
            AuthError::State(StateError::NoCredentials)
        );
    }

    #[test]
    fn test_replayed_request_rejected() {
        let server = ScriptedServer::new();
        let client = server.client(AuthConfig::default()).unwrap();
        client
            .send_to_api("/api/accountInfo", FieldMap::new(), CallKind::Signed)
            .unwrap();

        // Same bytes, same nonce.
        let captured = server.last_request().unwrap();
        let body = server.execute(&captured).unwrap();
        let response: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(response["error"], json!("Nonce already used"));
    }

    #[test]
    fn test_redirected_request_rejected() {
        let server = ScriptedServer::new();
        let client = server.client(AuthConfig::default()).unwrap();
        client
            .send_to_api("/api/accountInfo", FieldMap::new(), CallKind::Signed)
            .unwrap();

        // Signature intact, but the signed endpoint no longer matches the path.
        let mut redirected = server.last_request().unwrap();
        redirected.path = "/api/t/send/".to_string();
        let body = ScriptedServer::new().execute(&redirected).unwrap();
        let response: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(response["error"], json!("Endpoint mismatch"));
    }

    #[test]
    fn test_headerless_payload_rejected() {
        let server = ScriptedServer::new();
        let client = server.client(AuthConfig::default()).unwrap();
        client
            .send_to_api("/api/accountInfo", FieldMap::new(), CallKind::Signed)
            .unwrap();

        let mut stripped = server.last_request().unwrap();
        stripped.headers.clear();
        let body = server.execute(&stripped).unwrap();
        let response: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(response["error"], json!("Missing authentication headers"));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn prop_server_accepts_any_signed_fields(
                entries in prop::collection::vec(("[a-z]{1,10}", "[ -~]{0,24}"), 0..6)
            ) {
                let server = ScriptedServer::new();
                let client = server.client(AuthConfig::default()).unwrap();

                let mut map = FieldMap::new();
                for (key, value) in entries {
                    if !matches!(key.as_str(), "timestamp" | "nonce" | "endpoint") {
                        map.insert(key, Value::String(value));
                    }
                }

                let response = client
                    .send_to_api("/api/t/receive/", map.clone(), CallKind::Signed)
                    .unwrap();
                for (key, value) in &map {
                    prop_assert_eq!(&response["received"][key], value);
                }
            }
        }
    }
}
