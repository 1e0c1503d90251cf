//! Client configuration.

use crate::domain::entities::AuthMode;
use crate::domain::errors::ConfigError;
use cpt_crypto::nonce::MAX_NONCE_LENGTH;
use serde::{Deserialize, Serialize};
use std::env;

/// Default API origin.
pub const DEFAULT_BASE_URL: &str = "https://api.coinapult.com";
/// Default leading path segment removed from signed `endpoint` fields.
pub const DEFAULT_TRANSPORT_PREFIX: &str = "/api";
/// Default nonce length in hex characters.
pub const DEFAULT_NONCE_LENGTH: usize = 20;

/// Settings for an [`ApiClient`](crate::service::ApiClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// API origin; paths are appended to it
    pub base_url: String,

    /// Fixed path prefix stripped from the signed `endpoint` field
    pub transport_prefix: String,

    /// Nonce length in hex characters
    pub nonce_length: usize,

    /// Signer override for signed calls; `None` keeps the context's own mode
    pub auth_mode: Option<AuthMode>,

    /// Switch to ECC once an account key is bound
    pub switch_to_ecc_on_bind: bool,

    /// Hex SHA-256 of the locally accepted terms of service. When set, account
    /// creation refuses acknowledgments carrying a different digest.
    pub terms_digest: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            transport_prefix: DEFAULT_TRANSPORT_PREFIX.to_string(),
            nonce_length: DEFAULT_NONCE_LENGTH,
            auth_mode: None,
            switch_to_ecc_on_bind: true,
            terms_digest: None,
        }
    }
}

impl AuthConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CPT_BASE_URL`: API origin (default: https://api.coinapult.com)
    /// - `CPT_TRANSPORT_PREFIX`: Prefix stripped from `endpoint` (default: /api)
    /// - `CPT_NONCE_LENGTH`: Nonce length in hex characters (default: 20)
    /// - `CPT_AUTH_MODE`: `hmac` or `ecc` (default: the context's mode)
    /// - `CPT_SWITCH_TO_ECC`: Switch to ECC after binding (default: true)
    /// - `CPT_TERMS_SHA256`: Accepted terms of service digest (default: unset)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let nonce_length = match lookup("CPT_NONCE_LENGTH") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "nonce_length",
                    reason: format!("'{raw}' is not a positive integer"),
                })?,
            None => defaults.nonce_length,
        };

        let auth_mode = match lookup("CPT_AUTH_MODE") {
            Some(raw) => Some(raw.parse()?),
            None => defaults.auth_mode,
        };

        let config = Self {
            base_url: lookup("CPT_BASE_URL").unwrap_or(defaults.base_url),
            transport_prefix: lookup("CPT_TRANSPORT_PREFIX").unwrap_or(defaults.transport_prefix),
            nonce_length,
            auth_mode,
            switch_to_ecc_on_bind: lookup("CPT_SWITCH_TO_ECC")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.switch_to_ecc_on_bind),
            terms_digest: lookup("CPT_TERMS_SHA256")
                .map(|v| v.trim().to_ascii_lowercase())
                .filter(|v| !v.is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no client can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "base_url",
                reason: "must not be empty".to_string(),
            });
        }

        if self.nonce_length == 0 || self.nonce_length > MAX_NONCE_LENGTH {
            return Err(ConfigError::InvalidValue {
                field: "nonce_length",
                reason: format!("must be between 1 and {MAX_NONCE_LENGTH}"),
            });
        }

        if let Some(digest) = &self.terms_digest {
            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::InvalidValue {
                    field: "terms_digest",
                    reason: "expected 64 hex characters".to_string(),
                });
            }
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
