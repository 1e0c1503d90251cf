//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for log output.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name, logged at startup and recorded on [`service_span`](crate::service_span)
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error, or a full directive)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to include file and line in each event
    pub source_locations: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "cpt-client".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            source_locations: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CPT_SERVICE_NAME`: Service name (default: cpt-client)
    /// - `CPT_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `CPT_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `CPT_LOG_SOURCE`: Include file/line (default: same as JSON logs)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        let json_logs = env::var("CPT_JSON_LOGS")
            .map(|v| parse_flag(&v))
            .unwrap_or(is_container);

        Self {
            service_name: env::var("CPT_SERVICE_NAME")
                .unwrap_or_else(|_| "cpt-client".to_string()),

            log_level: env::var("CPT_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs,

            source_locations: env::var("CPT_LOG_SOURCE")
                .map(|v| parse_flag(&v))
                .unwrap_or(json_logs),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
