//! Configuration types.

use std::time::Duration;

/// Service configuration, read from the environment with sensible defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port for the HTTP API.
    pub port: u16,
    /// Path to the libSQL lead database.
    pub db_path: String,
    /// Per-lookup timeout for the email MX/A reachability probe.
    pub dns_timeout: Duration,
    /// Base URL of the IP geolocation service; `None` disables enrichment.
    pub geo_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            db_path: "./data/profit-advisor.db".to_string(),
            dns_timeout: Duration::from_secs(3),
            geo_base_url: Some("http://ip-api.com/json".to_string()),
        }
    }
}

impl ServerConfig {
    /// Build a config from `PROFIT_ADVISOR_*` environment variables,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PROFIT_ADVISOR_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let db_path = std::env::var("PROFIT_ADVISOR_DB_PATH").unwrap_or(defaults.db_path);

        let dns_timeout = std::env::var("PROFIT_ADVISOR_DNS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.dns_timeout);

        // Empty string disables geolocation entirely.
        let geo_base_url = match std::env::var("PROFIT_ADVISOR_GEO_URL") {
            Ok(url) if url.is_empty() => None,
            Ok(url) => Some(url),
            Err(_) => defaults.geo_base_url,
        };

        Self {
            port,
            db_path,
            dns_timeout,
            geo_base_url,
        }
    }
}
