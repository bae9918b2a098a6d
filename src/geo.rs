//! IP geolocation enrichment.
//!
//! Best-effort only: every failure (timeout, HTTP error, unparsable body,
//! lookup of a private address) degrades to `None` so lead saving never
//! blocks on a third-party lookup.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

/// Location fields copied onto the lead record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeoLocation {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "countryCode")]
    pub country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    status: String,
    #[serde(flatten)]
    location: GeoLocation,
}

/// ip-api-style geolocation client.
pub struct GeoClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeoClient {
    pub fn new(base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap_or_default();
        Self { http, base_url }
    }

    /// Resolve an IP address to a coarse location, or `None` on any failure.
    pub async fn lookup(&self, ip: &str) -> Option<GeoLocation> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), ip);
        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(ip, error = %e, "geolocation request failed");
                return None;
            }
        };

        let body: GeoResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!(ip, error = %e, "geolocation response unparsable");
                return None;
            }
        };

        if body.status != "success" {
            warn!(ip, status = %body.status, "geolocation lookup unsuccessful");
            return None;
        }
        Some(body.location)
    }
}
