//! Reverse geocoding (coordinates to a formatted street address).
//!
//! Speaks the Google Geocoding JSON contract:
//! `GET {base}/maps/api/geocode/json?latlng={lat},{lon}&key={key}`.
//! No timeout is imposed here; callers that need one wrap the future.

use serde::Deserialize;

use crate::api::USER_AGENT;
use crate::error::{ClientError, ClientResult, classify_reqwest_error};

/// Default base URL for the geocoding provider.
pub const DEFAULT_GEOCODING_BASE_URL: &str = "https://maps.googleapis.com";

const GEOCODE_PATH: &str = "/maps/api/geocode/json";

/// Settings for `GeocodeResolver`.
#[derive(Clone)]
pub struct GeocodeConfig {
    pub base_url: String,
    pub api_key: String,
    pub language: Option<String>,
}

impl std::fmt::Debug for GeocodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodeConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("language", &self.language)
            .finish()
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: String,
}

/// Reverse geocoding client.
#[derive(Debug, Clone)]
pub struct GeocodeResolver {
    config: GeocodeConfig,
    http: reqwest::Client,
}

impl GeocodeResolver {
    /// Creates a resolver with the given configuration.
    ///
    /// # Panics
    /// In test builds, panics if `base_url` is the production provider.
    /// Point tests at a mock server (e.g., wiremock) instead.
    pub fn new(config: GeocodeConfig) -> Self {
        #[cfg(test)]
        if config.base_url.trim_end_matches('/') == DEFAULT_GEOCODING_BASE_URL {
            panic!(
                "Tests must not use the production geocoding API!\n\
                 Found base_url: {}",
                config.base_url
            );
        }

        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Resolves coordinates to the provider's first formatted address.
    ///
    /// # Errors
    /// `NoResultsFound` for an empty result set, `NetworkError` on transport
    /// failure, `RemoteError` on HTTP failure or a provider-level refusal.
    pub async fn resolve(&self, latitude: f64, longitude: f64) -> ClientResult<String> {
        let url = format!(
            "{}{GEOCODE_PATH}",
            self.config.base_url.trim_end_matches('/')
        );
        let latlng = format!("{latitude},{longitude}");

        let mut query: Vec<(&str, &str)> =
            vec![("latlng", latlng.as_str()), ("key", self.config.api_key.as_str())];
        if let Some(language) = &self.config.language {
            query.push(("language", language.as_str()));
        }

        tracing::debug!(%latlng, "reverse geocoding");
        let response = self
            .http
            .get(&url)
            .query(&query)
            .header("accept", "application/json")
            .header("user-agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        if !status.is_success() {
            return Err(ClientError::remote(status.as_u16(), &body));
        }

        let parsed: GeocodeResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        match parsed.status.as_str() {
            "" | "OK" | "ZERO_RESULTS" => {}
            provider_status => {
                let message = match parsed.error_message {
                    Some(detail) => format!("{provider_status}: {detail}"),
                    None => provider_status.to_string(),
                };
                tracing::warn!(%message, "geocoding refused");
                return Err(ClientError::Remote {
                    status: status.as_u16(),
                    message: Some(message),
                });
            }
        }

        parsed
            .results
            .into_iter()
            .map(|r| r.formatted_address)
            .find(|address| !address.trim().is_empty())
            .ok_or(ClientError::NoResultsFound)
    }
}
