//! Typed clients for the report service REST API.

mod auth;
mod profile;
mod reports;

pub use auth::{AuthClient, is_valid_email};
pub use profile::ProfileClient;
pub use reports::ReportClient;

use serde::de::DeserializeOwned;

use crate::error::{ClientError, ClientResult, classify_reqwest_error};

/// Standard User-Agent header for ReportApp requests.
pub const USER_AGENT: &str = concat!("reportapp/", env!("CARGO_PKG_VERSION"));

/// Connection to the report service, shared by every API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for `base_url` (trailing slashes are ignored).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(base_url, reqwest::Client::new())
    }

    pub fn with_http(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::GET, path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::POST, path)
    }

    fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::PUT, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("accept", "application/json")
            .header("user-agent", USER_AGENT)
    }
}

/// Sends a request, mapping transport failures onto the taxonomy.
async fn send(builder: reqwest::RequestBuilder) -> ClientResult<reqwest::Response> {
    builder.send().await.map_err(|e| {
        let err = classify_reqwest_error(&e);
        tracing::warn!(kind = err.kind(), error = %err, "request failed before a response");
        err
    })
}

/// Decodes a JSON success body.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let body = response
        .text()
        .await
        .map_err(|e| classify_reqwest_error(&e))?;
    serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

/// Builds a `Remote` error from a non-success response.
async fn remote_error(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ClientError::remote(status, &body)
}
