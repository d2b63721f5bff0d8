//! Login, registration and password reset.
//!
//! `AuthClient` never persists anything: a successful login hands the token
//! back to the caller, who stores it in the `SessionStore`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{ApiClient, decode, remote_error, send};
use crate::error::{ClientError, ClientResult, extract_message};

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Returns true when `email` looks like `local@domain.tld`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ResetPasswordRequest<'a> {
    email: &'a str,
}

#[derive(Deserialize)]
struct ResetPasswordResponse {
    #[serde(default)]
    success: bool,
}

/// Unauthenticated account endpoints.
#[derive(Debug, Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Exchanges credentials for a session token.
    ///
    /// # Errors
    /// `Validation` for an empty field, `InvalidCredentials` when the service
    /// refuses them, `RemoteError` for server failures, `NetworkError` for
    /// transport failures.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<String> {
        if email.trim().is_empty() {
            return Err(ClientError::Validation("email"));
        }
        if password.is_empty() {
            return Err(ClientError::Validation("password"));
        }

        tracing::debug!("POST /login");
        let response = send(self.api.post("/login").json(&LoginRequest {
            email: email.trim(),
            password,
        }))
        .await?;

        let status = response.status();
        if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), "login refused");
            return Err(ClientError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(remote_error(response).await);
        }

        let body: LoginResponse = decode(response).await?;
        match body.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ClientError::InvalidCredentials),
        }
    }

    /// Creates a new account.
    ///
    /// # Errors
    /// `PasswordMismatch` before any request when the passwords differ;
    /// `RegistrationFailed` with the service message on refusal.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> ClientResult<()> {
        if password != confirm_password {
            return Err(ClientError::PasswordMismatch);
        }

        tracing::debug!("POST /register");
        let response = send(self.api.post("/register").json(&RegisterRequest {
            name: name.trim(),
            email: email.trim(),
            password,
        }))
        .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "registration refused");
        Err(ClientError::RegistrationFailed(extract_message(&body)))
    }

    /// Asks the service to email a password reset link.
    ///
    /// # Errors
    /// `InvalidEmail` before any request for a malformed address;
    /// `PasswordResetRejected` when the service answers `success: false`.
    pub async fn request_password_reset(&self, email: &str) -> ClientResult<()> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(ClientError::InvalidEmail);
        }

        tracing::debug!("POST /reset-password");
        let response = send(
            self.api
                .post("/reset-password")
                .json(&ResetPasswordRequest { email }),
        )
        .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }

        let body: ResetPasswordResponse = decode(response).await?;
        if body.success {
            Ok(())
        } else {
            Err(ClientError::PasswordResetRejected)
        }
    }
}
