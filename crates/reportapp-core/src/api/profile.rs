//! Signed-in user profile.

use serde::{Deserialize, Serialize};

use super::{ApiClient, decode, remote_error, send};
use crate::error::{ClientError, ClientResult};
use crate::models::UserProfile;
use crate::session::SessionStore;

#[derive(Deserialize)]
struct ProfileResponse {
    user: UserProfile,
}

#[derive(Serialize)]
struct UpdateUserRequest<'a> {
    name: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone)]
pub struct ProfileClient {
    api: ApiClient,
    session: SessionStore,
}

impl ProfileClient {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    /// # Errors
    /// `Unauthenticated`, `RemoteError`, `NetworkError`, `InvalidResponse`.
    pub async fn fetch(&self) -> ClientResult<UserProfile> {
        let token = self.session.require().await?;

        tracing::debug!("GET /profile");
        let response = send(self.api.get("/profile").bearer_auth(token)).await?;
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        let body: ProfileResponse = decode(response).await?;
        Ok(body.user)
    }

    /// Changes the display name and password.
    ///
    /// # Errors
    /// `PasswordMismatch` or `Validation("name")` before any request;
    /// `Unauthenticated`, `RemoteError`, `NetworkError` otherwise.
    pub async fn update(
        &self,
        name: &str,
        password: &str,
        confirm_password: &str,
    ) -> ClientResult<()> {
        if password != confirm_password {
            return Err(ClientError::PasswordMismatch);
        }
        if name.trim().is_empty() {
            return Err(ClientError::Validation("name"));
        }
        let token = self.session.require().await?;

        tracing::debug!("PUT /update-user-info");
        let response = send(
            self.api
                .put("/update-user-info")
                .bearer_auth(token)
                .json(&UpdateUserRequest {
                    name: name.trim(),
                    password,
                }),
        )
        .await?;
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        tracing::info!("profile updated");
        Ok(())
    }
}
