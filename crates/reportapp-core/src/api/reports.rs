//! Report CRUD and category taxonomy.

use serde::{Deserialize, Serialize};

use super::{ApiClient, decode, remote_error, send};
use crate::error::{ClientError, ClientResult};
use crate::models::{Category, FormDraft, Report};
use crate::session::SessionStore;

#[derive(Serialize)]
struct AddReportRequest<'a> {
    title: &'a str,
    #[serde(rename = "type")]
    category: &'a str,
    description: &'a str,
    image: Option<&'a str>,
    location: &'a str,
}

#[derive(Serialize)]
struct UpdateReportRequest<'a> {
    report_id: i64,
    title: &'a str,
    #[serde(rename = "type")]
    category: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct DeleteReportRequest {
    report_id: i64,
}

#[derive(Deserialize)]
struct TypeListResponse {
    #[serde(rename = "type", default)]
    types: Vec<Category>,
}

/// Authorized report operations.
///
/// Every operation that needs a token reads it from the session first and
/// fails with `Unauthenticated` without touching the network when absent.
#[derive(Debug, Clone)]
pub struct ReportClient {
    api: ApiClient,
    session: SessionStore,
    categories_require_auth: bool,
}

impl ReportClient {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self {
            api,
            session,
            categories_require_auth: false,
        }
    }

    /// Sends the bearer token with `/type-list` too.
    #[must_use]
    pub fn with_categories_require_auth(mut self, required: bool) -> Self {
        self.categories_require_auth = required;
        self
    }

    /// Reports owned by the signed-in user. An empty list is not an error.
    ///
    /// # Errors
    /// `Unauthenticated`, `RemoteError`, `NetworkError`, `InvalidResponse`.
    pub async fn list_mine(&self) -> ClientResult<Vec<Report>> {
        let token = self.session.require().await?;

        tracing::debug!("GET /reports");
        let response = send(self.api.get("/reports").bearer_auth(token)).await?;
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        decode(response).await
    }

    /// Submits a new report and returns it with its server-assigned id.
    ///
    /// # Errors
    /// `Unauthenticated`, `Validation` for a missing title or category,
    /// `RemoteError` on a non-2xx answer.
    pub async fn create(&self, draft: &FormDraft) -> ClientResult<Report> {
        let token = self.session.require().await?;
        draft.validate()?;

        tracing::debug!(has_image = draft.image.is_some(), "POST /add-report");
        let request = AddReportRequest {
            title: draft.title.trim(),
            category: draft.category.trim(),
            description: &draft.description,
            image: draft.image.as_deref(),
            location: draft.location.trim(),
        };
        let response = send(self.api.post("/add-report").bearer_auth(token).json(&request)).await?;
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }

        let report: Report = decode(response).await?;
        tracing::info!(report_id = report.id, "report created");
        Ok(report)
    }

    /// Rewrites the editable fields of an existing report.
    ///
    /// # Errors
    /// `Unauthenticated`, `Validation`, `NotFound` when the report is gone,
    /// `RemoteError` for any other non-2xx answer.
    pub async fn update(
        &self,
        id: i64,
        title: &str,
        category: &str,
        description: &str,
    ) -> ClientResult<()> {
        let token = self.session.require().await?;
        if title.trim().is_empty() {
            return Err(ClientError::Validation("title"));
        }
        if category.trim().is_empty() {
            return Err(ClientError::Validation("category"));
        }

        tracing::debug!(report_id = id, "POST /update-report");
        let request = UpdateReportRequest {
            report_id: id,
            title: title.trim(),
            category: category.trim(),
            description,
        };
        let response = send(
            self.api
                .post("/update-report")
                .bearer_auth(token)
                .json(&request),
        )
        .await?;
        expect_success_or_not_found(response).await?;
        tracing::info!(report_id = id, "report updated");
        Ok(())
    }

    /// Deletes a report.
    ///
    /// # Errors
    /// `Unauthenticated`, `NotFound` on 404, `RemoteError` otherwise.
    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        let token = self.session.require().await?;

        tracing::debug!(report_id = id, "POST /delete-report");
        let response = send(
            self.api
                .post("/delete-report")
                .bearer_auth(token)
                .json(&DeleteReportRequest { report_id: id }),
        )
        .await?;
        expect_success_or_not_found(response).await?;
        tracing::info!(report_id = id, "report deleted");
        Ok(())
    }

    /// Category taxonomy for the report form.
    ///
    /// # Errors
    /// `RemoteError`, `NetworkError`, `InvalidResponse`; `Unauthenticated`
    /// only when configured to send the token.
    pub async fn list_categories(&self) -> ClientResult<Vec<Category>> {
        let mut builder = self.api.get("/type-list");
        if self.categories_require_auth {
            builder = builder.bearer_auth(self.session.require().await?);
        }

        tracing::debug!("GET /type-list");
        let response = send(builder).await?;
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        let body: TypeListResponse = decode(response).await?;
        Ok(body.types)
    }
}

async fn expect_success_or_not_found(response: reqwest::Response) -> ClientResult<()> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound);
    }
    if !status.is_success() {
        return Err(remote_error(response).await);
    }
    Ok(())
}
