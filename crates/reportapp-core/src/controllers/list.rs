//! The signed-in user's report list.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::api::ReportClient;
use crate::error::{ClientError, ClientResult};
use crate::models::Report;

/// Last user-visible outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListNotice {
    Deleted { report_id: i64 },
    Error(ClientError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListState {
    pub reports: Vec<Report>,
    /// The newest refresh is in flight.
    pub loading: bool,
    pub notice: Option<ListNotice>,
}

/// How a refresh ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// This was the newest refresh; its list is now displayed.
    Applied(Vec<Report>),
    /// A newer refresh was issued meanwhile; this result was dropped.
    Superseded,
}

/// Holds the displayed list and refreshes it on every focus event.
///
/// Overlapping refreshes are allowed. Each one takes a sequence number and
/// only the most recently issued one may touch the displayed list.
pub struct ReportListController {
    reports: ReportClient,
    state: watch::Sender<ListState>,
    latest: AtomicU64,
}

impl ReportListController {
    pub fn new(reports: ReportClient) -> Self {
        Self {
            reports,
            state: watch::channel(ListState::default()).0,
            latest: AtomicU64::new(0),
        }
    }

    pub fn get(&self) -> ListState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.state.subscribe()
    }

    /// Focus event.
    ///
    /// # Errors
    /// See [`Self::refresh`].
    pub async fn on_screen_focused(&self) -> ClientResult<Refresh> {
        self.refresh().await
    }

    /// Re-fetches the list.
    ///
    /// A failure of the newest refresh keeps the previously displayed list
    /// and records the error. Results of older refreshes, successful or
    /// not, come back as `Superseded`.
    ///
    /// # Errors
    /// Whatever `ReportClient::list_mine` reports, for the newest refresh only.
    pub async fn refresh(&self) -> ClientResult<Refresh> {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_if_modified(|state| !std::mem::replace(&mut state.loading, true));

        let result = self.reports.list_mine().await;

        if self.latest.load(Ordering::SeqCst) != seq {
            tracing::warn!(seq, "discarding stale report list response");
            return Ok(Refresh::Superseded);
        }

        match result {
            Ok(reports) => {
                tracing::debug!(seq, count = reports.len(), "report list applied");
                self.state.send_modify(|state| {
                    state.reports.clone_from(&reports);
                    state.loading = false;
                    if matches!(state.notice, Some(ListNotice::Error(_))) {
                        state.notice = None;
                    }
                });
                Ok(Refresh::Applied(reports))
            }
            Err(err) => {
                tracing::warn!(seq, kind = err.kind(), "report list refresh failed");
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.notice = Some(ListNotice::Error(err.clone()));
                });
                Err(err)
            }
        }
    }

    /// Deletes a report, then refreshes.
    ///
    /// The displayed list is never edited locally; on failure it is left
    /// as it was.
    ///
    /// # Errors
    /// The delete error. A failure of the follow-up refresh is only
    /// recorded as a notice.
    pub async fn delete(&self, report_id: i64) -> ClientResult<()> {
        if let Err(err) = self.reports.delete(report_id).await {
            tracing::warn!(report_id, kind = err.kind(), "delete failed");
            self.state
                .send_modify(|state| state.notice = Some(ListNotice::Error(err.clone())));
            return Err(err);
        }

        self.state
            .send_modify(|state| state.notice = Some(ListNotice::Deleted { report_id }));
        // The refresh records its own failure.
        let _ = self.refresh().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::ApiClient;
    use crate::session::{MemoryTokenStore, SessionStore};

    fn controller(server: &MockServer, store: MemoryTokenStore) -> ReportListController {
        ReportListController::new(ReportClient::new(
            ApiClient::new(server.uri()),
            SessionStore::new(store),
        ))
    }

    fn report(id: i64, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "category": "Roads",
            "description": "",
            "location": "Main St",
            "type": {"id": 3, "name": "Roads"}
        })
    }

    fn ids(state: &ListState) -> Vec<i64> {
        state.reports.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn focus_refreshes_the_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reports"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([report(1, "a"), report(2, "b")])),
            )
            .expect(2)
            .mount(&server)
            .await;
        let list = controller(&server, MemoryTokenStore::with_token("tok"));

        list.on_screen_focused().await.unwrap();
        let refreshed = list.on_screen_focused().await.unwrap();

        let Refresh::Applied(reports) = refreshed else {
            panic!("expected the refresh to apply");
        };
        assert_eq!(reports.len(), 2);
        let state = list.get();
        assert_eq!(ids(&state), vec![1, 2]);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn slow_older_response_does_not_overwrite_newer_one() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reports"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([report(1, "old")]))
                    .set_delay(Duration::from_millis(300)),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/reports"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([report(1, "old"), report(7, "new")])),
            )
            .mount(&server)
            .await;
        let list = controller(&server, MemoryTokenStore::with_token("tok"));

        let (first, second) = tokio::join!(list.refresh(), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            list.refresh().await
        });

        assert_eq!(first, Ok(Refresh::Superseded));
        assert!(matches!(second, Ok(Refresh::Applied(_))));
        let state = list.get();
        assert_eq!(ids(&state), vec![1, 7]);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn stale_failure_is_discarded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reports"))
            .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(300)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/reports"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([report(3, "c")])))
            .mount(&server)
            .await;
        let list = controller(&server, MemoryTokenStore::with_token("tok"));

        let (first, _) = tokio::join!(list.refresh(), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            list.refresh().await
        });

        assert_eq!(first, Ok(Refresh::Superseded));
        let state = list.get();
        assert_eq!(ids(&state), vec![3]);
        assert_eq!(state.notice, None);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reports"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([report(5, "e")])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/reports"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let list = controller(&server, MemoryTokenStore::with_token("tok"));

        list.refresh().await.unwrap();
        let err = list.refresh().await.unwrap_err();

        assert_eq!(err.status(), Some(503));
        let state = list.get();
        assert_eq!(ids(&state), vec![5]);
        assert_eq!(state.notice, Some(ListNotice::Error(err)));
    }

    #[tokio::test]
    async fn refresh_without_session_is_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let list = controller(&server, MemoryTokenStore::new());

        assert_eq!(list.refresh().await, Err(ClientError::Unauthenticated));
        assert!(!list.get().loading);
    }

    #[tokio::test]
    async fn delete_of_missing_report_leaves_list_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reports"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([report(42, "x")])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/delete-report"))
            .and(body_json(json!({"report_id": 42})))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        let list = controller(&server, MemoryTokenStore::with_token("tok"));
        list.refresh().await.unwrap();

        assert_eq!(list.delete(42).await, Err(ClientError::NotFound));

        let state = list.get();
        assert_eq!(ids(&state), vec![42]);
        assert_eq!(state.notice, Some(ListNotice::Error(ClientError::NotFound)));
    }

    #[tokio::test]
    async fn delete_success_refreshes_from_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reports"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([report(1, "a"), report(2, "b")])),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/reports"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([report(2, "b")])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/delete-report"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let list = controller(&server, MemoryTokenStore::with_token("tok"));
        list.refresh().await.unwrap();

        list.delete(1).await.unwrap();

        let state = list.get();
        assert_eq!(ids(&state), vec![2]);
        assert_eq!(state.notice, Some(ListNotice::Deleted { report_id: 1 }));
    }
}
