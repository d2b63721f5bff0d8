//! Report creation/edit form.
//!
//! Phase machine: `Empty -> Editing -> Submitting -> (Submitted | Failed)`.
//! A creation form returns to `Empty` after a successful submission so the
//! same screen can be reused.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::api::ReportClient;
use crate::device::{Permission, Positioning};
use crate::error::{ClientError, ClientResult};
use crate::geocode::GeocodeResolver;
use crate::models::{Category, FormDraft, LocationDraft, Report};

/// Whether the form creates a new report or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { report_id: i64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormPhase {
    #[default]
    Empty,
    Editing,
    Submitting,
    Submitted,
    Failed,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Created(Report),
    Updated { report_id: i64 },
}

/// Last user-visible outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum FormNotice {
    Submitted(Submission),
    LocationResolved(String),
    Error(ClientError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub phase: FormPhase,
    pub draft: FormDraft,
    pub location: Option<LocationDraft>,
    /// Category choices, cached for the lifetime of the form.
    pub categories: Vec<Category>,
    /// A location lookup is running.
    pub locating: bool,
    pub notice: Option<FormNotice>,
}

struct LocationServices {
    positioning: Arc<dyn Positioning>,
    geocoder: GeocodeResolver,
}

/// Orchestrates the fields of one report being created or edited.
pub struct ReportFormController {
    mode: FormMode,
    reports: ReportClient,
    location: Option<LocationServices>,
    state: watch::Sender<FormState>,
    /// Bumped on every reset; results started under an older value are dropped.
    generation: AtomicU64,
}

impl ReportFormController {
    /// Blank form for a new report. Category starts unselected.
    pub fn new_report(reports: ReportClient) -> Self {
        Self::with_state(FormMode::Create, reports, FormState::default())
    }

    /// Form pre-filled from an existing report.
    pub fn edit_report(reports: ReportClient, report: &Report) -> Self {
        let state = FormState {
            phase: FormPhase::Editing,
            draft: FormDraft {
                title: report.title.clone(),
                category: report.category_value(),
                description: report.description.clone(),
                image: None,
                location: report.location.clone(),
            },
            ..FormState::default()
        };
        Self::with_state(
            FormMode::Edit {
                report_id: report.id,
            },
            reports,
            state,
        )
    }

    fn with_state(mode: FormMode, reports: ReportClient, state: FormState) -> Self {
        Self {
            mode,
            reports,
            location: None,
            state: watch::channel(state).0,
            generation: AtomicU64::new(0),
        }
    }

    /// Enables `acquire_location`.
    #[must_use]
    pub fn with_location(
        mut self,
        positioning: Arc<dyn Positioning>,
        geocoder: GeocodeResolver,
    ) -> Self {
        self.location = Some(LocationServices {
            positioning,
            geocoder,
        });
        self
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// Snapshot of the current state.
    pub fn get(&self) -> FormState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.state.subscribe()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.edit(|draft| draft.title = title);
    }

    /// Selects a category by id string; empty deselects.
    pub fn set_category(&self, category: impl Into<String>) {
        let category = category.into();
        self.edit(|draft| draft.category = category);
    }

    pub fn set_description(&self, description: impl Into<String>) {
        let description = description.into();
        self.edit(|draft| draft.description = description);
    }

    /// Manually typed address.
    pub fn set_location(&self, location: impl Into<String>) {
        let location = location.into();
        self.edit(|draft| draft.location = location);
    }

    /// Attaches a camera image reference, replacing any previous one.
    pub fn attach_image(&self, reference: impl Into<String>) {
        let reference = reference.into();
        self.edit(|draft| draft.image = Some(reference));
    }

    pub fn clear_image(&self) {
        self.edit(|draft| draft.image = None);
    }

    fn edit(&self, apply: impl FnOnce(&mut FormDraft)) {
        self.state.send_modify(|state| {
            apply(&mut state.draft);
            mark_editing(state);
        });
    }

    /// Fetches the category choices. A failure is surfaced without changing the phase.
    ///
    /// # Errors
    /// Whatever `ReportClient::list_categories` reports.
    pub async fn load_categories(&self) -> ClientResult<Vec<Category>> {
        match self.reports.list_categories().await {
            Ok(categories) => {
                self.state
                    .send_modify(|state| state.categories.clone_from(&categories));
                Ok(categories)
            }
            Err(err) => {
                tracing::warn!(kind = err.kind(), "could not load categories");
                self.state
                    .send_modify(|state| state.notice = Some(FormNotice::Error(err.clone())));
                Err(err)
            }
        }
    }

    /// Runs the permission, positioning and reverse-geocoding sub-flow.
    ///
    /// On failure the location stays unset (coordinates are never used as
    /// an address) and the form stays in `Editing`.
    ///
    /// # Errors
    /// `PermissionDenied`, `PositionUnavailable`, or any geocoding error.
    pub async fn acquire_location(&self) -> ClientResult<LocationDraft> {
        let generation = self.generation.load(Ordering::SeqCst);
        self.state.send_modify(|state| {
            mark_editing(state);
            state.locating = true;
        });

        let result = self.locate().await;

        self.apply_if_current(generation, |state| {
            state.locating = false;
            match &result {
                Ok(location) => {
                    state.draft.location.clone_from(&location.address);
                    state.location = Some(location.clone());
                    state.notice = Some(FormNotice::LocationResolved(location.address.clone()));
                }
                Err(err) => state.notice = Some(FormNotice::Error(err.clone())),
            }
        });

        if let Err(err) = &result {
            tracing::warn!(kind = err.kind(), "location lookup failed");
        }
        result
    }

    async fn locate(&self) -> ClientResult<LocationDraft> {
        let Some(services) = &self.location else {
            return Err(ClientError::PositionUnavailable(
                "location services are not configured".to_string(),
            ));
        };

        if services.positioning.request_permission().await == Permission::Denied {
            return Err(ClientError::PermissionDenied);
        }

        let coordinates = services.positioning.current_position().await?;
        let address = services
            .geocoder
            .resolve(coordinates.latitude, coordinates.longitude)
            .await?;

        Ok(LocationDraft {
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            address,
        })
    }

    /// Validates and sends the draft.
    ///
    /// Success clears the draft; failure moves to `Failed` and keeps it so a
    /// retry needs no re-entry.
    ///
    /// # Errors
    /// `SubmissionInProgress`, `Validation`, or the client error.
    pub async fn submit(&self) -> ClientResult<Submission> {
        let mut started: Option<ClientResult<FormDraft>> = None;
        self.state.send_if_modified(|state| {
            if state.phase == FormPhase::Submitting {
                started = Some(Err(ClientError::SubmissionInProgress));
                return false;
            }
            if let Err(err) = state.draft.validate() {
                state.phase = FormPhase::Failed;
                state.notice = Some(FormNotice::Error(err.clone()));
                started = Some(Err(err));
                return true;
            }
            state.phase = FormPhase::Submitting;
            state.notice = None;
            started = Some(Ok(state.draft.clone()));
            true
        });
        let draft = started.unwrap_or(Err(ClientError::SubmissionInProgress))?;

        let generation = self.generation.load(Ordering::SeqCst);
        let result = match self.mode {
            FormMode::Create => self.reports.create(&draft).await.map(Submission::Created),
            FormMode::Edit { report_id } => self
                .reports
                .update(report_id, &draft.title, &draft.category, &draft.description)
                .await
                .map(|()| Submission::Updated { report_id }),
        };

        let mode = self.mode;
        self.apply_if_current(generation, |state| match &result {
            Ok(submission) => {
                state.draft = FormDraft::default();
                state.location = None;
                state.notice = Some(FormNotice::Submitted(submission.clone()));
                state.phase = match mode {
                    FormMode::Create => FormPhase::Empty,
                    FormMode::Edit { .. } => FormPhase::Submitted,
                };
            }
            Err(err) => {
                state.phase = FormPhase::Failed;
                state.notice = Some(FormNotice::Error(err.clone()));
            }
        });

        match &result {
            Ok(submission) => tracing::info!(?submission, "report submitted"),
            Err(err) => tracing::warn!(kind = err.kind(), error = %err, "report submission failed"),
        }
        result
    }

    /// Focus event. A creation form always starts over; an edit form is left alone.
    pub fn on_screen_focused(&self) {
        if self.mode == FormMode::Create {
            self.reset();
        }
    }

    /// Blur event. Discards the captured location.
    pub fn on_screen_blurred(&self) {
        self.state.send_if_modified(|state| state.location.take().is_some());
    }

    /// Clears the draft and location. Clearing an empty form changes nothing.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_if_modified(|state| {
            let fresh = FormState {
                categories: state.categories.clone(),
                ..FormState::default()
            };
            if *state == fresh {
                return false;
            }
            *state = fresh;
            true
        });
    }

    fn apply_if_current(&self, generation: u64, apply: impl FnOnce(&mut FormState)) {
        if self.generation.load(Ordering::SeqCst) == generation {
            self.state.send_modify(apply);
        } else {
            tracing::debug!("form was reset while an operation was running; result dropped");
        }
    }
}

fn mark_editing(state: &mut FormState) {
    if matches!(
        state.phase,
        FormPhase::Empty | FormPhase::Failed | FormPhase::Submitted
    ) {
        state.phase = FormPhase::Editing;
    }
}
