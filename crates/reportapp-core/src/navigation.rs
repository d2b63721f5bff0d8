//! Root navigation state machine.
//!
//! The gate is `Authenticated` exactly when a session token has been
//! stored; it never looks at anything else.

use tokio::sync::watch;

use crate::api::AuthClient;
use crate::error::ClientResult;
use crate::session::SessionStore;

/// Screens the application can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    ResetPassword,
    Home,
    NewReport,
    MyReports,
    Logout,
    ReportDetails,
    EditReport,
    Profile,
}

impl Route {
    /// Bottom tabs of the authenticated screen set, in display order.
    pub const MAIN_TABS: [Route; 4] = [Route::Home, Route::NewReport, Route::MyReports, Route::Logout];

    pub fn requires_session(self) -> bool {
        !matches!(self, Route::Login | Route::Register | Route::ResetPassword)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GateState {
    #[default]
    Unauthenticated,
    Authenticated,
}

impl GateState {
    /// Screen shown when entering this state.
    pub fn initial_route(self) -> Route {
        match self {
            GateState::Unauthenticated => Route::Login,
            GateState::Authenticated => Route::Home,
        }
    }
}

/// Decides which screen set is reachable.
pub struct NavigationGate {
    session: SessionStore,
    state: watch::Sender<GateState>,
}

impl NavigationGate {
    /// Starts `Unauthenticated`; call [`Self::restore`] on cold start.
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            state: watch::channel(GateState::Unauthenticated).0,
        }
    }

    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.subscribe()
    }

    pub fn can_visit(&self, route: Route) -> bool {
        !route.requires_session() || self.state() == GateState::Authenticated
    }

    /// Derives the state from a previously stored token.
    ///
    /// # Errors
    /// `Storage` when the token cannot be read; the gate then stays
    /// `Unauthenticated`.
    pub async fn restore(&self) -> ClientResult<GateState> {
        let next = match self.session.get().await? {
            Some(_) => GateState::Authenticated,
            None => GateState::Unauthenticated,
        };
        self.transition(next);
        Ok(next)
    }

    /// Logs in and persists the token. The gate flips only after both succeed.
    ///
    /// # Errors
    /// Any `AuthClient::login` error, or `Storage` when the token cannot be saved.
    pub async fn sign_in(&self, auth: &AuthClient, email: &str, password: &str) -> ClientResult<()> {
        let token = auth.login(email, password).await?;
        self.session.set(&token).await?;
        self.transition(GateState::Authenticated);
        Ok(())
    }

    /// Clears the session, then returns to the login screen set.
    ///
    /// # Errors
    /// `Storage` when the token cannot be removed; the gate stays
    /// `Authenticated`.
    pub async fn logout(&self) -> ClientResult<()> {
        self.session.clear().await?;
        self.transition(GateState::Unauthenticated);
        Ok(())
    }

    fn transition(&self, next: GateState) {
        let changed = self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
        if changed {
            tracing::info!(state = ?next, "navigation gate changed");
        }
    }
}
