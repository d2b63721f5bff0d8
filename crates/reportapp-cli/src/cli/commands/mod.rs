//! CLI command handlers.

use anyhow::{Context, Result};
use reportapp_core::api::{ApiClient, AuthClient, ProfileClient, ReportClient};
use reportapp_core::config::Config;
use reportapp_core::navigation::NavigationGate;
use reportapp_core::session::{FileTokenStore, SessionStore};

pub mod auth;
pub mod config;
pub mod profile;
pub mod reports;

/// Clients wired from the loaded config and the on-disk session.
pub struct App {
    config: Config,
    session: SessionStore,
    api: ApiClient,
}

impl App {
    pub fn load() -> Result<Self> {
        let config = Config::load().context("load config")?;
        let base_url = config
            .resolved_api_base_url()
            .context("resolve API base URL")?;
        tracing::debug!(%base_url, "using report service");

        Ok(Self {
            session: SessionStore::new(FileTokenStore::at_default_path()),
            api: ApiClient::new(base_url),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gate(&self) -> NavigationGate {
        NavigationGate::new(self.session.clone())
    }

    pub fn auth(&self) -> AuthClient {
        AuthClient::new(self.api.clone())
    }

    pub fn reports(&self) -> ReportClient {
        ReportClient::new(self.api.clone(), self.session.clone())
            .with_categories_require_auth(self.config.categories_require_auth)
    }

    pub fn profile(&self) -> ProfileClient {
        ProfileClient::new(self.api.clone(), self.session.clone())
    }

    pub fn api_base_url(&self) -> &str {
        self.api.base_url()
    }
}
