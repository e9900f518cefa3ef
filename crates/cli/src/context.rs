use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokentrack_api_client::ApiClient;
use tokentrack_runtime_config::TrackerConfig;
use tokentrack_session::{
    Controller, ControllerSettings, FileTokenStore, Startup, SyncOutcome, SyncResult, TokenStore,
};

pub type TrackerController = Controller<ApiClient, FileTokenStore>;

/// Everything one command invocation needs.
pub struct App {
    pub config: TrackerConfig,
    pub controller: TrackerController,
    store_path: std::path::PathBuf,
}

impl App {
    pub fn open() -> Result<Self> {
        let config = crate::config::load_config()?;
        let client = ApiClient::new(
            &config.server.url,
            Duration::from_secs(config.server.timeout_secs),
        )
        .context("Failed to build HTTP client")?;
        let store_path = tokentrack_paths::token_path()?;
        let controller = Controller::new(
            client,
            FileTokenStore::new(&store_path),
            ControllerSettings::from_config(&config),
        );
        Ok(Self {
            config,
            controller,
            store_path,
        })
    }

    /// True when a token is stored locally. Makes no request.
    pub fn has_stored_token(&self) -> Result<bool> {
        Ok(FileTokenStore::new(&self.store_path).load()?.is_some())
    }

    /// Restore the stored session and run the initial sync. Fails when
    /// there is no usable session or the sync failed.
    pub async fn start_signed_in(&self) -> Result<(Startup, SyncResult)> {
        if !self.has_stored_token()? {
            bail!("Not signed in. Run `tokentrack login` first.");
        }
        let startup = self.controller.start().await;
        if !startup.session.is_authenticated() {
            bail!("Stored session is no longer valid. Run `tokentrack login` again.");
        }
        let result = match &startup.sync {
            Some(SyncOutcome::Published(result)) => result.clone(),
            _ => self.controller.latest(),
        };
        if let Some(err) = &result.error {
            bail!("{err}");
        }
        Ok((startup, result))
    }
}
