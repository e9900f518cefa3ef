use std::sync::Arc;

use tracing::info;

use tokentrack_core::export::{self, ExportError};
use tokentrack_core::projection::{self, ChartPoint};
use tokentrack_core::{ModelRegistry, PromptRequest, UsageLog};
use tokentrack_runtime_config::TrackerConfig;

use crate::backend::UsageBackend;
use crate::error::ControllerError;
use crate::health::{ConnectivityState, HealthMonitor};
use crate::session::{AuthToken, Registration, Session, SessionManager};
use crate::store::TokenStore;
use crate::submit::{PromptSubmitter, SubmitOutcome};
use crate::sync::{DataSynchronizer, SyncOutcome, SyncResult};
use crate::trace::{ApiTrace, TraceRecorder};

/// Knobs the controller takes from [`TrackerConfig`].
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub chart_window: usize,
    pub recent_limit: usize,
    pub require_consistent_totals: bool,
    pub registry: ModelRegistry,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}

impl ControllerSettings {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            chart_window: config.dashboard.chart_window,
            recent_limit: config.dashboard.recent_limit,
            require_consistent_totals: config.sync.require_consistent_totals,
            registry: config.model_registry(),
        }
    }
}

/// Where startup left things.
#[derive(Debug, Clone)]
pub struct Startup {
    pub session: Session,
    pub connectivity: ConnectivityState,
    /// `None` when there was no session to sync for.
    pub sync: Option<SyncOutcome>,
}

/// Everything a front end needs to draw one frame.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub session: Session,
    pub connectivity: ConnectivityState,
    /// Last published sync; empty before the first one.
    pub sync: SyncResult,
    pub chart: Vec<ChartPoint>,
    pub recent: Vec<UsageLog>,
    pub total_logs: usize,
    pub syncing: bool,
    pub submitting: bool,
    pub can_submit: bool,
    pub can_refresh: bool,
    pub can_export: bool,
    pub trace: Option<ApiTrace>,
}

/// Wires the session manager, health monitor, synchronizer and submitter
/// around one backend.
pub struct Controller<B, S> {
    session: SessionManager<B, S>,
    health: Arc<HealthMonitor<B>>,
    synchronizer: Arc<DataSynchronizer<B>>,
    submitter: PromptSubmitter<B>,
    trace: TraceRecorder,
    settings: ControllerSettings,
}

impl<B: UsageBackend, S: TokenStore> Controller<B, S> {
    pub fn new(backend: B, store: S, settings: ControllerSettings) -> Self {
        let backend = Arc::new(backend);
        let trace = TraceRecorder::default();
        let health = Arc::new(HealthMonitor::new(Arc::clone(&backend)));
        let synchronizer = Arc::new(DataSynchronizer::new(
            Arc::clone(&backend),
            Arc::clone(&health),
            trace.clone(),
            settings.require_consistent_totals,
        ));
        let submitter = PromptSubmitter::new(
            Arc::clone(&backend),
            Arc::clone(&health),
            Arc::clone(&synchronizer),
            settings.registry.clone(),
            trace.clone(),
        );
        Self {
            session: SessionManager::new(backend, store),
            health,
            synchronizer,
            submitter,
            trace,
            settings,
        }
    }

    /// Restore the stored session while probing health, then run the
    /// initial sync if a session came back.
    pub async fn start(&self) -> Startup {
        let (session, connectivity) = tokio::join!(self.restore(), self.health.check_health());
        info!(
            status = ?session.status(),
            backend = connectivity.status.label(),
            "Startup settled"
        );
        let sync = if session.is_authenticated() {
            Some(self.synchronizer.sync(&session).await)
        } else {
            None
        };
        Startup {
            session,
            connectivity,
            sync,
        }
    }

    // ── Session ───────────────────────────────────────────────────────────

    pub fn session(&self) -> Session {
        self.session.session()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ControllerError> {
        self.synchronizer.reset();
        self.session.login(email, password).await
    }

    pub async fn register(&self, form: &Registration) -> Result<Session, ControllerError> {
        self.synchronizer.reset();
        self.session.register(form).await
    }

    /// Restore and verify the stored session without syncing.
    ///
    /// Published data and any sync still running belong to the previous
    /// identity and are dropped.
    pub async fn restore(&self) -> Session {
        let session = self.session.restore().await;
        self.synchronizer.reset();
        session
    }

    /// Verify `token`; drops published data like [`Controller::restore`].
    pub async fn verify(&self, token: AuthToken) -> Session {
        let session = self.session.verify(token).await;
        self.synchronizer.reset();
        session
    }

    /// Sign out and drop every cached log and stat.
    pub fn logout(&self) {
        self.session.logout();
        self.synchronizer.reset();
    }

    // ── Health / data ─────────────────────────────────────────────────────

    pub async fn check_health(&self) -> ConnectivityState {
        self.health.check_health().await
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.health.state()
    }

    /// Manual refresh. Safe to call while another sync is running.
    pub async fn refresh(&self) -> SyncOutcome {
        self.synchronizer.sync(&self.session.session()).await
    }

    pub async fn submit(
        &self,
        request: &mut PromptRequest,
    ) -> Result<SubmitOutcome, ControllerError> {
        self.submitter.submit(&self.session.session(), request).await
    }

    pub fn models(&self) -> &ModelRegistry {
        self.submitter.registry()
    }

    // ── Views ─────────────────────────────────────────────────────────────

    /// Last published sync, or an empty result.
    pub fn latest(&self) -> SyncResult {
        self.synchronizer.latest().unwrap_or_default()
    }

    pub fn dashboard(&self) -> Dashboard {
        let session = self.session.session();
        let connectivity = self.health.state();
        let sync = self.latest();
        let syncing = self.synchronizer.is_syncing();
        let submitting = self.submitter.is_submitting();

        Dashboard {
            chart: projection::chart_series(&sync.logs, self.settings.chart_window),
            recent: projection::recent_activity(&sync.logs, self.settings.recent_limit).to_vec(),
            total_logs: sync.logs.len(),
            can_submit: session.is_authenticated()
                && !connectivity.is_disconnected()
                && !syncing
                && !submitting,
            can_refresh: !syncing,
            can_export: !sync.logs.is_empty() && !syncing,
            trace: self.trace.latest(),
            session,
            connectivity,
            sync,
            syncing,
            submitting,
        }
    }

    /// CSV of the published logs.
    pub fn export_csv(&self) -> Result<String, ExportError> {
        export::serialize_csv(&self.latest().logs)
    }
}
