use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use tokentrack_api_types::ProcessPromptRequest;
use tokentrack_core::{ModelRegistry, PromptRequest};

use crate::backend::UsageBackend;
use crate::error::{
    Activity, CONNECTIVITY_FALLBACK, ControllerError, NOT_SIGNED_IN, SUBMISSION_FALLBACK,
    server_message_or,
};
use crate::health::HealthMonitor;
use crate::session::Session;
use crate::sync::{DataSynchronizer, SyncOutcome};
use crate::trace::{TraceKind, TraceRecorder};

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank prompt: nothing was sent.
    Skipped,
    /// The server accepted the prompt and a resync ran.
    Submitted(SyncOutcome),
}

/// Clears the busy flag when a submission ends.
struct Busy<'a>(&'a AtomicBool);

impl<'a> Busy<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Sends prompts for processing, then resyncs so displayed totals come
/// from the server.
pub struct PromptSubmitter<B> {
    backend: Arc<B>,
    health: Arc<HealthMonitor<B>>,
    synchronizer: Arc<DataSynchronizer<B>>,
    registry: ModelRegistry,
    trace: TraceRecorder,
    busy: AtomicBool,
}

impl<B: UsageBackend> PromptSubmitter<B> {
    pub fn new(
        backend: Arc<B>,
        health: Arc<HealthMonitor<B>>,
        synchronizer: Arc<DataSynchronizer<B>>,
        registry: ModelRegistry,
        trace: TraceRecorder,
    ) -> Self {
        Self {
            backend,
            health,
            synchronizer,
            registry,
            trace,
            busy: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn is_submitting(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Submit `request`.
    ///
    /// A blank prompt is ignored; anything else needs a signed-in session.
    /// On success the prompt text is cleared
    /// after the resync; on failure it is left as typed so the user can
    /// retry.
    pub async fn submit(
        &self,
        session: &Session,
        request: &mut PromptRequest,
    ) -> Result<SubmitOutcome, ControllerError> {
        if request.is_blank() {
            debug!("Ignoring blank prompt");
            return Ok(SubmitOutcome::Skipped);
        }
        request
            .validate(&self.registry)
            .map_err(|e| ControllerError::Validation(e.to_string()))?;
        let Some(token) = session.token() else {
            return Err(ControllerError::Auth(NOT_SIGNED_IN.to_string()));
        };

        if self.health.state().is_disconnected() {
            return Err(ControllerError::Connectivity(
                CONNECTIVITY_FALLBACK.to_string(),
            ));
        }
        if self.synchronizer.is_syncing() {
            return Err(ControllerError::Busy(Activity::Sync));
        }
        let Some(_busy) = Busy::acquire(&self.busy) else {
            return Err(ControllerError::Busy(Activity::Submission));
        };

        self.trace.clear();
        let req = ProcessPromptRequest {
            prompt: request.text.clone(),
            model: request.model_id.clone(),
        };

        let env = match self.backend.process_prompt(Some(token.expose()), &req).await {
            Ok(env) => env,
            Err(e) => {
                warn!("Prompt processing failed: {e}");
                self.trace.record(TraceKind::Error(e.to_string()));
                return Err(ControllerError::Submission(server_message_or(
                    &e,
                    SUBMISSION_FALLBACK,
                )));
            }
        };
        self.trace.record(TraceKind::Process(env.raw.clone()));
        if !env.success {
            let message = env
                .message
                .unwrap_or_else(|| SUBMISSION_FALLBACK.to_string());
            warn!("Prompt processing rejected: {message}");
            return Err(ControllerError::Submission(message));
        }

        info!(model = %request.model_id, "Prompt processed; resyncing");
        let outcome = self.synchronizer.sync(session).await;
        request.text.clear();
        Ok(SubmitOutcome::Submitted(outcome))
    }
}
