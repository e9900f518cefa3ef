//! Logs + stats synchronization.
//!
//! One sync probes health, then fetches logs and stats concurrently. The
//! pair is published together or not at all. Overlapping calls are not
//! serialized; each gets a generation number and only the most recently
//! started one may publish.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use tokentrack_api_client::ApiError;
use tokentrack_api_types::Envelope;
use tokentrack_core::{AggregateStats, UsageLog, stats};

use crate::backend::UsageBackend;
use crate::error::{CONNECTIVITY_FALLBACK, ControllerError, Endpoint, NOT_SIGNED_IN};
use crate::health::HealthMonitor;
use crate::session::Session;
use crate::trace::{TraceKind, TraceRecorder};

/// Outcome of one sync: both collections populated, or both empty with an
/// error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncResult {
    /// Most recent first, as received.
    pub logs: Vec<UsageLog>,
    pub stats: AggregateStats,
    pub error: Option<ControllerError>,
    pub generation: u64,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SyncResult {
    fn succeeded(logs: Vec<UsageLog>, stats: AggregateStats) -> Self {
        Self {
            logs,
            stats,
            error: None,
            generation: 0,
            completed_at: Some(Utc::now()),
        }
    }

    fn failed(error: ControllerError) -> Self {
        Self {
            logs: Vec::new(),
            stats: AggregateStats::zeroed(),
            error: Some(error),
            generation: 0,
            completed_at: Some(Utc::now()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// This call's result is now the published one.
    Published(SyncResult),
    /// A later call started before this one finished; the result was dropped.
    Superseded { generation: u64 },
}

impl SyncOutcome {
    pub fn published(&self) -> Option<&SyncResult> {
        match self {
            Self::Published(result) => Some(result),
            Self::Superseded { .. } => None,
        }
    }
}

/// Decrements the in-flight counter when a sync ends, however it ends.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct DataSynchronizer<B> {
    backend: Arc<B>,
    health: Arc<HealthMonitor<B>>,
    trace: TraceRecorder,
    require_consistent_totals: bool,
    issued: AtomicU64,
    in_flight: AtomicUsize,
    published: Mutex<Option<SyncResult>>,
}

impl<B: UsageBackend> DataSynchronizer<B> {
    pub fn new(
        backend: Arc<B>,
        health: Arc<HealthMonitor<B>>,
        trace: TraceRecorder,
        require_consistent_totals: bool,
    ) -> Self {
        Self {
            backend,
            health,
            trace,
            require_consistent_totals,
            issued: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            published: Mutex::new(None),
        }
    }

    /// The most recently published result, if any sync has published yet.
    pub fn latest(&self) -> Option<SyncResult> {
        self.published_slot().clone()
    }

    /// True while at least one sync call is running.
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Drop published data and supersede any sync still running.
    pub fn reset(&self) {
        self.issued.fetch_add(1, Ordering::SeqCst);
        *self.published_slot() = None;
        self.trace.clear();
    }

    /// Run one sync with the credential from `session`.
    pub async fn sync(&self, session: &Session) -> SyncOutcome {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight::enter(&self.in_flight);
        debug!(generation, "Sync started");
        self.trace.clear();

        let (mut result, trace) = self.run(session).await;
        result.generation = generation;
        self.publish(result, trace)
    }

    /// Returns the result plus the raw response pair when both arrived.
    async fn run(&self, session: &Session) -> (SyncResult, Option<TraceKind>) {
        let connectivity = self.health.check_health().await;
        if connectivity.is_disconnected() {
            let err = ControllerError::Connectivity(CONNECTIVITY_FALLBACK.to_string());
            return (SyncResult::failed(err), None);
        }

        let Some(token) = session.token() else {
            let err = ControllerError::Auth(NOT_SIGNED_IN.to_string());
            return (SyncResult::failed(err), None);
        };

        let (logs, stats) = tokio::join!(
            self.backend.logs(token.expose()),
            self.backend.stats(token.expose())
        );

        let raw = match (&logs, &stats) {
            (Ok(l), Ok(s)) => Some(TraceKind::Sync {
                logs: l.raw.clone(),
                stats: s.raw.clone(),
            }),
            _ => None,
        };

        let result = match self.join(logs, stats) {
            Ok((logs, stats)) => SyncResult::succeeded(logs, stats),
            Err(err) => {
                warn!("Sync failed: {err}");
                SyncResult::failed(err)
            }
        };
        (result, raw)
    }

    /// Both fetches must succeed; otherwise the whole sync fails.
    fn join(
        &self,
        logs: Result<Envelope<Vec<UsageLog>>, ApiError>,
        stats: Result<Envelope<AggregateStats>, ApiError>,
    ) -> Result<(Vec<UsageLog>, AggregateStats), ControllerError> {
        let logs = accept(Endpoint::Logs, logs)?.unwrap_or_default();
        let stats = accept(Endpoint::Stats, stats)?.ok_or_else(|| ControllerError::Sync {
            endpoint: Endpoint::Stats,
            message: Endpoint::Stats.fallback_message().to_string(),
        })?;

        if self.require_consistent_totals {
            stats::check_consistency(&logs, &stats).map_err(|e| ControllerError::Sync {
                endpoint: Endpoint::LogsAndStats,
                message: e.to_string(),
            })?;
        }
        Ok((logs, stats))
    }

    fn publish(&self, result: SyncResult, trace: Option<TraceKind>) -> SyncOutcome {
        let mut slot = self.published_slot();
        // Checked under the slot lock so a newer call cannot publish in between.
        let latest = self.issued.load(Ordering::SeqCst);
        if result.generation != latest {
            debug!(
                generation = result.generation,
                latest, "Discarding superseded sync result"
            );
            return SyncOutcome::Superseded {
                generation: result.generation,
            };
        }

        if result.is_success() {
            info!(
                generation = result.generation,
                logs = result.logs.len(),
                total_tokens = result.stats.total_tokens,
                "Sync published"
            );
        }
        let trace = trace.or_else(|| {
            result
                .error
                .as_ref()
                .map(|err| TraceKind::Error(err.to_string()))
        });
        if let Some(trace) = trace {
            self.trace.record(trace);
        }
        *slot = Some(result.clone());
        SyncOutcome::Published(result)
    }

    fn published_slot(&self) -> std::sync::MutexGuard<'_, Option<SyncResult>> {
        self.published.lock().expect("sync result mutex poisoned")
    }
}

/// Unwrap one fetch: transport errors and `success: false` both fail.
fn accept<T>(
    endpoint: Endpoint,
    resp: Result<Envelope<T>, ApiError>,
) -> Result<Option<T>, ControllerError> {
    match resp {
        Err(e) => Err(ControllerError::sync(endpoint, &e)),
        Ok(env) if !env.success => Err(ControllerError::Sync {
            endpoint,
            message: env
                .message
                .unwrap_or_else(|| endpoint.fallback_message().to_string()),
        }),
        Ok(env) => Ok(env.data),
    }
}
