use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

/// The last raw API exchange, kept for the debug panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiTrace {
    pub at: DateTime<Utc>,
    pub kind: TraceKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraceKind {
    /// Raw bodies of the logs and stats responses of one sync.
    Sync {
        logs: serde_json::Value,
        stats: serde_json::Value,
    },
    /// Raw body of a prompt submission response.
    Process(serde_json::Value),
    Error(String),
}

impl ApiTrace {
    pub fn now(kind: TraceKind) -> Self {
        Self {
            at: Utc::now(),
            kind,
        }
    }
}

/// Shared slot for the latest [`ApiTrace`]. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct TraceRecorder {
    slot: Arc<Mutex<Option<ApiTrace>>>,
}

impl TraceRecorder {
    pub fn record(&self, kind: TraceKind) {
        *self.slot() = Some(ApiTrace::now(kind));
    }

    pub fn clear(&self) {
        *self.slot() = None;
    }

    pub fn latest(&self) -> Option<ApiTrace> {
        self.slot().clone()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<ApiTrace>> {
        self.slot.lock().expect("trace mutex poisoned")
    }
}
