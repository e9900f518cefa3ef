//! Session, connectivity and data synchronization for the tokentrack client.
//!
//! [`Controller`] is the entry point a front end talks to. It owns a
//! [`SessionManager`] (token lifecycle), a [`HealthMonitor`] (backend
//! reachability), a [`DataSynchronizer`] (atomic logs + stats fetch) and a
//! [`PromptSubmitter`] (prompt submission followed by a resync).

pub mod backend;
pub mod controller;
pub mod error;
pub mod health;
pub mod session;
pub mod store;
pub mod submit;
pub mod sync;
pub mod trace;

pub use backend::UsageBackend;
pub use controller::{Controller, ControllerSettings, Dashboard, Startup};
pub use error::{Activity, ControllerError, Endpoint, ErrorKind};
pub use health::{ConnectivityState, ConnectivityStatus, HealthMonitor};
pub use session::{AuthToken, Registration, Session, SessionManager, SessionStatus};
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};
pub use submit::{PromptSubmitter, SubmitOutcome};
pub use sync::{DataSynchronizer, SyncOutcome, SyncResult};
pub use trace::{ApiTrace, TraceKind, TraceRecorder};
