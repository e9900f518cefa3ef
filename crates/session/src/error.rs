use std::fmt;

use tokentrack_api_client::ApiError;

pub const CONNECTIVITY_FALLBACK: &str =
    "Backend server is not responding. Please check if the server is running.";
pub const LOGIN_FALLBACK: &str = "Login failed";
pub const REGISTER_FALLBACK: &str = "Registration failed";
pub const SUBMISSION_FALLBACK: &str = "AI processing failed";
pub const NOT_SIGNED_IN: &str = "Not signed in";

/// Which data fetch a sync failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Logs,
    Stats,
    /// Both fetches succeeded but disagree with each other.
    LogsAndStats,
}

impl Endpoint {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Logs => "Logs API",
            Self::Stats => "Stats API",
            Self::LogsAndStats => "Logs/Stats API",
        }
    }

    /// Message used when the server gave none.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::Logs => "Invalid response format from logs API",
            Self::Stats => "Invalid response format from stats API",
            Self::LogsAndStats => "Logs and stats responses are inconsistent",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Something the controller is already busy with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Sync,
    Submission,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sync => "a sync",
            Self::Submission => "a submission",
        })
    }
}

/// Coarse classification of a [`ControllerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connectivity,
    Auth,
    Validation,
    Sync,
    Submission,
    Busy,
    Storage,
}

/// Every failure the controller reports to its caller.
///
/// Each variant carries a human-readable message: the server's text when
/// it sent one, a fixed fallback otherwise.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("Backend error: {0}")]
    Connectivity(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Validation(String),

    #[error("Backend error: {endpoint}: {message}")]
    Sync { endpoint: Endpoint, message: String },

    #[error("Processing error: {0}")]
    Submission(String),

    #[error("{0} is already in progress")]
    Busy(Activity),

    #[error("could not persist session token: {0}")]
    Storage(String),
}

impl ControllerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connectivity(_) => ErrorKind::Connectivity,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Sync { .. } => ErrorKind::Sync,
            Self::Submission(_) => ErrorKind::Submission,
            Self::Busy(_) => ErrorKind::Busy,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Connectivity(m)
            | Self::Auth(m)
            | Self::Validation(m)
            | Self::Submission(m)
            | Self::Storage(m) => m.clone(),
            Self::Sync { endpoint, message } => format!("{endpoint}: {message}"),
            Self::Busy(activity) => format!("{activity} is already in progress"),
        }
    }

    pub(crate) fn sync(endpoint: Endpoint, err: &ApiError) -> Self {
        Self::Sync {
            endpoint,
            message: server_message_or(err, endpoint.fallback_message()),
        }
    }
}

/// The server's message for `err`, or `fallback`.
pub(crate) fn server_message_or(err: &ApiError, fallback: &str) -> String {
    err.server_message().unwrap_or(fallback).to_string()
}

impl From<crate::store::StoreError> for ControllerError {
    fn from(err: crate::store::StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}
