//! Request/response types for the hosted token usage API.
//!
//! Data endpoints wrap their payload in `{success, data?, message?}`. The
//! server is loose about that shape (`message` may be missing or not a
//! string, `success` may be absent), so [`Envelope::decode`] reads it
//! field by field instead of failing the whole body.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use tokentrack_core::{AggregateStats, UsageLog, UserProfile};

// ─── Auth ────────────────────────────────────────────────────────────────────

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// `GET /auth/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub user: UserProfile,
}

// ─── AI ──────────────────────────────────────────────────────────────────────

/// `POST /ai/process`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessPromptRequest {
    pub prompt: String,
    pub model: String,
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// A decoded `{success, data?, message?}` body.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    /// The body as received, kept for diagnostics.
    pub raw: serde_json::Value,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decode an envelope body.
    ///
    /// A missing or non-boolean `success` reads as `false`; a non-string or
    /// blank `message` reads as absent. Only a present `data` that does not
    /// match `T` is an error.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: serde_json::Value = serde_json::from_slice(bytes)?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        let success = raw
            .get("success")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        let message = message_field(&raw);
        let data = match raw.get("data") {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(T::deserialize(value)?),
        };
        Ok(Self {
            success,
            data,
            message,
            raw,
        })
    }
}

/// Pull a human-readable message out of any JSON error body.
///
/// Looks at `message`, then `error`, then `error.message`. Returns `None`
/// for bodies that are not JSON or carry no usable text.
pub fn error_message(bytes: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    message_field(&value).or_else(|| {
        let error = value.get("error")?;
        non_blank(error.as_str()).or_else(|| message_field(error))
    })
}

fn message_field(value: &serde_json::Value) -> Option<String> {
    non_blank(value.get("message").and_then(serde_json::Value::as_str))
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
