use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ModelRegistry;

/// One recorded AI invocation, as reported by the server.
///
/// Immutable once received. The server assigns `id` and computes all token
/// and cost figures; the client never derives them locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawUsageLog")]
pub struct UsageLog {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub model_used: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub estimated_cost: f64,
    pub response_time_ms: u64,
    pub prompt_text: String,
}

/// Wire shape accepted for [`UsageLog`].
///
/// The hosted service emits `_id`, `createdAt`, `responseTime` and `prompt`;
/// newer deployments use the canonical names. Both may appear in one document.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUsageLog {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<String>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    model_used: Option<String>,
    #[serde(default)]
    prompt_tokens: Option<u64>,
    #[serde(default)]
    completion_tokens: Option<u64>,
    #[serde(default)]
    total_tokens: Option<u64>,
    #[serde(default)]
    estimated_cost: Option<f64>,
    #[serde(default)]
    response_time_ms: Option<u64>,
    #[serde(default)]
    response_time: Option<u64>,
    #[serde(default)]
    prompt_text: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UsageLogError {
    #[error("usage log has no id")]
    MissingId,
    #[error("usage log {0} has no timestamp")]
    MissingTimestamp(String),
}

impl TryFrom<RawUsageLog> for UsageLog {
    type Error = UsageLogError;

    fn try_from(raw: RawUsageLog) -> Result<Self, Self::Error> {
        let id = raw.id.or(raw.mongo_id).ok_or(UsageLogError::MissingId)?;
        let timestamp = raw
            .timestamp
            .or(raw.created_at)
            .ok_or_else(|| UsageLogError::MissingTimestamp(id.clone()))?;
        Ok(Self {
            id,
            timestamp,
            model_used: raw.model_used.unwrap_or_default(),
            prompt_tokens: raw.prompt_tokens.unwrap_or(0),
            completion_tokens: raw.completion_tokens.unwrap_or(0),
            total_tokens: raw.total_tokens.unwrap_or(0),
            estimated_cost: raw.estimated_cost.unwrap_or(0.0),
            response_time_ms: raw.response_time_ms.or(raw.response_time).unwrap_or(0),
            prompt_text: raw.prompt_text.or(raw.prompt).unwrap_or_default(),
        })
    }
}

/// Server-computed usage totals.
///
/// Consistent with the logs returned by the same sync; see
/// [`crate::stats::check_consistency`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawAggregateStats")]
pub struct AggregateStats {
    pub total_tokens: u64,
    pub total_cost: f64,
    pub total_requests: u64,
    pub avg_response_time_ms: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAggregateStats {
    #[serde(default)]
    total_tokens: Option<u64>,
    #[serde(default)]
    total_cost: Option<f64>,
    #[serde(default)]
    total_requests: Option<u64>,
    #[serde(default)]
    avg_response_time_ms: Option<f64>,
    #[serde(default)]
    avg_response_time: Option<f64>,
}

impl From<RawAggregateStats> for AggregateStats {
    fn from(raw: RawAggregateStats) -> Self {
        Self {
            total_tokens: raw.total_tokens.unwrap_or(0),
            total_cost: raw.total_cost.unwrap_or(0.0),
            total_requests: raw.total_requests.unwrap_or(0),
            avg_response_time_ms: raw
                .avg_response_time_ms
                .or(raw.avg_response_time)
                .unwrap_or(0.0),
        }
    }
}

impl AggregateStats {
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn is_zeroed(&self) -> bool {
        *self == Self::default()
    }
}

/// Authenticated identity returned by login, register and `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// A prompt the user wants processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub text: String,
    pub model_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("prompt is empty")]
    Empty,
    #[error("unknown model: {0}")]
    UnknownModel(String),
}

impl PromptRequest {
    pub fn new(text: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model_id: model_id.into(),
        }
    }

    /// True when the text is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Validate against the model registry before any network call.
    pub fn validate(&self, registry: &ModelRegistry) -> Result<(), PromptError> {
        if self.is_blank() {
            return Err(PromptError::Empty);
        }
        if registry.get(&self.model_id).is_none() {
            return Err(PromptError::UnknownModel(self.model_id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_log_accepts_hosted_field_names() {
        let json = r#"{
            "_id": "65a1",
            "createdAt": "2024-01-15T10:30:00.000Z",
            "modelUsed": "gpt-4",
            "promptTokens": 12,
            "completionTokens": 30,
            "totalTokens": 42,
            "estimatedCost": 0.00189,
            "responseTime": 812,
            "prompt": "hello, world"
        }"#;
        let log: UsageLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.id, "65a1");
        assert_eq!(log.total_tokens, 42);
        assert_eq!(log.response_time_ms, 812);
        assert_eq!(log.prompt_text, "hello, world");
        assert_eq!(log.timestamp.to_rfc3339(), "2024-01-15T10:30:00+00:00");
    }

    #[test]
    fn usage_log_tolerates_both_spellings_in_one_document() {
        let json = r#"{
            "_id": "a",
            "id": "a",
            "timestamp": "2024-01-15T10:30:00Z",
            "createdAt": "2024-01-15T10:30:01Z",
            "modelUsed": "claude-2"
        }"#;
        let log: UsageLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.timestamp.to_rfc3339(), "2024-01-15T10:30:00+00:00");
        assert_eq!(log.total_tokens, 0);
        assert_eq!(log.estimated_cost, 0.0);
    }

    #[test]
    fn usage_log_without_timestamp_is_rejected() {
        let err = serde_json::from_str::<UsageLog>(r#"{"_id": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("no timestamp"));
    }

    #[test]
    fn stats_default_missing_fields_to_zero() {
        let stats: AggregateStats =
            serde_json::from_str(r#"{"totalTokens": 150, "avgResponseTime": 40.5}"#).unwrap();
        assert_eq!(stats.total_tokens, 150);
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.avg_response_time_ms, 40.5);
        assert!(AggregateStats::zeroed().is_zeroed());
        assert!(!stats.is_zeroed());
    }

    #[test]
    fn prompt_validation() {
        let registry = ModelRegistry::builtin();
        assert_eq!(
            PromptRequest::new("   ", "gpt-4").validate(&registry),
            Err(PromptError::Empty)
        );
        assert_eq!(
            PromptRequest::new("hi", "gpt-9").validate(&registry),
            Err(PromptError::UnknownModel("gpt-9".to_string()))
        );
        assert!(PromptRequest::new(" hi ", "gpt-4").validate(&registry).is_ok());
    }
}
