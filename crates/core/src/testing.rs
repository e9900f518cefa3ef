use crate::{AggregateStats, UsageLog, UserProfile, stats};
use chrono::{DateTime, Duration, TimeZone, Utc};

/// Fixed reference instant (2024-01-15T10:00:00Z) so fixtures are reproducible.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0)
        .single()
        .expect("valid fixture time")
}

/// Usage log stamped `minute` minutes after [`base_time`].
///
/// Prompt/completion tokens split `total_tokens` roughly one third / two thirds.
pub fn log(id: &str, minute: i64, total_tokens: u64, cost: f64, response_ms: u64) -> UsageLog {
    let prompt_tokens = total_tokens / 3;
    UsageLog {
        id: id.to_string(),
        timestamp: base_time() + Duration::minutes(minute),
        model_used: "gpt-3.5-turbo".to_string(),
        prompt_tokens,
        completion_tokens: total_tokens - prompt_tokens,
        total_tokens,
        estimated_cost: cost,
        response_time_ms: response_ms,
        prompt_text: format!("prompt {id}"),
    }
}

/// `count` logs ordered most-recent first, ids `log-{n}`.
pub fn recent_logs(count: usize) -> Vec<UsageLog> {
    (0..count)
        .rev()
        .map(|i| log(&format!("log-{i}"), i as i64, 10 * (i as u64 + 1), 0.00001, 20))
        .collect()
}

/// Stats the server would report for exactly these logs.
pub fn stats_for(logs: &[UsageLog]) -> AggregateStats {
    let totals = stats::totals(logs);
    let avg = if logs.is_empty() {
        0.0
    } else {
        logs.iter().map(|l| l.response_time_ms as f64).sum::<f64>() / logs.len() as f64
    };
    AggregateStats {
        total_tokens: totals.total_tokens,
        total_cost: totals.total_cost,
        total_requests: totals.request_count,
        avg_response_time_ms: avg,
    }
}

pub fn user() -> UserProfile {
    UserProfile {
        id: "user-1".to_string(),
        email: "ada@example.com".to_string(),
        name: "Ada".to_string(),
    }
}
