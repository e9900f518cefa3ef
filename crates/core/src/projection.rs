//! Pure view projections over a synced log collection.
//!
//! Nothing here performs I/O; callers re-run these on every render against
//! whatever logs the last published sync produced.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::UsageLog;

pub const DEFAULT_CHART_WINDOW: usize = 10;
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Multiplier from dollars to micro-dollars, the unit the cost chart plots.
pub const COST_SCALE: f64 = 1_000_000.0;

/// One plotted point of the usage chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// `HH:MM` of the log timestamp (UTC).
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub tokens: u64,
    pub scaled_cost: f64,
    pub response_time_ms: u64,
}

/// The `window` most recent logs, ordered oldest first for plotting.
///
/// Recency is decided by timestamp, so the result is the same whatever order
/// `logs` arrives in. Equal timestamps keep their input order.
pub fn chart_series(logs: &[UsageLog], window: usize) -> Vec<ChartPoint> {
    let mut newest_first: Vec<&UsageLog> = logs.iter().collect();
    newest_first.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    newest_first.truncate(window);
    newest_first.reverse();

    newest_first
        .into_iter()
        .map(|log| ChartPoint {
            label: log.timestamp.format("%H:%M").to_string(),
            timestamp: log.timestamp,
            tokens: log.total_tokens,
            scaled_cost: log.estimated_cost * COST_SCALE,
            response_time_ms: log.response_time_ms,
        })
        .collect()
}

/// The first `limit` logs in their existing (most-recent first) order.
pub fn recent_activity(logs: &[UsageLog], limit: usize) -> &[UsageLog] {
    &logs[..logs.len().min(limit)]
}
