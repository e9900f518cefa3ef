use serde_json::{Value, json};
use tokentrack_core::projection::ChartPoint;
use tokentrack_core::{AggregateStats, UsageLog, UserProfile};
use tokentrack_session::{ApiTrace, TraceKind};

const BAR_WIDTH: usize = 30;

pub fn describe_user(user: &UserProfile) -> String {
    if user.name.trim().is_empty() {
        user.email.clone()
    } else {
        format!("{} <{}>", user.name, user.email)
    }
}

pub fn format_cost(cost: f64) -> String {
    format!("${cost:.6}")
}

/// `1234567` -> `1,234,567`.
pub fn format_tokens(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Bar length for `value` scaled against `max`. Nonzero values get at least one cell.
fn bar_len(value: u64, max: u64) -> usize {
    if max == 0 || value == 0 {
        return 0;
    }
    let scaled = (value as f64 / max as f64 * BAR_WIDTH as f64).round() as usize;
    scaled.clamp(1, BAR_WIDTH)
}

pub fn print_stats(stats: &AggregateStats) {
    println!("Total tokens    {}", format_tokens(stats.total_tokens));
    println!("Total cost      {}", format_cost(stats.total_cost));
    println!("Requests        {}", stats.total_requests);
    println!("Avg response    {:.0}ms", stats.avg_response_time_ms);
}

pub fn print_chart(points: &[ChartPoint]) {
    if points.is_empty() {
        println!("  (no usage yet)");
        return;
    }
    let max = points.iter().map(|p| p.tokens).max().unwrap_or(0);
    for point in points {
        println!(
            "  {}  {:<width$}  {:>7} tok  {:>8.1} u$  {:>5}ms",
            point.label,
            "#".repeat(bar_len(point.tokens, max)),
            format_tokens(point.tokens),
            point.scaled_cost,
            point.response_time_ms,
            width = BAR_WIDTH,
        );
    }
}

pub fn print_log(log: &UsageLog) {
    println!(
        "  {}  {:<14} {:>7} tok  {}  {:>5}ms",
        log.timestamp.format("%Y-%m-%d %H:%M"),
        log.model_used,
        format_tokens(log.total_tokens),
        format_cost(log.estimated_cost),
        log.response_time_ms,
    );
}

/// The trace as JSON for printing.
pub fn trace_json(trace: &ApiTrace) -> Value {
    let at = trace.at.to_rfc3339();
    match &trace.kind {
        TraceKind::Sync { logs, stats } => json!({ "at": at, "logs": logs, "stats": stats }),
        TraceKind::Process(raw) => json!({ "at": at, "process": raw }),
        TraceKind::Error(message) => json!({ "at": at, "error": message }),
    }
}
