use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tokentrack_core::export;
use tokentrack_session::error::CONNECTIVITY_FALLBACK;

use crate::context::App;
use crate::output;

/// Run `health`.
pub async fn run_health() -> Result<()> {
    let app = App::open()?;
    let state = app.controller.check_health().await;
    println!("Backend    {}", app.config.server.url);
    println!("Status     {}", state.status.label());
    if let Some(at) = state.last_checked_at {
        println!("Checked    {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if state.is_disconnected() {
        bail!("{CONNECTIVITY_FALLBACK}");
    }
    Ok(())
}

/// Run `dashboard`.
pub async fn run_dashboard(show_trace: bool) -> Result<()> {
    let app = App::open()?;
    let (startup, _) = app.start_signed_in().await?;
    let dash = app.controller.dashboard();

    if let Some(user) = startup.session.user() {
        println!("Account   {}", output::describe_user(user));
    }
    println!("Backend   {}", dash.connectivity.status.label());
    println!();
    output::print_stats(&dash.sync.stats);
    println!();
    println!("Usage (last {} requests, UTC)", dash.chart.len());
    output::print_chart(&dash.chart);
    println!();
    println!("Recent activity ({} of {})", dash.recent.len(), dash.total_logs);
    if dash.recent.is_empty() {
        println!("  (no requests yet)");
    }
    for log in &dash.recent {
        output::print_log(log);
    }

    if show_trace {
        println!();
        match &dash.trace {
            Some(trace) => println!(
                "{}",
                serde_json::to_string_pretty(&output::trace_json(trace))?
            ),
            None => println!("(no API exchange recorded)"),
        }
    }
    Ok(())
}

/// Run `logs`.
pub async fn run_logs(limit: usize) -> Result<()> {
    let app = App::open()?;
    let (_, result) = app.start_signed_in().await?;

    if result.logs.is_empty() {
        println!("No usage logs yet.");
        return Ok(());
    }
    for log in result.logs.iter().take(limit) {
        output::print_log(log);
    }
    if result.logs.len() > limit {
        println!("  ... {} more", result.logs.len() - limit);
    }
    Ok(())
}

/// Run `export`.
pub async fn run_export(dir: &Path) -> Result<()> {
    let app = App::open()?;
    let (_, result) = app.start_signed_in().await?;
    if result.logs.is_empty() {
        bail!("No usage logs to export");
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(export::export_filename(Utc::now().date_naive()));
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let written = export::write_csv(&result.logs, file)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Exported {written} logs to {}", path.display());
    Ok(())
}
