use std::io::Write;

use chrono::NaiveDate;

use crate::UsageLog;

pub const CSV_HEADER: [&str; 7] = [
    "Timestamp",
    "Model",
    "Prompt Tokens",
    "Completion Tokens",
    "Total Tokens",
    "Cost",
    "Response Time",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv output is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// File name for an export made on `date`: `token-usage-<YYYY-MM-DD>.csv`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("token-usage-{}.csv", date.format("%Y-%m-%d"))
}

/// Write `logs` as CSV, one row per log in the given order.
///
/// Fields containing a comma, quote or newline are quoted with inner quotes
/// doubled. Returns the number of data rows written.
pub fn write_csv<W: Write>(logs: &[UsageLog], writer: W) -> Result<usize, ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(CSV_HEADER)?;

    for log in logs {
        csv_writer.write_record([
            log.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            log.model_used.clone(),
            log.prompt_tokens.to_string(),
            log.completion_tokens.to_string(),
            log.total_tokens.to_string(),
            format!("${:.6}", log.estimated_cost),
            format!("{}ms", log.response_time_ms),
        ])?;
    }

    csv_writer.flush()?;
    Ok(logs.len())
}

/// Render `logs` as CSV text. Same logs always give byte-identical output.
pub fn serialize_csv(logs: &[UsageLog]) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(logs, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
