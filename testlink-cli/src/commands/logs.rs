//! Import history commands.

use std::fmt::Write as _;
use std::path::Path;

use testlink_core::import_log::{ImportLog, cleanup_expired_files, list_import_logs};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::util::{fit, open_context};

/// Logs command handler
pub fn cmd_logs(
    config_path: Option<&Path>,
    project: i64,
    format: OutputFormat,
) -> Result<(), CliError> {
    let ctx = open_context(config_path)?;
    if ctx.db.get_project(project)?.is_none() {
        return Err(CliError::NotFound(format!("Project {project} not found")));
    }
    let logs = list_import_logs(ctx.db.connection(), project)?;

    match format {
        OutputFormat::Table => println!("{}", format_table(&logs)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&logs)?),
    }
    Ok(())
}

/// Cleanup command handler
pub fn cmd_cleanup(config_path: Option<&Path>) -> Result<(), CliError> {
    let ctx = open_context(config_path)?;
    let report = cleanup_expired_files(ctx.db.connection(), chrono::Utc::now())?;

    println!(
        "Cleanup complete: {} file(s) removed, {} failure(s)",
        report.cleaned.len(),
        report.failures.len()
    );
    for failure in &report.failures {
        eprintln!(
            "  log {}: {} ({})",
            failure.log_id,
            failure.path.display(),
            failure.error
        );
    }
    Ok(())
}

/// Format import logs as a table string
fn format_table(logs: &[ImportLog]) -> String {
    if logs.is_empty() {
        return "No imports found.".to_string();
    }

    let mut output = format!(
        "{:>5}  {}  {}  {}  {:>6}  {:>6}  {:>6}  {}\n",
        "ID",
        fit("FILE", 24),
        fit("STATUS", 10),
        fit("STRATEGY", 16),
        "NEW",
        "UPD",
        "SKIP",
        "CREATED"
    );
    for log in logs {
        let strategy = log.strategy.map_or("-", |s| s.as_str());
        let _ = writeln!(
            output,
            "{:>5}  {}  {}  {}  {:>6}  {:>6}  {:>6}  {}",
            log.id,
            fit(&log.file_name, 24),
            fit(log.status.as_str(), 10),
            fit(strategy, 16),
            log.counts.imported_cases,
            log.counts.updated_cases,
            log.counts.skipped_cases,
            log.created_at.format("%Y-%m-%d %H:%M")
        );
        if let Some(first) = log.errors.first() {
            let _ = writeln!(output, "       error: {first}");
        }
    }
    output.trim_end().to_string()
}
