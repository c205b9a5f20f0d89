//! Import and retry commands.

use std::fmt::Write as _;
use std::path::Path;

use testlink_core::import::{
    ImportOptions, ImportRequest, ImportSummary, MergeStrategy, TestLinkImporter,
};
use testlink_core::import_log::{ImportLog, ImportStatus, list_import_logs};
use testlink_core::store::Database;

use crate::error::CliError;
use crate::util::{open_context, stage_upload};

/// Import command handler
pub fn cmd_import(
    config_path: Option<&Path>,
    file: &Path,
    project: i64,
    strategy: Option<MergeStrategy>,
) -> Result<(), CliError> {
    if !file.exists() {
        return Err(CliError::NotFound(format!(
            "File not found: {}",
            file.display()
        )));
    }

    let mut ctx = open_context(config_path)?;
    if ctx.db.get_project(project)?.is_none() {
        return Err(CliError::NotFound(format!("Project {project} not found")));
    }
    let options = ImportOptions::from(&ctx.settings);
    let staged = stage_upload(&ctx.settings, file)?;

    match import_staged(&mut ctx.db, options, project, &staged, strategy) {
        Ok(summary) => {
            println!("{}", format_summary(&summary));
            Ok(())
        }
        Err(e) => {
            match latest_log_for(&ctx.db, project, &staged) {
                Some(log) => report_failed_log(&log),
                None => discard_staged(&staged),
            }
            Err(e)
        }
    }
}

fn import_staged(
    db: &mut Database,
    options: ImportOptions,
    project: i64,
    staged: &Path,
    strategy: Option<MergeStrategy>,
) -> Result<ImportSummary, CliError> {
    let mut importer = TestLinkImporter::with_options(db.connection_mut(), options);
    let strategy = match strategy {
        Some(strategy) => strategy,
        None => {
            let preview = importer.preview_file(project, staged)?;
            let suggested = preview.recommendation.suggested_strategy;
            println!("Using suggested strategy {suggested}");
            suggested
        }
    };
    Ok(importer.import_file(&ImportRequest::new(project, staged, strategy))?)
}

/// Retry command handler
pub fn cmd_retry(
    config_path: Option<&Path>,
    log_id: i64,
    strategy: Option<MergeStrategy>,
) -> Result<(), CliError> {
    let mut ctx = open_context(config_path)?;
    let options = ImportOptions::from(&ctx.settings);
    let summary = TestLinkImporter::with_options(ctx.db.connection_mut(), options)
        .retry_import(log_id, strategy)?;

    println!("Retry of import log {log_id} succeeded.");
    println!("{}", format_summary(&summary));
    Ok(())
}

/// The newest log of `project` if it was written for `staged`
fn latest_log_for(db: &Database, project: i64, staged: &Path) -> Option<ImportLog> {
    list_import_logs(db.connection(), project)
        .ok()
        .and_then(|logs| logs.into_iter().next())
        .filter(|log| log.file_path.as_deref() == Some(staged))
}

fn report_failed_log(log: &ImportLog) {
    if log.status == ImportStatus::Failed {
        eprintln!(
            "Import log {} marked failed; retry with `testlink-cli retry {}` before {}",
            log.id,
            log.id,
            log.retry_until.format("%Y-%m-%d %H:%M UTC")
        );
    }
}

/// Removes a staged copy that no import log refers to
fn discard_staged(staged: &Path) {
    if let Err(e) = std::fs::remove_file(staged) {
        tracing::warn!(path = %staged.display(), error = %e, "Failed to remove staged import file");
    }
}

/// Format an import summary as human-readable text
pub fn format_summary(summary: &ImportSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Import Summary (log {}):", summary.import_log_id);
    let _ = writeln!(output, "  Strategy: {}", summary.strategy);
    let _ = writeln!(output, "  Suites imported: {}", summary.imported_suites);
    let _ = writeln!(output, "  Cases imported: {}", summary.imported_cases);
    let _ = writeln!(output, "  Cases updated: {}", summary.updated_cases);
    let _ = writeln!(output, "  Cases skipped: {}", summary.skipped_cases);
    output.trim_end().to_string()
}
