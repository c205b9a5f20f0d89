//! Removal of retained upload files once their retry window has passed.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{FileSystemError, PersistenceResult};
use crate::tracing::span_names;

/// A file that could not be removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupFailure {
    /// Log owning the file
    pub log_id: i64,
    /// File that was being deleted
    pub path: PathBuf,
    /// Error text
    pub error: String,
}

/// Outcome of one cleanup pass
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    /// Logs whose window has passed and whose file still existed
    pub examined: usize,
    /// Logs whose file was deleted and which are now marked
    pub cleaned: Vec<i64>,
    /// Deletions that failed; these logs stay unmarked
    pub failures: Vec<CleanupFailure>,
}

/// Deletes the retained file of every log whose retry window ended before
/// `now`, whose file still exists, and which was not cleaned yet.
///
/// Retries share the file of the log they retry, so a file is kept while any
/// uncleaned log pointing at it is still inside its window. Once deleted,
/// every log pointing at it is marked.
///
/// A failed deletion is logged and reported but does not stop the pass.
///
/// # Errors
///
/// Returns an error only if the store cannot be queried or updated.
pub fn cleanup_expired_files(
    conn: &Connection,
    now: DateTime<Utc>,
) -> PersistenceResult<CleanupReport> {
    let span = tracing::info_span!(span_names::IMPORT_LOG_CLEANUP);
    let _guard = span.enter();

    let candidates: Vec<(i64, String, DateTime<Utc>)> = {
        let mut stmt = conn.prepare(
            "SELECT id, file_path, retry_until FROM import_logs \
             WHERE cleanup_scheduled = 0 AND file_path IS NOT NULL ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        rows.collect::<Result<_, _>>()?
    };
    let retained: HashSet<&str> = candidates
        .iter()
        .filter(|(_, _, retry_until)| *retry_until > now)
        .map(|(_, path, _)| path.as_str())
        .collect();

    let mut report = CleanupReport::default();
    for (log_id, raw_path, retry_until) in &candidates {
        let path = PathBuf::from(raw_path);
        if *retry_until > now || !path.exists() {
            continue;
        }
        if retained.contains(raw_path.as_str()) {
            debug!(log_id, path = %path.display(), "File still used by a retryable import");
            continue;
        }
        report.examined += 1;

        match std::fs::remove_file(&path) {
            Ok(()) => {
                conn.execute(
                    "UPDATE import_logs SET cleanup_scheduled = 1 \
                     WHERE file_path = ?1 AND cleanup_scheduled = 0",
                    [raw_path],
                )?;
                report.cleaned.extend(
                    candidates
                        .iter()
                        .filter(|(_, other, _)| other == raw_path)
                        .map(|(id, _, _)| *id),
                );
            }
            Err(source) => {
                let err = FileSystemError {
                    operation: "delete",
                    path: path.clone(),
                    source,
                };
                warn!(log_id, error = %err, "Failed to remove expired import file");
                report.failures.push(CleanupFailure {
                    log_id: *log_id,
                    path,
                    error: err.to_string(),
                });
            }
        }
    }

    info!(
        examined = report.examined,
        cleaned = report.cleaned.len(),
        failed = report.failures.len(),
        "Expired import files cleaned"
    );
    Ok(report)
}
