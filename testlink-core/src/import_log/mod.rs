//! Import log rows: one per import attempt.
//!
//! A log is created in `processing` before parsing starts and moves once to
//! `completed` or `failed`. It is written on the plain connection, never on
//! the import transaction, so a rollback does not erase it. Failed imports
//! stay retryable until `retry_until`; after that [`cleanup_expired_files`]
//! removes the retained upload.

mod cleanup;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, PersistenceResult};
use crate::import::{MergeStrategy, TreeStatistics};

pub use cleanup::{CleanupFailure, CleanupReport, cleanup_expired_files};

/// Lifecycle state of an import attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    /// Created, not yet finished
    Processing,
    /// Committed
    Completed,
    /// Aborted; may be retried inside the window
    Failed,
}

impl ImportStatus {
    /// Column value
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// True for `completed` and `failed`
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportStatus {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(PersistenceError::InvalidValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Result counts written when an import completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCounts {
    /// Suites inserted
    pub imported_suites: usize,
    /// Cases inserted
    pub imported_cases: usize,
    /// Existing cases updated or merged
    pub updated_cases: usize,
    /// Existing cases left untouched
    pub skipped_cases: usize,
}

/// A stored import log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportLog {
    /// Row id
    pub id: i64,
    /// Target project
    pub project_id: i64,
    /// Uploaded document record, if the caller tracks one
    pub document_id: Option<i64>,
    /// Original file name, `<inline>` for content imports
    pub file_name: String,
    /// Size of the source in bytes
    pub file_size: i64,
    /// Retained source file used for retries
    pub file_path: Option<PathBuf>,
    /// Lifecycle state
    pub status: ImportStatus,
    /// Strategy the attempt used
    pub strategy: Option<MergeStrategy>,
    /// End of the retry window
    pub retry_until: DateTime<Utc>,
    /// Log this attempt retries
    pub retry_of: Option<i64>,
    /// Suites in the parsed tree
    pub total_suites: usize,
    /// Cases in the parsed tree
    pub total_cases: usize,
    /// Depth of the parsed tree
    pub max_depth: usize,
    /// Result counts
    pub counts: ImportCounts,
    /// Messages of a failed attempt
    pub errors: Vec<String>,
    /// Set once the retained file was removed
    pub cleanup_scheduled: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// When the log reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,
}

impl ImportLog {
    /// True if the attempt failed and `now` is before `retry_until`
    #[must_use]
    pub fn is_retry_allowed_at(&self, now: DateTime<Utc>) -> bool {
        self.status == ImportStatus::Failed && now < self.retry_until
    }
}

/// Values for [`create_import_log`]
#[derive(Debug, Clone, Default)]
pub struct NewImportLog<'a> {
    /// Target project
    pub project_id: i64,
    /// Uploaded document record
    pub document_id: Option<i64>,
    /// File name shown in listings
    pub file_name: &'a str,
    /// Source size in bytes
    pub file_size: i64,
    /// Retained source file
    pub file_path: Option<&'a Path>,
    /// Strategy in use
    pub strategy: Option<MergeStrategy>,
    /// Log being retried
    pub retry_of: Option<i64>,
}

const LOG_COLUMNS: &str = "id, project_id, document_id, file_name, file_size, file_path, status, \
     strategy, retry_until, retry_of, total_suites, total_cases, max_depth, imported_suites, \
     imported_cases, updated_cases, skipped_cases, errors, cleanup_scheduled, created_at, \
     completed_at";

/// Inserts a `processing` log with `retry_until = now + window`.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_import_log(
    conn: &Connection,
    new: &NewImportLog<'_>,
    now: DateTime<Utc>,
    window: Duration,
) -> PersistenceResult<ImportLog> {
    let retry_until = now
        .checked_add_signed(window)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    conn.execute(
        "INSERT INTO import_logs (project_id, document_id, file_name, file_size, file_path, \
         status, strategy, retry_until, retry_of, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, 'processing', ?6, ?7, ?8, ?9)",
        params![
            new.project_id,
            new.document_id,
            new.file_name,
            new.file_size,
            new.file_path.map(|p| p.to_string_lossy().into_owned()),
            new.strategy.map(|s| s.as_str()),
            retry_until,
            new.retry_of,
            now,
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_import_log(conn, id)?.ok_or(PersistenceError::InvalidValue {
        field: "id",
        value: id.to_string(),
    })
}

/// Stores the tree metrics of a parsed document
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn record_statistics(
    conn: &Connection,
    id: i64,
    stats: &TreeStatistics,
) -> PersistenceResult<()> {
    conn.execute(
        "UPDATE import_logs SET total_suites = ?2, total_cases = ?3, max_depth = ?4 \
         WHERE id = ?1",
        params![id, stats.total_test_suites, stats.total_test_cases, stats.max_depth],
    )?;
    Ok(())
}

/// Moves a `processing` log to `completed` with its counts.
///
/// Returns `false` if the log was not in `processing`; terminal states are
/// never overwritten.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn mark_completed(
    conn: &Connection,
    id: i64,
    counts: &ImportCounts,
    now: DateTime<Utc>,
) -> PersistenceResult<bool> {
    let changed = conn.execute(
        "UPDATE import_logs SET status = 'completed', imported_suites = ?2, imported_cases = ?3, \
         updated_cases = ?4, skipped_cases = ?5, completed_at = ?6 \
         WHERE id = ?1 AND status = 'processing'",
        params![
            id,
            counts.imported_suites,
            counts.imported_cases,
            counts.updated_cases,
            counts.skipped_cases,
            now,
        ],
    )?;
    Ok(changed == 1)
}

/// Moves a `processing` log to `failed` with its error messages.
///
/// Returns `false` if the log was not in `processing`.
///
/// # Errors
///
/// Returns an error if the messages cannot be encoded or the update fails.
pub fn mark_failed(
    conn: &Connection,
    id: i64,
    errors: &[String],
    now: DateTime<Utc>,
) -> PersistenceResult<bool> {
    let encoded = serde_json::to_string(errors)?;
    let changed = conn.execute(
        "UPDATE import_logs SET status = 'failed', errors = ?2, completed_at = ?3 \
         WHERE id = ?1 AND status = 'processing'",
        params![id, encoded, now],
    )?;
    Ok(changed == 1)
}

/// Loads a log by id
///
/// # Errors
///
/// Returns an error if the query fails or a column holds an unknown value.
pub fn get_import_log(conn: &Connection, id: i64) -> PersistenceResult<Option<ImportLog>> {
    let sql = format!("SELECT {LOG_COLUMNS} FROM import_logs WHERE id = ?1");
    let raw = conn.query_row(&sql, [id], RawLog::from_row).optional()?;
    raw.map(RawLog::into_log).transpose()
}

/// Lists the logs of a project, newest first
///
/// # Errors
///
/// Returns an error if the query fails or a column holds an unknown value.
pub fn list_import_logs(conn: &Connection, project_id: i64) -> PersistenceResult<Vec<ImportLog>> {
    let sql = format!(
        "SELECT {LOG_COLUMNS} FROM import_logs WHERE project_id = ?1 \
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([project_id], RawLog::from_row)?;
    rows.map(|raw| raw.map_err(PersistenceError::from).and_then(RawLog::into_log))
        .collect()
}

/// Whether a log may be retried right now.
///
/// Unknown ids are not retryable.
///
/// # Errors
///
/// Returns an error if the lookup fails.
pub fn is_retry_allowed(conn: &Connection, id: i64) -> PersistenceResult<bool> {
    is_retry_allowed_at(conn, id, Utc::now())
}

/// Whether a log may be retried at `now`.
///
/// A failed log whose retry already completed, or is still running, is not
/// retryable again.
///
/// # Errors
///
/// Returns an error if the lookup fails.
pub fn is_retry_allowed_at(
    conn: &Connection,
    id: i64,
    now: DateTime<Utc>,
) -> PersistenceResult<bool> {
    let Some(log) = get_import_log(conn, id)? else {
        return Ok(false);
    };
    Ok(log.is_retry_allowed_at(now) && find_superseding_retry(conn, id)?.is_none())
}

/// Returns the retry of `id` that completed or is still processing, if any
///
/// # Errors
///
/// Returns an error if the query fails or a column holds an unknown value.
pub fn find_superseding_retry(
    conn: &Connection,
    id: i64,
) -> PersistenceResult<Option<ImportLog>> {
    let sql = format!(
        "SELECT {LOG_COLUMNS} FROM import_logs \
         WHERE retry_of = ?1 AND status IN ('completed', 'processing') \
         ORDER BY id LIMIT 1"
    );
    let raw = conn.query_row(&sql, [id], RawLog::from_row).optional()?;
    raw.map(RawLog::into_log).transpose()
}

/// Column values before enum and JSON decoding
struct RawLog {
    id: i64,
    project_id: i64,
    document_id: Option<i64>,
    file_name: String,
    file_size: i64,
    file_path: Option<String>,
    status: String,
    strategy: Option<String>,
    retry_until: DateTime<Utc>,
    retry_of: Option<i64>,
    totals: [i64; 3],
    counts: [i64; 4],
    errors: String,
    cleanup_scheduled: bool,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl RawLog {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project_id: row.get(1)?,
            document_id: row.get(2)?,
            file_name: row.get(3)?,
            file_size: row.get(4)?,
            file_path: row.get(5)?,
            status: row.get(6)?,
            strategy: row.get(7)?,
            retry_until: row.get(8)?,
            retry_of: row.get(9)?,
            totals: [row.get(10)?, row.get(11)?, row.get(12)?],
            counts: [row.get(13)?, row.get(14)?, row.get(15)?, row.get(16)?],
            errors: row.get(17)?,
            cleanup_scheduled: row.get(18)?,
            created_at: row.get(19)?,
            completed_at: row.get(20)?,
        })
    }

    fn into_log(self) -> PersistenceResult<ImportLog> {
        let strategy = self
            .strategy
            .map(|s| {
                s.parse::<MergeStrategy>()
                    .map_err(|_| PersistenceError::InvalidValue {
                        field: "strategy",
                        value: s,
                    })
            })
            .transpose()?;

        Ok(ImportLog {
            id: self.id,
            project_id: self.project_id,
            document_id: self.document_id,
            file_name: self.file_name,
            file_size: self.file_size,
            file_path: self.file_path.map(PathBuf::from),
            status: self.status.parse()?,
            strategy,
            retry_until: self.retry_until,
            retry_of: self.retry_of,
            total_suites: self.totals[0] as usize,
            total_cases: self.totals[1] as usize,
            max_depth: self.totals[2] as usize,
            counts: ImportCounts {
                imported_suites: self.counts[0] as usize,
                imported_cases: self.counts[1] as usize,
                updated_cases: self.counts[2] as usize,
                skipped_cases: self.counts[3] as usize,
            },
            errors: serde_json::from_str(&self.errors)?,
            cleanup_scheduled: self.cleanup_scheduled,
            created_at: self.created_at,
            completed_at: self.completed_at,
        })
    }
}
