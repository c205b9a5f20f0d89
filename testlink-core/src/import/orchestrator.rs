//! Drives an import from XML to committed rows.
//!
//! One call runs: create log, parse, record statistics, validate, then write
//! the whole tree inside a single transaction. Any failure rolls the
//! transaction back and marks the log failed; there is no partial success.
//! The log itself is written on the bare connection so it survives the
//! rollback.

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use rusqlite::{Connection, Transaction};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::duplicates::{DuplicateReport, analyze_duplicates};
use super::parser::{parse_content, parse_file};
use super::strategy::{MergeStrategy, StrategyRecommendation, StrategyThresholds, recommend_strategy};
use super::validate::{TreeStatistics, compute_statistics, ensure_valid, validate_tree};
use crate::config::ImportSettings;
use crate::error::{ImportError, ImportResult};
use crate::import_log::{
    self, ImportCounts, NewImportLog, create_import_log, mark_completed, mark_failed,
    record_statistics,
};
use crate::models::{
    ParsedSuiteNode, ParsedTestCase, ProvidedFields, TESTLINK_IMPORT_SOURCE, TestCaseRecord,
};
use crate::store::{self, CaseRow, NewSuite, repository};
use crate::tracing::span_names;

/// File name recorded for imports of in-memory XML
pub const INLINE_FILE_NAME: &str = "<inline>";

/// Knobs that shape an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Source tag written on rows and used as the dedup scope
    pub import_source: String,
    /// How long a failed import stays retryable
    pub retry_window: Duration,
    /// Preview warning thresholds
    pub thresholds: StrategyThresholds,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            import_source: TESTLINK_IMPORT_SOURCE.to_string(),
            retry_window: Duration::hours(crate::config::DEFAULT_RETRY_WINDOW_HOURS),
            thresholds: StrategyThresholds::default(),
        }
    }
}

impl From<&ImportSettings> for ImportOptions {
    fn from(settings: &ImportSettings) -> Self {
        Self {
            import_source: settings.import_source.clone(),
            retry_window: settings.retry_window(),
            thresholds: settings.thresholds(),
        }
    }
}

/// A file import
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// Target project
    pub project_id: i64,
    /// XML file; kept on the log for retries
    pub file_path: PathBuf,
    /// Strategy for existing cases
    pub strategy: MergeStrategy,
    /// Uploaded document record, if any
    pub document_id: Option<i64>,
}

impl ImportRequest {
    /// Creates a request without a document id
    #[must_use]
    pub fn new(project_id: i64, file_path: impl Into<PathBuf>, strategy: MergeStrategy) -> Self {
        Self {
            project_id,
            file_path: file_path.into(),
            strategy,
            document_id: None,
        }
    }
}

/// What happened to one incoming case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseAction {
    /// A new row was inserted
    Created,
    /// An existing row was overwritten or merged
    Updated,
    /// An existing row was left alone
    Skipped,
}

/// Per-case result of a committed import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseOutcome {
    /// Internal id as written (suffixed for CREATE_NEW copies)
    pub internal_id: String,
    /// Case title
    pub name: String,
    /// What happened
    pub action: CaseAction,
    /// Row the case ended up in
    pub case_id: i64,
}

/// Result of a committed import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Log of this attempt
    pub import_log_id: i64,
    /// Strategy used
    pub strategy: MergeStrategy,
    /// Suites inserted
    pub imported_suites: usize,
    /// Cases inserted
    pub imported_cases: usize,
    /// Cases updated or merged
    pub updated_cases: usize,
    /// Cases skipped
    pub skipped_cases: usize,
    /// Shape of the imported tree
    pub statistics: TreeStatistics,
    /// One entry per case in document order
    pub case_outcomes: Vec<CaseOutcome>,
}

impl ImportSummary {
    /// The counts stored on the log
    #[must_use]
    pub const fn counts(&self) -> ImportCounts {
        ImportCounts {
            imported_suites: self.imported_suites,
            imported_cases: self.imported_cases,
            updated_cases: self.updated_cases,
            skipped_cases: self.skipped_cases,
        }
    }
}

/// Read-only look at what an import would do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    /// Root suite name
    pub root_name: String,
    /// Shape of the tree
    pub statistics: TreeStatistics,
    /// Required-field problems; an import would fail while non-empty
    pub validation_errors: Vec<String>,
    /// Existing rows the tree collides with
    pub duplicates: DuplicateReport,
    /// Advisory strategy
    pub recommendation: StrategyRecommendation,
}

enum Source<'a> {
    File(&'a Path),
    Content(&'a str),
}

/// Imports TestLink XML into one project.
pub struct TestLinkImporter<'c> {
    conn: &'c mut Connection,
    options: ImportOptions,
}

impl<'c> TestLinkImporter<'c> {
    /// Creates an importer with default options
    pub fn new(conn: &'c mut Connection) -> Self {
        Self::with_options(conn, ImportOptions::default())
    }

    /// Creates an importer with the given options
    pub fn with_options(conn: &'c mut Connection, options: ImportOptions) -> Self {
        Self { conn, options }
    }

    /// The options in use
    #[must_use]
    pub const fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Imports an XML file.
    ///
    /// # Errors
    ///
    /// Returns `ProjectNotFound` or `FileNotFound` before any log is
    /// created. Parse, validation and persistence failures mark the log
    /// failed and are returned.
    pub fn import_file(&mut self, request: &ImportRequest) -> ImportResult<ImportSummary> {
        self.import_file_inner(request, None)
    }

    /// Imports XML text; the log records the name `<inline>`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::import_file`], minus `FileNotFound`.
    pub fn import_content(
        &mut self,
        project_id: i64,
        xml: &str,
        strategy: MergeStrategy,
    ) -> ImportResult<ImportSummary> {
        self.ensure_project(project_id)?;
        let new_log = NewImportLog {
            project_id,
            file_name: INLINE_FILE_NAME,
            file_size: xml.len() as i64,
            strategy: Some(strategy),
            ..NewImportLog::default()
        };
        self.run(&new_log, strategy, &Source::Content(xml))
    }

    /// Re-runs a failed import from its retained file.
    ///
    /// The new attempt gets its own log linked through `retry_of`.
    ///
    /// # Errors
    ///
    /// Returns `LogNotFound`, or `RetryNotAllowed` when the log is not
    /// failed, the window has passed, a retry of it already completed or is
    /// running, or no file was retained. Otherwise
    /// the same errors as [`Self::import_file`].
    pub fn retry_import(
        &mut self,
        log_id: i64,
        strategy_override: Option<MergeStrategy>,
    ) -> ImportResult<ImportSummary> {
        let log = import_log::get_import_log(self.conn, log_id)?
            .ok_or(ImportError::LogNotFound(log_id))?;

        let now = Utc::now();
        if !log.is_retry_allowed_at(now) {
            let reason = if log.status == import_log::ImportStatus::Failed {
                format!("retry window expired at {}", log.retry_until.to_rfc3339())
            } else {
                format!("import status is {}", log.status)
            };
            return Err(ImportError::RetryNotAllowed { log_id, reason });
        }
        if let Some(retry) = import_log::find_superseding_retry(self.conn, log_id)? {
            return Err(ImportError::RetryNotAllowed {
                log_id,
                reason: format!("already retried by import {} ({})", retry.id, retry.status),
            });
        }

        let file_path = log.file_path.clone().ok_or_else(|| ImportError::RetryNotAllowed {
            log_id,
            reason: "no source file was retained".to_string(),
        })?;

        let strategy = strategy_override.or(log.strategy).unwrap_or_default();
        info!(log_id, %strategy, "Retrying import");

        let request = ImportRequest {
            project_id: log.project_id,
            file_path,
            strategy,
            document_id: log.document_id,
        };
        self.import_file_inner(&request, Some(log_id))
    }

    /// Parses, validates and analyzes a file without writing anything.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound`, a parse error, or a store error from the
    /// duplicate lookups.
    pub fn preview_file(&self, project_id: i64, path: &Path) -> ImportResult<ImportPreview> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.to_path_buf()));
        }
        let tree = parse_file(path)?;
        self.preview_tree(project_id, &tree)
    }

    /// Parses, validates and analyzes XML text without writing anything.
    ///
    /// # Errors
    ///
    /// Returns a parse error or a store error from the duplicate lookups.
    pub fn preview_content(&self, project_id: i64, xml: &str) -> ImportResult<ImportPreview> {
        let tree = parse_content(xml)?;
        self.preview_tree(project_id, &tree)
    }

    fn preview_tree(&self, project_id: i64, tree: &ParsedSuiteNode) -> ImportResult<ImportPreview> {
        let span = tracing::info_span!(span_names::IMPORT_PREVIEW, project_id);
        let _guard = span.enter();

        self.ensure_project(project_id)?;
        let statistics = compute_statistics(tree);
        let validation_errors = validate_tree(tree);
        let duplicates =
            analyze_duplicates(self.conn, tree, project_id, &self.options.import_source)?;
        let recommendation =
            recommend_strategy(&statistics, &duplicates.summary, &self.options.thresholds);

        for warning in &recommendation.warnings {
            warn!(%warning, "Import preview warning");
        }
        info!(
            suites = statistics.total_test_suites,
            cases = statistics.total_test_cases,
            duplicate_cases = duplicates.summary.duplicate_test_cases,
            suggested = %recommendation.suggested_strategy,
            "Import preview ready"
        );

        Ok(ImportPreview {
            root_name: tree.name.clone(),
            statistics,
            validation_errors,
            duplicates,
            recommendation,
        })
    }

    fn import_file_inner(
        &mut self,
        request: &ImportRequest,
        retry_of: Option<i64>,
    ) -> ImportResult<ImportSummary> {
        self.ensure_project(request.project_id)?;
        let metadata = std::fs::metadata(&request.file_path)
            .map_err(|_| ImportError::FileNotFound(request.file_path.clone()))?;

        let file_name = request
            .file_path
            .file_name()
            .map_or_else(|| request.file_path.to_string_lossy(), |n| n.to_string_lossy())
            .into_owned();

        let new_log = NewImportLog {
            project_id: request.project_id,
            document_id: request.document_id,
            file_name: &file_name,
            file_size: metadata.len() as i64,
            file_path: Some(&request.file_path),
            strategy: Some(request.strategy),
            retry_of,
        };
        self.run(&new_log, request.strategy, &Source::File(&request.file_path))
    }

    fn ensure_project(&self, project_id: i64) -> ImportResult<()> {
        store::get_project(self.conn, project_id)?
            .map(|_| ())
            .ok_or(ImportError::ProjectNotFound(project_id))
    }

    fn run(
        &mut self,
        new_log: &NewImportLog<'_>,
        strategy: MergeStrategy,
        source: &Source<'_>,
    ) -> ImportResult<ImportSummary> {
        let span = crate::trace_operation!(
            span_names::IMPORT_EXECUTE,
            project_id = new_log.project_id,
            strategy = %strategy,
            file_name = new_log.file_name,
        );
        let _guard = span.enter();

        let log = create_import_log(self.conn, new_log, Utc::now(), self.options.retry_window)?;
        info!(import_log_id = log.id, "Import started");

        match self.parse_validate_commit(log.id, new_log.project_id, strategy, source) {
            Ok(summary) => {
                mark_completed(self.conn, log.id, &summary.counts(), Utc::now())?;
                info!(
                    import_log_id = log.id,
                    imported_suites = summary.imported_suites,
                    imported_cases = summary.imported_cases,
                    updated_cases = summary.updated_cases,
                    skipped_cases = summary.skipped_cases,
                    "Import completed"
                );
                Ok(summary)
            }
            Err(err) => {
                error!(import_log_id = log.id, error = %err, "Import failed");
                if let Err(log_err) = mark_failed(self.conn, log.id, &err.messages(), Utc::now()) {
                    error!(import_log_id = log.id, error = %log_err, "Could not mark import log failed");
                }
                Err(err)
            }
        }
    }

    fn parse_validate_commit(
        &mut self,
        log_id: i64,
        project_id: i64,
        strategy: MergeStrategy,
        source: &Source<'_>,
    ) -> ImportResult<ImportSummary> {
        let tree = match source {
            Source::File(path) => parse_file(path)?,
            Source::Content(xml) => parse_content(xml)?,
        };

        let statistics = compute_statistics(&tree);
        record_statistics(self.conn, log_id, &statistics)?;
        debug!(?statistics, "Parsed import tree");

        ensure_valid(&tree)?;

        let tx = self.conn.transaction()?;
        let walked = {
            let mut ctx = ImportContext::new(&tx, project_id, strategy, &self.options.import_source);
            ctx.import_tree(&tree).map(|()| ctx.into_parts())
        };

        let (counts, case_outcomes) = match walked {
            Ok(parts) => {
                tx.commit()?;
                parts
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    error!(error = %rollback_err, "Rollback failed");
                }
                return Err(err);
            }
        };

        Ok(ImportSummary {
            import_log_id: log_id,
            strategy,
            imported_suites: counts.imported_suites,
            imported_cases: counts.imported_cases,
            updated_cases: counts.updated_cases,
            skipped_cases: counts.skipped_cases,
            statistics,
            case_outcomes,
        })
    }
}

/// State of one commit walk, threaded through every write
struct ImportContext<'t> {
    tx: &'t Transaction<'t>,
    project_id: i64,
    strategy: MergeStrategy,
    import_source: &'t str,
    counts: ImportCounts,
    outcomes: Vec<CaseOutcome>,
}

impl<'t> ImportContext<'t> {
    fn new(
        tx: &'t Transaction<'t>,
        project_id: i64,
        strategy: MergeStrategy,
        import_source: &'t str,
    ) -> Self {
        Self {
            tx,
            project_id,
            strategy,
            import_source,
            counts: ImportCounts::default(),
            outcomes: Vec::new(),
        }
    }

    fn into_parts(self) -> (ImportCounts, Vec<CaseOutcome>) {
        (self.counts, self.outcomes)
    }

    /// Writes suites and cases depth-first in document order: a suite, its
    /// own cases, then its child suites.
    fn import_tree(&mut self, root: &ParsedSuiteNode) -> ImportResult<()> {
        let mut stack: Vec<(&ParsedSuiteNode, Option<i64>, i64)> =
            vec![(root, None, root.node_order.unwrap_or(0))];

        while let Some((suite, parent_id, node_order)) = stack.pop() {
            let suite_id = repository::insert_suite(
                self.tx,
                &NewSuite {
                    project_id: self.project_id,
                    parent_suite_id: parent_id,
                    name: &suite.name,
                    description: &suite.details,
                    node_order,
                    external_id: suite.id.as_deref(),
                    import_source: Some(self.import_source),
                },
            )?;
            self.counts.imported_suites += 1;
            debug!(suite_id, name = %suite.name, "Suite inserted");

            for (position, case) in suite.test_cases.iter().enumerate() {
                let node_order = case.node_order.unwrap_or(position as i64);
                self.import_case(suite_id, node_order, case)?;
            }

            for (position, child) in suite.children.iter().enumerate().rev() {
                stack.push((child, Some(suite_id), child.node_order.unwrap_or(position as i64)));
            }
        }
        Ok(())
    }

    fn import_case(
        &mut self,
        suite_id: i64,
        node_order: i64,
        case: &ParsedTestCase,
    ) -> ImportResult<()> {
        let incoming = case_row(case, suite_id, self.project_id, node_order, self.import_source);
        let existing = repository::find_case_by_internal_id(
            self.tx,
            self.project_id,
            self.import_source,
            &case.internal_id,
        )?;

        let (action, case_id, internal_id) = match (self.strategy, existing) {
            (_, None) => (
                CaseAction::Created,
                self.insert_case(&incoming, case)?,
                case.internal_id.clone(),
            ),
            (MergeStrategy::SkipDuplicates, Some(existing)) => {
                (CaseAction::Skipped, existing.id, case.internal_id.clone())
            }
            (MergeStrategy::UpdateExisting, Some(existing)) => {
                repository::update_case(self.tx, existing.id, &incoming)?;
                self.replace_children(existing.id, case)?;
                (CaseAction::Updated, existing.id, case.internal_id.clone())
            }
            (MergeStrategy::CreateNew, Some(_)) => {
                let suffixed = unique_internal_id(&case.internal_id);
                let row = CaseRow {
                    internal_id: Some(suffixed.clone()),
                    ..incoming
                };
                (CaseAction::Created, self.insert_case(&row, case)?, suffixed)
            }
            (MergeStrategy::MergeData, Some(existing)) => {
                let merged = merge_case_row(&existing, &incoming, case.provided);
                repository::update_case(self.tx, existing.id, &merged)?;
                self.replace_children(existing.id, case)?;
                (CaseAction::Updated, existing.id, case.internal_id.clone())
            }
        };

        match action {
            CaseAction::Created => self.counts.imported_cases += 1,
            CaseAction::Updated => self.counts.updated_cases += 1,
            CaseAction::Skipped => self.counts.skipped_cases += 1,
        }
        debug!(internal_id = %internal_id, case_id, ?action, "Case imported");

        self.outcomes.push(CaseOutcome {
            internal_id,
            name: case.name.clone(),
            action,
            case_id,
        });
        Ok(())
    }

    fn insert_case(&self, row: &CaseRow, case: &ParsedTestCase) -> ImportResult<i64> {
        let id = repository::insert_case(self.tx, row)?;
        self.replace_children(id, case)?;
        Ok(id)
    }

    fn replace_children(&self, case_id: i64, case: &ParsedTestCase) -> ImportResult<()> {
        repository::replace_steps(self.tx, case_id, &case.steps)?;
        repository::replace_custom_fields(self.tx, case_id, &case.custom_fields)?;
        repository::replace_keywords(self.tx, case_id, &case.keywords)?;
        repository::replace_requirements(self.tx, case_id, &case.requirements)?;
        Ok(())
    }
}

fn case_row(
    case: &ParsedTestCase,
    suite_id: i64,
    project_id: i64,
    node_order: i64,
    import_source: &str,
) -> CaseRow {
    CaseRow {
        test_suite_id: suite_id,
        project_id,
        internal_id: Some(case.internal_id.clone()),
        external_id: case.external_id.clone(),
        title: case.name.clone(),
        summary: case.summary.clone(),
        preconditions: case.preconditions.clone(),
        execution_type: case.execution_type,
        importance: case.importance,
        status: case.status,
        version: case.version,
        is_open: case.is_open,
        active: case.active,
        node_order,
        import_source: Some(import_source.to_string()),
    }
}

/// Field-level merge: a non-empty incoming value wins, otherwise the
/// existing value is kept. Enumerations and flags come from the incoming
/// case only when the source carried them.
fn merge_case_row(
    existing: &TestCaseRecord,
    incoming: &CaseRow,
    provided: ProvidedFields,
) -> CaseRow {
    let pick = |new: &str, old: &str| {
        if new.trim().is_empty() {
            old.to_string()
        } else {
            new.to_string()
        }
    };
    CaseRow {
        test_suite_id: existing.test_suite_id,
        project_id: existing.project_id,
        internal_id: existing.internal_id.clone(),
        external_id: incoming
            .external_id
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| existing.external_id.clone()),
        title: pick(&incoming.title, &existing.title),
        summary: pick(&incoming.summary, &existing.summary),
        preconditions: pick(&incoming.preconditions, &existing.preconditions),
        execution_type: if provided.execution_type {
            incoming.execution_type
        } else {
            existing.execution_type
        },
        importance: if provided.importance {
            incoming.importance
        } else {
            existing.importance
        },
        status: incoming.status.or(existing.status),
        version: incoming.version.or(existing.version),
        is_open: if provided.is_open {
            incoming.is_open
        } else {
            existing.is_open
        },
        active: if provided.active {
            incoming.active
        } else {
            existing.active
        },
        node_order: existing.node_order,
        import_source: existing.import_source.clone(),
    }
}

fn unique_internal_id(internal_id: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{internal_id}-{}", &suffix[..8])
}
