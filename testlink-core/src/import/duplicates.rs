//! Finds suites and cases of a parsed tree that already exist in a project.
//!
//! Cases are matched by internal id first (authoritative) and by title plus
//! containing suite name second (heuristic). Suites are matched by name.
//! Every matching row id is reported; nothing here picks between them.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PersistenceResult;
use crate::models::ParsedSuiteNode;
use crate::store::repository;

/// How a case was matched against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Same internal id and import source
    InternalId,
    /// Same title inside a suite of the same name
    TitleAndSuite,
}

/// An incoming suite whose name already exists in the project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteDuplicate {
    /// Suite name
    pub name: String,
    /// Breadcrumb from the root, e.g. `Root > Child`
    pub path: String,
    /// Every existing suite with this name
    pub existing_ids: Vec<i64>,
}

/// An incoming case that matches existing rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDuplicate {
    /// Incoming internal id
    pub internal_id: String,
    /// Incoming title
    pub name: String,
    /// Breadcrumb of the containing suite
    pub suite_path: String,
    /// Which rule matched
    pub match_type: MatchType,
    /// Matching case ids (one for an internal-id match)
    pub existing_ids: Vec<i64>,
}

/// Counts accompanying a [`DuplicateReport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateSummary {
    /// Suites with at least one match
    pub duplicate_test_suites: usize,
    /// Cases with at least one match
    pub duplicate_test_cases: usize,
    /// Suites in the incoming tree
    pub total_test_suites: usize,
    /// Cases in the incoming tree
    pub total_test_cases: usize,
}

/// Result of [`analyze_duplicates`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReport {
    /// Suite matches in document order
    pub test_suites: Vec<SuiteDuplicate>,
    /// Case matches in document order
    pub test_cases: Vec<CaseDuplicate>,
    /// Totals
    pub summary: DuplicateSummary,
}

/// Compares a parsed tree against the rows already stored for a project.
///
/// Read-only; safe to call outside any transaction.
///
/// # Errors
///
/// Returns an error if a lookup query fails.
pub fn analyze_duplicates(
    conn: &Connection,
    root: &ParsedSuiteNode,
    project_id: i64,
    import_source: &str,
) -> PersistenceResult<DuplicateReport> {
    let mut report = DuplicateReport::default();
    let mut stack: Vec<(&ParsedSuiteNode, String)> = vec![(root, root.name.clone())];

    while let Some((suite, path)) = stack.pop() {
        report.summary.total_test_suites += 1;

        let suite_ids =
            repository::find_suite_ids_by_name(conn, project_id, &suite.name, import_source)?;
        if !suite_ids.is_empty() {
            debug!(suite = %path, matches = suite_ids.len(), "Suite already exists");
            report.test_suites.push(SuiteDuplicate {
                name: suite.name.clone(),
                path: path.clone(),
                existing_ids: suite_ids,
            });
        }

        for case in &suite.test_cases {
            report.summary.total_test_cases += 1;

            let by_internal_id = if case.internal_id.is_empty() {
                None
            } else {
                repository::find_case_by_internal_id(
                    conn,
                    project_id,
                    import_source,
                    &case.internal_id,
                )?
            };

            let matched = if let Some(existing) = by_internal_id {
                Some((MatchType::InternalId, vec![existing.id]))
            } else {
                let ids = repository::find_case_ids_by_title_and_suite(
                    conn,
                    project_id,
                    &case.name,
                    &suite.name,
                )?;
                (!ids.is_empty()).then_some((MatchType::TitleAndSuite, ids))
            };

            if let Some((match_type, existing_ids)) = matched {
                report.test_cases.push(CaseDuplicate {
                    internal_id: case.internal_id.clone(),
                    name: case.name.clone(),
                    suite_path: path.clone(),
                    match_type,
                    existing_ids,
                });
            }
        }

        for child in suite.children.iter().rev() {
            stack.push((child, format!("{path} > {}", child.name)));
        }
    }

    report.summary.duplicate_test_suites = report.test_suites.len();
    report.summary.duplicate_test_cases = report.test_cases.len();
    Ok(report)
}
