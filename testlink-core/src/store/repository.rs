//! Row-level reads and writes for suites, cases and their children.
//!
//! Every function takes `&Connection`; pass a `rusqlite::Transaction` to run
//! inside an import transaction.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::PersistenceResult;
use crate::models::{
    CustomField, ExecutionType, Importance, Keyword, ParsedStep, Requirement, TestCaseRecord,
    TestStepRecord, TestSuiteRecord,
};

const SUITE_COLUMNS: &str =
    "id, project_id, parent_suite_id, name, description, node_order, external_id, import_source";

const CASE_COLUMNS: &str = "id, test_suite_id, project_id, internal_id, external_id, title, \
     summary, preconditions, execution_type, importance, status, version, is_open, active, \
     node_order, import_source, created_at, updated_at";

/// Values for a suite insert
#[derive(Debug, Clone)]
pub struct NewSuite<'a> {
    /// Owning project
    pub project_id: i64,
    /// Parent suite, `None` for a top-level suite
    pub parent_suite_id: Option<i64>,
    /// Suite name
    pub name: &'a str,
    /// Details text
    pub description: &'a str,
    /// Sibling order
    pub node_order: i64,
    /// Source id of the suite
    pub external_id: Option<&'a str>,
    /// Source tag
    pub import_source: Option<&'a str>,
}

/// Scalar test-case values written on insert and update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRow {
    /// Containing suite
    pub test_suite_id: i64,
    /// Owning project
    pub project_id: i64,
    /// Source identifier
    pub internal_id: Option<String>,
    /// Human-facing external id
    pub external_id: Option<String>,
    /// Title
    pub title: String,
    /// Summary
    pub summary: String,
    /// Preconditions
    pub preconditions: String,
    /// Manual or automated
    pub execution_type: ExecutionType,
    /// Importance level
    pub importance: Importance,
    /// Workflow status code
    pub status: Option<i64>,
    /// Source version
    pub version: Option<i64>,
    /// Open flag
    pub is_open: bool,
    /// Active flag
    pub active: bool,
    /// Sibling order
    pub node_order: i64,
    /// Source tag
    pub import_source: Option<String>,
}

impl CaseRow {
    /// Copies the scalar values of an existing record
    #[must_use]
    pub fn from_record(record: &TestCaseRecord) -> Self {
        Self {
            test_suite_id: record.test_suite_id,
            project_id: record.project_id,
            internal_id: record.internal_id.clone(),
            external_id: record.external_id.clone(),
            title: record.title.clone(),
            summary: record.summary.clone(),
            preconditions: record.preconditions.clone(),
            execution_type: record.execution_type,
            importance: record.importance,
            status: record.status,
            version: record.version,
            is_open: record.is_open,
            active: record.active,
            node_order: record.node_order,
            import_source: record.import_source.clone(),
        }
    }
}

/// Row counts of the tables an import writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableCounts {
    /// `test_suites` rows
    pub suites: i64,
    /// `test_cases` rows
    pub cases: i64,
    /// `test_steps` rows
    pub steps: i64,
    /// `custom_fields` rows
    pub custom_fields: i64,
    /// `test_case_keywords` rows
    pub keywords: i64,
    /// `test_case_requirements` rows
    pub requirements: i64,
}

// ---------------------------------------------------------------------------
// Suites
// ---------------------------------------------------------------------------

/// Inserts a suite and returns its id
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_suite(conn: &Connection, suite: &NewSuite<'_>) -> PersistenceResult<i64> {
    conn.execute(
        "INSERT INTO test_suites (project_id, parent_suite_id, name, description, node_order, \
         external_id, import_source, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            suite.project_id,
            suite.parent_suite_id,
            suite.name,
            suite.description,
            suite.node_order,
            suite.external_id,
            suite.import_source,
            Utc::now(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Returns the ids of every suite with this name in the project and source
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_suite_ids_by_name(
    conn: &Connection,
    project_id: i64,
    name: &str,
    import_source: &str,
) -> PersistenceResult<Vec<i64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id FROM test_suites WHERE project_id = ?1 AND name = ?2 AND import_source = ?3 \
         ORDER BY id",
    )?;
    let ids = stmt.query_map(params![project_id, name, import_source], |row| row.get(0))?;
    Ok(ids.collect::<Result<Vec<i64>, _>>()?)
}

/// Loads a suite by id
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_suite(conn: &Connection, id: i64) -> PersistenceResult<Option<TestSuiteRecord>> {
    let sql = format!("SELECT {SUITE_COLUMNS} FROM test_suites WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], suite_from_row).optional()?)
}

/// Lists the direct children of a suite (or the top-level suites when
/// `parent` is `None`), ordered by `node_order` then id
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_child_suites(
    conn: &Connection,
    project_id: i64,
    parent: Option<i64>,
) -> PersistenceResult<Vec<TestSuiteRecord>> {
    let sql = format!(
        "SELECT {SUITE_COLUMNS} FROM test_suites WHERE project_id = ?1 \
         AND parent_suite_id IS ?2 ORDER BY node_order, id"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![project_id, parent], suite_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn suite_from_row(row: &Row<'_>) -> rusqlite::Result<TestSuiteRecord> {
    Ok(TestSuiteRecord {
        id: row.get(0)?,
        project_id: row.get(1)?,
        parent_suite_id: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        node_order: row.get(5)?,
        external_id: row.get(6)?,
        import_source: row.get(7)?,
    })
}

// ---------------------------------------------------------------------------
// Cases
// ---------------------------------------------------------------------------

/// Inserts a case and returns its id
///
/// # Errors
///
/// Returns an error if the insert fails (including a dedup-key collision).
pub fn insert_case(conn: &Connection, case: &CaseRow) -> PersistenceResult<i64> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO test_cases (test_suite_id, project_id, internal_id, external_id, title, \
         summary, preconditions, execution_type, importance, status, version, is_open, active, \
         node_order, import_source, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)",
        params![
            case.test_suite_id,
            case.project_id,
            case.internal_id,
            case.external_id,
            case.title,
            case.summary,
            case.preconditions,
            case.execution_type.code(),
            case.importance.level(),
            case.status,
            case.version,
            case.is_open,
            case.active,
            case.node_order,
            case.import_source,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrites the scalar columns of an existing case.
///
/// The case keeps its id, suite and creation time.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_case(conn: &Connection, id: i64, case: &CaseRow) -> PersistenceResult<()> {
    conn.execute(
        "UPDATE test_cases SET internal_id = ?2, external_id = ?3, title = ?4, summary = ?5, \
         preconditions = ?6, execution_type = ?7, importance = ?8, status = ?9, version = ?10, \
         is_open = ?11, active = ?12, import_source = ?13, updated_at = ?14 WHERE id = ?1",
        params![
            id,
            case.internal_id,
            case.external_id,
            case.title,
            case.summary,
            case.preconditions,
            case.execution_type.code(),
            case.importance.level(),
            case.status,
            case.version,
            case.is_open,
            case.active,
            case.import_source,
            Utc::now(),
        ],
    )?;
    Ok(())
}

/// Finds the case carrying this internal id in the project and source
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_case_by_internal_id(
    conn: &Connection,
    project_id: i64,
    import_source: &str,
    internal_id: &str,
) -> PersistenceResult<Option<TestCaseRecord>> {
    let sql = format!(
        "SELECT {CASE_COLUMNS} FROM test_cases WHERE project_id = ?1 AND import_source = ?2 \
         AND internal_id = ?3 LIMIT 1"
    );
    Ok(conn
        .query_row(&sql, params![project_id, import_source, internal_id], case_from_row)
        .optional()?)
}

/// Returns the ids of every case with this title inside a suite of this name
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_case_ids_by_title_and_suite(
    conn: &Connection,
    project_id: i64,
    title: &str,
    suite_name: &str,
) -> PersistenceResult<Vec<i64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT c.id FROM test_cases c JOIN test_suites s ON s.id = c.test_suite_id \
         WHERE c.project_id = ?1 AND c.title = ?2 AND s.name = ?3 ORDER BY c.id",
    )?;
    let ids = stmt.query_map(params![project_id, title, suite_name], |row| row.get(0))?;
    Ok(ids.collect::<Result<Vec<i64>, _>>()?)
}

/// Loads a case by id
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_case(conn: &Connection, id: i64) -> PersistenceResult<Option<TestCaseRecord>> {
    let sql = format!("SELECT {CASE_COLUMNS} FROM test_cases WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], case_from_row).optional()?)
}

/// Lists the cases of a suite ordered by `node_order` then id
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_cases_in_suite(
    conn: &Connection,
    suite_id: i64,
) -> PersistenceResult<Vec<TestCaseRecord>> {
    let sql = format!(
        "SELECT {CASE_COLUMNS} FROM test_cases WHERE test_suite_id = ?1 ORDER BY node_order, id"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([suite_id], case_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn case_from_row(row: &Row<'_>) -> rusqlite::Result<TestCaseRecord> {
    let execution_type: i64 = row.get(8)?;
    let importance: i64 = row.get(9)?;
    let created_at: DateTime<Utc> = row.get(16)?;
    let updated_at: DateTime<Utc> = row.get(17)?;
    Ok(TestCaseRecord {
        id: row.get(0)?,
        test_suite_id: row.get(1)?,
        project_id: row.get(2)?,
        internal_id: row.get(3)?,
        external_id: row.get(4)?,
        title: row.get(5)?,
        summary: row.get(6)?,
        preconditions: row.get(7)?,
        execution_type: ExecutionType::from_code(execution_type),
        importance: Importance::from_level(importance),
        status: row.get(10)?,
        version: row.get(11)?,
        is_open: row.get(12)?,
        active: row.get(13)?,
        node_order: row.get(14)?,
        import_source: row.get(15)?,
        created_at,
        updated_at,
    })
}

// ---------------------------------------------------------------------------
// Case children
// ---------------------------------------------------------------------------

/// Deletes every step of a case and inserts the given ones
///
/// # Errors
///
/// Returns an error if a delete or insert fails.
pub fn replace_steps(
    conn: &Connection,
    test_case_id: i64,
    steps: &[ParsedStep],
) -> PersistenceResult<()> {
    conn.execute("DELETE FROM test_steps WHERE test_case_id = ?1", [test_case_id])?;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO test_steps (test_case_id, step_number, actions, expected_results, \
         execution_type) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for step in steps {
        stmt.execute(params![
            test_case_id,
            step.step_number,
            step.actions,
            step.expected_results,
            step.execution_type.code(),
        ])?;
    }
    Ok(())
}

/// Deletes every custom field of a case and inserts the given ones
///
/// # Errors
///
/// Returns an error if a delete or insert fails.
pub fn replace_custom_fields(
    conn: &Connection,
    test_case_id: i64,
    fields: &[CustomField],
) -> PersistenceResult<()> {
    conn.execute(
        "DELETE FROM custom_fields WHERE test_case_id = ?1",
        [test_case_id],
    )?;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO custom_fields (test_case_id, name, value) VALUES (?1, ?2, ?3)",
    )?;
    for field in fields {
        stmt.execute(params![test_case_id, field.name, field.value])?;
    }
    Ok(())
}

/// Deletes every keyword of a case and inserts the given ones
///
/// # Errors
///
/// Returns an error if a delete or insert fails.
pub fn replace_keywords(
    conn: &Connection,
    test_case_id: i64,
    keywords: &[Keyword],
) -> PersistenceResult<()> {
    conn.execute(
        "DELETE FROM test_case_keywords WHERE test_case_id = ?1",
        [test_case_id],
    )?;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO test_case_keywords (test_case_id, keyword, notes) VALUES (?1, ?2, ?3)",
    )?;
    for keyword in keywords {
        stmt.execute(params![test_case_id, keyword.name, keyword.notes])?;
    }
    Ok(())
}

/// Deletes every requirement link of a case and inserts the given ones
///
/// # Errors
///
/// Returns an error if a delete or insert fails.
pub fn replace_requirements(
    conn: &Connection,
    test_case_id: i64,
    requirements: &[Requirement],
) -> PersistenceResult<()> {
    conn.execute(
        "DELETE FROM test_case_requirements WHERE test_case_id = ?1",
        [test_case_id],
    )?;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO test_case_requirements (test_case_id, doc_id, title, spec_title) \
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for requirement in requirements {
        stmt.execute(params![
            test_case_id,
            requirement.doc_id,
            requirement.title,
            requirement.spec_title,
        ])?;
    }
    Ok(())
}

/// Loads the steps of a case ordered by step number
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_steps(conn: &Connection, test_case_id: i64) -> PersistenceResult<Vec<TestStepRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, test_case_id, step_number, actions, expected_results, execution_type \
         FROM test_steps WHERE test_case_id = ?1 ORDER BY step_number",
    )?;
    let rows = stmt.query_map([test_case_id], |row| {
        let execution_type: i64 = row.get(5)?;
        Ok(TestStepRecord {
            id: row.get(0)?,
            test_case_id: row.get(1)?,
            step_number: row.get(2)?,
            actions: row.get(3)?,
            expected_results: row.get(4)?,
            execution_type: ExecutionType::from_code(execution_type),
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Loads the custom fields of a case in insertion order
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_custom_fields(
    conn: &Connection,
    test_case_id: i64,
) -> PersistenceResult<Vec<CustomField>> {
    let mut stmt = conn.prepare_cached(
        "SELECT name, value FROM custom_fields WHERE test_case_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map([test_case_id], |row| {
        Ok(CustomField {
            name: row.get(0)?,
            value: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Loads the keywords of a case in insertion order
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_keywords(conn: &Connection, test_case_id: i64) -> PersistenceResult<Vec<Keyword>> {
    let mut stmt = conn.prepare_cached(
        "SELECT keyword, notes FROM test_case_keywords WHERE test_case_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map([test_case_id], |row| {
        Ok(Keyword {
            name: row.get(0)?,
            notes: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Loads the requirement links of a case in insertion order
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_requirements(
    conn: &Connection,
    test_case_id: i64,
) -> PersistenceResult<Vec<Requirement>> {
    let mut stmt = conn.prepare_cached(
        "SELECT doc_id, title, spec_title FROM test_case_requirements \
         WHERE test_case_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map([test_case_id], |row| {
        Ok(Requirement {
            doc_id: row.get(0)?,
            title: row.get(1)?,
            spec_title: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Counts the rows of every import-written table
///
/// # Errors
///
/// Returns an error if a count query fails.
pub fn table_counts(conn: &Connection) -> PersistenceResult<TableCounts> {
    let count = |table: &str| -> rusqlite::Result<i64> {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
    };
    Ok(TableCounts {
        suites: count("test_suites")?,
        cases: count("test_cases")?,
        steps: count("test_steps")?,
        custom_fields: count("custom_fields")?,
        keywords: count("test_case_keywords")?,
        requirements: count("test_case_requirements")?,
    })
}
