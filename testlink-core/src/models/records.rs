//! Rows of the relational store as read back by the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{ExecutionType, Importance};

/// Import source tag written on every row created from TestLink XML
pub const TESTLINK_IMPORT_SOURCE: &str = "testlink";

/// A project owning suites and cases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Row id
    pub id: i64,
    /// Project name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A persisted test suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuiteRecord {
    /// Row id
    pub id: i64,
    /// Owning project
    pub project_id: i64,
    /// Parent suite, `None` for top-level suites
    pub parent_suite_id: Option<i64>,
    /// Suite name
    pub name: String,
    /// Details text
    pub description: String,
    /// Sibling order
    pub node_order: i64,
    /// Id of the suite in the source system
    pub external_id: Option<String>,
    /// Where the row came from (`testlink` for imports)
    pub import_source: Option<String>,
}

/// A persisted test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseRecord {
    /// Row id
    pub id: i64,
    /// Containing suite
    pub test_suite_id: i64,
    /// Owning project
    pub project_id: i64,
    /// Source identifier (dedup key together with `import_source`)
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
    /// Source version number
    pub version: Option<i64>,
    /// Open-for-editing flag
    pub is_open: bool,
    /// Active flag
    pub active: bool,
    /// Sibling order
    pub node_order: i64,
    /// Where the row came from
    pub import_source: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// A persisted test step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStepRecord {
    /// Row id
    pub id: i64,
    /// Owning case
    pub test_case_id: i64,
    /// 1-based, unique per case
    pub step_number: u32,
    /// Actions text
    pub actions: String,
    /// Expected results text
    pub expected_results: String,
    /// Manual or automated
    pub execution_type: ExecutionType,
}
