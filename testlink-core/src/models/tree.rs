//! In-memory suite tree produced by the XML parser and consumed by the
//! importer, the duplicate analyzer and the exporter.

use serde::{Deserialize, Serialize};

use super::custom_field::{CustomField, Keyword, Requirement};
use super::enums::{ExecutionType, Importance};

/// A test suite node and everything nested below it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedSuiteNode {
    /// Source-provided suite id, if any
    pub id: Option<String>,
    /// Suite name
    pub name: String,
    /// Sibling ordering hint from the source
    pub node_order: Option<i64>,
    /// Suite details / description text
    pub details: String,
    /// Child suites in document order
    pub children: Vec<ParsedSuiteNode>,
    /// Test cases directly inside this suite, in document order
    pub test_cases: Vec<ParsedTestCase>,
}

impl ParsedSuiteNode {
    /// Creates an empty suite with the given name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Appends a child suite
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Appends a test case
    #[must_use]
    pub fn with_case(mut self, case: ParsedTestCase) -> Self {
        self.test_cases.push(case);
        self
    }

    /// Visits this suite and every descendant in depth-first pre-order,
    /// passing the depth (root = 1) to the callback.
    ///
    /// Uses an explicit stack so arbitrarily deep trees do not grow the
    /// call stack.
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(&'a Self, usize)) {
        let mut stack: Vec<(&Self, usize)> = vec![(self, 1)];
        while let Some((suite, depth)) = stack.pop() {
            visit(suite, depth);
            for child in suite.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }

    /// Returns every test case in the tree in depth-first order
    #[must_use]
    pub fn all_test_cases(&self) -> Vec<&ParsedTestCase> {
        let mut cases = Vec::new();
        self.walk(|suite, _| cases.extend(suite.test_cases.iter()));
        cases
    }
}

/// A single test case parsed from XML.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedTestCase {
    /// Source-unique identifier used for deduplication
    pub internal_id: String,
    /// Human-facing external id (without project prefix)
    pub external_id: Option<String>,
    /// Test case title
    pub name: String,
    /// Sibling ordering hint from the source
    pub node_order: Option<i64>,
    /// Version number in the source system
    pub version: Option<i64>,
    /// Summary (often HTML)
    pub summary: String,
    /// Preconditions (often HTML)
    pub preconditions: String,
    /// Manual or automated
    pub execution_type: ExecutionType,
    /// Importance level
    pub importance: Importance,
    /// Workflow status code from the source
    pub status: Option<i64>,
    /// Whether the case version is open for editing
    pub is_open: bool,
    /// Whether the case version is active
    pub active: bool,
    /// Ordered steps, numbered from 1
    pub steps: Vec<ParsedStep>,
    /// Custom field values
    pub custom_fields: Vec<CustomField>,
    /// Keywords
    pub keywords: Vec<Keyword>,
    /// Requirement links
    pub requirements: Vec<Requirement>,
    /// Which defaulted fields the source actually carried
    #[serde(default)]
    pub provided: ProvidedFields,
}

/// Presence of the case fields that fall back to a default when missing.
///
/// A merge only overwrites stored values for fields marked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProvidedFields {
    /// `<execution_type>` was present
    pub execution_type: bool,
    /// `<importance>` was present
    pub importance: bool,
    /// `<is_open>` was present
    pub is_open: bool,
    /// `<active>` was present
    pub active: bool,
}

impl ProvidedFields {
    /// Every field present
    #[must_use]
    pub const fn all() -> Self {
        Self {
            execution_type: true,
            importance: true,
            is_open: true,
            active: true,
        }
    }
}

impl ParsedTestCase {
    /// Creates a test case with the given internal id and name.
    ///
    /// New cases are open and active, matching TestLink defaults.
    #[must_use]
    pub fn new(internal_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            internal_id: internal_id.into(),
            name: name.into(),
            is_open: true,
            active: true,
            ..Self::default()
        }
    }

    /// Sets the summary
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Appends a step, numbering it after the existing ones
    #[must_use]
    pub fn with_step(mut self, actions: impl Into<String>, expected: impl Into<String>) -> Self {
        let step_number = self.steps.len() as u32 + 1;
        self.steps
            .push(ParsedStep::new(step_number, actions, expected));
        self
    }

    /// Renumbers steps `1..=n` in their current order
    pub fn renumber_steps(&mut self) {
        for (index, step) in self.steps.iter_mut().enumerate() {
            step.step_number = index as u32 + 1;
        }
    }
}

/// One step of a test case.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedStep {
    /// 1-based position within the case
    pub step_number: u32,
    /// What the tester does
    pub actions: String,
    /// What the tester should observe
    pub expected_results: String,
    /// Manual or automated
    pub execution_type: ExecutionType,
}

impl ParsedStep {
    /// Creates a manual step
    #[must_use]
    pub fn new(
        step_number: u32,
        actions: impl Into<String>,
        expected_results: impl Into<String>,
    ) -> Self {
        Self {
            step_number,
            actions: actions.into(),
            expected_results: expected_results.into(),
            execution_type: ExecutionType::Manual,
        }
    }
}
