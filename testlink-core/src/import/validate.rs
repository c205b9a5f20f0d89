//! Structural checks and metrics over a parsed suite tree.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::ParsedSuiteNode;

/// Shape metrics of a parsed tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStatistics {
    /// Root plus every descendant suite
    pub total_test_suites: usize,
    /// Cases across all suites
    pub total_test_cases: usize,
    /// Longest root-to-leaf suite chain, root = 1
    pub max_depth: usize,
    /// True if the root has at least one child suite
    pub has_nested_suites: bool,
}

/// Computes [`TreeStatistics`] for a tree.
#[must_use]
pub fn compute_statistics(root: &ParsedSuiteNode) -> TreeStatistics {
    let mut stats = TreeStatistics {
        has_nested_suites: !root.children.is_empty(),
        ..TreeStatistics::default()
    };
    root.walk(|suite, depth| {
        stats.total_test_suites += 1;
        stats.total_test_cases += suite.test_cases.len();
        stats.max_depth = stats.max_depth.max(depth);
    });
    stats
}

/// Checks required fields across the tree.
///
/// Every suite needs a name, every case a name and an internal id. Messages
/// carry the 1-based sibling position of each suite below the root, e.g.
/// `Test suite 2: Test case 1: Name is required`.
#[must_use]
pub fn validate_tree(root: &ParsedSuiteNode) -> Vec<String> {
    let mut errors = Vec::new();
    let mut stack: Vec<(&ParsedSuiteNode, String)> = vec![(root, String::new())];

    while let Some((suite, prefix)) = stack.pop() {
        if suite.name.trim().is_empty() {
            if prefix.is_empty() {
                errors.push("Test suite name is required".to_string());
            } else {
                errors.push(format!("{prefix}Name is required"));
            }
        }

        for (index, case) in suite.test_cases.iter().enumerate() {
            let case_prefix = format!("{prefix}Test case {}: ", index + 1);
            if case.name.trim().is_empty() {
                errors.push(format!("{case_prefix}Name is required"));
            }
            if case.internal_id.trim().is_empty() {
                errors.push(format!("{case_prefix}Internal ID is required"));
            }
        }

        // Reverse push keeps messages in document order.
        for (index, child) in suite.children.iter().enumerate().rev() {
            stack.push((child, format!("{prefix}Test suite {}: ", index + 1)));
        }
    }

    errors
}

/// [`validate_tree`] as a `Result`
///
/// # Errors
///
/// Returns a [`ValidationError`] listing every problem found.
pub fn ensure_valid(root: &ParsedSuiteNode) -> Result<(), ValidationError> {
    let errors = validate_tree(root);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(errors))
    }
}
