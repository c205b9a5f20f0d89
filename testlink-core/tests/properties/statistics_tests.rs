//! Property tests for tree statistics and validation

use proptest::prelude::*;
use testlink_core::import::{compute_statistics, validate_tree};
use testlink_core::models::{ParsedSuiteNode, ParsedTestCase};

/// A single chain of `depth` suites with one case in the deepest suite
fn chain(depth: usize) -> ParsedSuiteNode {
    let mut node = ParsedSuiteNode::new(format!("Level {depth}"))
        .with_case(ParsedTestCase::new("1", "leaf"));
    for level in (1..depth).rev() {
        node = ParsedSuiteNode::new(format!("Level {level}")).with_child(node);
    }
    node
}

proptest! {
    /// Property: a chain of n suites has depth n and n suites
    #[test]
    fn chain_depth_matches_length(depth in 1usize..200) {
        let stats = compute_statistics(&chain(depth));
        prop_assert_eq!(stats.max_depth, depth);
        prop_assert_eq!(stats.total_test_suites, depth);
        prop_assert_eq!(stats.total_test_cases, 1);
        prop_assert_eq!(stats.has_nested_suites, depth > 1);
    }

    /// Property: a flat suite has depth 1 whatever its case count
    #[test]
    fn flat_suite_depth_is_one(cases in 0usize..50) {
        let mut root = ParsedSuiteNode::new("Root");
        for i in 0..cases {
            root = root.with_case(ParsedTestCase::new(i.to_string(), format!("case {i}")));
        }
        let stats = compute_statistics(&root);
        prop_assert_eq!(stats.max_depth, 1);
        prop_assert_eq!(stats.total_test_cases, cases);
        prop_assert!(validate_tree(&root).is_empty());
    }

    /// Property: one error per case missing its internal id, in order
    #[test]
    fn missing_ids_are_each_reported(flags in proptest::collection::vec(any::<bool>(), 0..30)) {
        let mut root = ParsedSuiteNode::new("Root");
        for (i, has_id) in flags.iter().enumerate() {
            let id = if *has_id { i.to_string() } else { String::new() };
            root = root.with_case(ParsedTestCase::new(id, "named"));
        }

        let errors = validate_tree(&root);
        let expected: Vec<String> = flags
            .iter()
            .enumerate()
            .filter(|(_, has_id)| !**has_id)
            .map(|(i, _)| format!("Test case {}: Internal ID is required", i + 1))
            .collect();
        prop_assert_eq!(errors, expected);
    }
}
