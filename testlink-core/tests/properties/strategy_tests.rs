//! Property tests for the strategy recommendation

use proptest::prelude::*;
use testlink_core::import::{
    DuplicateSummary, MergeStrategy, StrategyThresholds, TreeStatistics, recommend_strategy,
};

fn stats(cases: usize, depth: usize) -> TreeStatistics {
    TreeStatistics {
        total_test_suites: 1,
        total_test_cases: cases,
        max_depth: depth,
        has_nested_suites: depth > 1,
    }
}

fn summary(duplicates: usize, total: usize) -> DuplicateSummary {
    DuplicateSummary {
        duplicate_test_suites: 0,
        duplicate_test_cases: duplicates,
        total_test_suites: 1,
        total_test_cases: total,
    }
}

proptest! {
    /// Property: the suggestion follows the duplicate percentage bands
    #[test]
    fn suggestion_follows_percentage(total in 1usize..500, raw in 0usize..500) {
        let duplicates = raw % (total + 1);
        let recommendation = recommend_strategy(
            &stats(total, 1),
            &summary(duplicates, total),
            &StrategyThresholds::default(),
        );

        // Integer comparisons avoid float rounding at the band edges.
        let expected = if duplicates * 100 > total * 50 {
            MergeStrategy::UpdateExisting
        } else if duplicates * 100 >= total * 10 {
            MergeStrategy::MergeData
        } else if duplicates == 0 {
            MergeStrategy::CreateNew
        } else {
            MergeStrategy::SkipDuplicates
        };
        prop_assert_eq!(recommendation.suggested_strategy, expected);
        prop_assert!(!recommendation.reasons.is_empty());
    }

    /// Property: warnings appear exactly when a threshold is exceeded
    #[test]
    fn warnings_track_thresholds(
        cases in 0usize..50,
        depth in 1usize..12,
        large in 0usize..50,
        deep in 1usize..12,
    ) {
        let thresholds = StrategyThresholds { large_import: large, deep_hierarchy: deep };
        let recommendation = recommend_strategy(&stats(cases, depth), &summary(0, cases), &thresholds);

        let expected = usize::from(cases > large) + usize::from(depth > deep);
        prop_assert_eq!(recommendation.warnings.len(), expected);
    }

    /// Property: strategy names parse back to the same strategy
    #[test]
    fn strategy_names_parse(index in 0usize..4, lower in any::<bool>()) {
        let strategy = MergeStrategy::all()[index];
        let name = if lower {
            strategy.as_str().to_lowercase().replace('_', "-")
        } else {
            strategy.as_str().to_string()
        };
        prop_assert_eq!(name.parse::<MergeStrategy>().unwrap(), strategy);
    }
}
