//! Merge strategies and the advisory strategy recommendation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::duplicates::DuplicateSummary;
use super::validate::TreeStatistics;
use crate::error::ImportError;

/// Default case count above which an import is flagged as large
pub const DEFAULT_LARGE_IMPORT_THRESHOLD: usize = 1000;

/// Default suite depth above which a hierarchy is flagged as deep
pub const DEFAULT_DEEP_HIERARCHY_THRESHOLD: usize = 5;

/// How an incoming case is reconciled with an existing case of the same
/// internal id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeStrategy {
    /// Leave the existing case untouched
    #[default]
    SkipDuplicates,
    /// Overwrite scalars and replace steps and custom fields
    UpdateExisting,
    /// Insert a new case with a suffixed internal id
    CreateNew,
    /// Field-level merge where non-empty incoming values win
    MergeData,
}

impl MergeStrategy {
    /// Every strategy in declaration order
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::SkipDuplicates,
            Self::UpdateExisting,
            Self::CreateNew,
            Self::MergeData,
        ]
    }

    /// Wire name, e.g. `SKIP_DUPLICATES`
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SkipDuplicates => "SKIP_DUPLICATES",
            Self::UpdateExisting => "UPDATE_EXISTING",
            Self::CreateNew => "CREATE_NEW",
            Self::MergeData => "MERGE_DATA",
        }
    }

    /// One-line description for listings
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::SkipDuplicates => "Keep existing cases, import only new ones",
            Self::UpdateExisting => "Overwrite existing cases with incoming data",
            Self::CreateNew => "Import every case as a new copy",
            Self::MergeData => "Fill existing cases with non-empty incoming values",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::all()
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| ImportError::UnknownStrategy(s.to_string()))
    }
}

/// Thresholds for the advisory warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyThresholds {
    /// Warn when the tree holds more cases than this
    pub large_import: usize,
    /// Warn when the tree is deeper than this
    pub deep_hierarchy: usize,
}

impl Default for StrategyThresholds {
    fn default() -> Self {
        Self {
            large_import: DEFAULT_LARGE_IMPORT_THRESHOLD,
            deep_hierarchy: DEFAULT_DEEP_HIERARCHY_THRESHOLD,
        }
    }
}

/// Suggested strategy with the reasoning behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyRecommendation {
    /// Strategy the preview suggests
    pub suggested_strategy: MergeStrategy,
    /// Why it was chosen
    pub reasons: Vec<String>,
    /// Size and shape concerns
    pub warnings: Vec<String>,
}

/// Recommends a strategy from tree metrics and duplicate counts.
///
/// Uses the share of incoming cases that already exist: above 50% suggests
/// [`MergeStrategy::UpdateExisting`], 10% to 50% [`MergeStrategy::MergeData`],
/// none [`MergeStrategy::CreateNew`], anything else
/// [`MergeStrategy::SkipDuplicates`].
#[must_use]
pub fn recommend_strategy(
    stats: &TreeStatistics,
    summary: &DuplicateSummary,
    thresholds: &StrategyThresholds,
) -> StrategyRecommendation {
    let percentage = duplicate_percentage(summary.duplicate_test_cases, summary.total_test_cases);

    let (suggested_strategy, reason) = if percentage > 50.0 {
        (
            MergeStrategy::UpdateExisting,
            format!("{percentage:.1}% of test cases already exist; updating keeps them current"),
        )
    } else if percentage >= 10.0 {
        (
            MergeStrategy::MergeData,
            format!("{percentage:.1}% of test cases already exist; merging fills in new data"),
        )
    } else if summary.duplicate_test_cases == 0 {
        (
            MergeStrategy::CreateNew,
            "No duplicate test cases found".to_string(),
        )
    } else {
        (
            MergeStrategy::SkipDuplicates,
            format!("Only {percentage:.1}% of test cases already exist; skipping them is safe"),
        )
    };

    let mut reasons = vec![reason];
    if summary.duplicate_test_suites > 0 {
        reasons.push(format!(
            "{} test suite(s) with the same name already exist",
            summary.duplicate_test_suites
        ));
    }

    let mut warnings = Vec::new();
    if stats.total_test_cases > thresholds.large_import {
        warnings.push(format!(
            "Large import: {} test cases (more than {})",
            stats.total_test_cases, thresholds.large_import
        ));
    }
    if stats.max_depth > thresholds.deep_hierarchy {
        warnings.push(format!(
            "Deep hierarchy: {} levels of test suites (more than {})",
            stats.max_depth, thresholds.deep_hierarchy
        ));
    }

    StrategyRecommendation {
        suggested_strategy,
        reasons,
        warnings,
    }
}

fn duplicate_percentage(duplicates: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        duplicates as f64 / total as f64 * 100.0
    }
}
