//! Enumerated test-case attributes shared by the parsed tree and the store.

use serde::{Deserialize, Serialize};

/// How a test case (or a single step) is executed.
///
/// TestLink encodes this as `1` (manual) or `2` (automated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionType {
    /// Executed by a person
    #[default]
    Manual,
    /// Executed by an automation harness
    Automated,
}

impl ExecutionType {
    /// Returns the TestLink numeric code
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Manual => 1,
            Self::Automated => 2,
        }
    }

    /// Maps a TestLink numeric code, treating anything unknown as manual
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            2 => Self::Automated,
            _ => Self::Manual,
        }
    }

    /// Parses the textual form found in XML (`"1"`, `"2"`, `"manual"`, `"automated"`)
    #[must_use]
    pub fn from_xml(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("automated") {
            return Self::Automated;
        }
        value.parse::<i64>().map(Self::from_code).unwrap_or_default()
    }
}

impl std::fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Automated => write!(f, "automated"),
        }
    }
}

/// Test case importance, `1` (low) to `3` (high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Importance 1
    Low,
    /// Importance 2
    #[default]
    Medium,
    /// Importance 3
    High,
}

impl Importance {
    /// Returns the TestLink numeric level
    #[must_use]
    pub const fn level(self) -> i64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Maps a numeric level; values outside `1..=3` fall back to medium
    #[must_use]
    pub const fn from_level(level: i64) -> Self {
        match level {
            1 => Self::Low,
            3 => Self::High,
            _ => Self::Medium,
        }
    }

    /// Parses the textual XML form
    #[must_use]
    pub fn from_xml(value: &str) -> Self {
        value
            .trim()
            .parse::<i64>()
            .map(Self::from_level)
            .unwrap_or_default()
    }
}
