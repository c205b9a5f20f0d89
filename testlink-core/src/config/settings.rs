//! Import engine settings.

use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::import::{
    DEFAULT_DEEP_HIERARCHY_THRESHOLD, DEFAULT_LARGE_IMPORT_THRESHOLD, StrategyThresholds,
};
use crate::models::TESTLINK_IMPORT_SOURCE;
use crate::tracing::{TracingLevel, TracingOutput};

/// Default retry window after a failed import
pub const DEFAULT_RETRY_WINDOW_HOURS: i64 = 48;

const APP_DIR: &str = "testlink-bridge";

/// Settings read from `settings.toml`. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// SQLite database file, `~` allowed
    pub database_path: String,
    /// Directory uploaded XML files are kept in until cleanup, `~` allowed
    pub upload_dir: String,
    /// Hours a failed import stays retryable
    pub retry_window_hours: i64,
    /// Source tag written on imported rows and used for deduplication
    pub import_source: String,
    /// Case count above which previews warn about a large import
    pub large_import_threshold: usize,
    /// Suite depth above which previews warn about a deep hierarchy
    pub deep_hierarchy_threshold: usize,
    /// Default log level (`error`, `warn`, `info`, `debug`, `trace`)
    pub log_level: String,
    /// Log file; logs go to stderr when unset, `~` allowed
    pub log_file: Option<String>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        let data_dir = dirs::data_dir().map_or_else(|| PathBuf::from("."), |d| d.join(APP_DIR));
        Self {
            database_path: data_dir.join("testlink.db").to_string_lossy().into_owned(),
            upload_dir: data_dir.join("uploads").to_string_lossy().into_owned(),
            retry_window_hours: DEFAULT_RETRY_WINDOW_HOURS,
            import_source: TESTLINK_IMPORT_SOURCE.to_string(),
            large_import_threshold: DEFAULT_LARGE_IMPORT_THRESHOLD,
            deep_hierarchy_threshold: DEFAULT_DEEP_HIERARCHY_THRESHOLD,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl ImportSettings {
    /// Database path with `~` and environment variables expanded
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        expand(&self.database_path)
    }

    /// Upload directory with `~` and environment variables expanded
    #[must_use]
    pub fn upload_dir(&self) -> PathBuf {
        expand(&self.upload_dir)
    }

    /// Retry window as a duration, never negative and saturating at the
    /// largest representable duration
    #[must_use]
    pub fn retry_window(&self) -> Duration {
        Duration::try_hours(self.retry_window_hours.max(0)).unwrap_or(Duration::MAX)
    }

    /// Preview warning thresholds
    #[must_use]
    pub const fn thresholds(&self) -> StrategyThresholds {
        StrategyThresholds {
            large_import: self.large_import_threshold,
            deep_hierarchy: self.deep_hierarchy_threshold,
        }
    }

    /// Parsed log level, falling back to info
    #[must_use]
    pub fn tracing_level(&self) -> TracingLevel {
        self.log_level.parse().unwrap_or_default()
    }

    /// Log destination: the expanded `log_file`, or stderr
    #[must_use]
    pub fn tracing_output(&self) -> TracingOutput {
        self.log_file
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .map_or(TracingOutput::Stderr, |path| TracingOutput::File {
                path: expand(path),
            })
    }
}

fn expand(path: &str) -> PathBuf {
    shellexpand::full(path).map_or_else(
        |_| PathBuf::from(shellexpand::tilde(path).into_owned()),
        |expanded| PathBuf::from(expanded.into_owned()),
    )
}
