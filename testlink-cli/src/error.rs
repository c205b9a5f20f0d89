//! CLI error types and exit codes.

use testlink_core::error::{ConfigError, ExportError, ImportError, PersistenceError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, storage or I/O
    pub const GENERAL_ERROR: i32 = 1;
    /// The import or export itself failed (parse, validation, commit)
    pub const OPERATION_FAILED: i32 = 2;
    /// A referenced project, suite, case or log does not exist
    pub const NOT_FOUND: i32 = 3;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Import failed
    #[error("Import error: {0}")]
    Import(String),

    /// Export failed
    #[error("Export error: {0}")]
    Export(String),

    /// Referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// JSON output could not be produced
    #[error("Output error: {0}")]
    Output(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PersistenceError> for CliError {
    fn from(err: PersistenceError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<ImportError> for CliError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::ProjectNotFound(_)
            | ImportError::LogNotFound(_)
            | ImportError::FileNotFound(_) => Self::NotFound(err.to_string()),
            other => Self::Import(other.to_string()),
        }
    }
}

impl From<ExportError> for CliError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::NotFound { .. } => Self::NotFound(err.to_string()),
            ExportError::Io(e) => Self::Io(e),
            other => Self::Export(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Import(_) | Self::Export(_) => exit_codes::OPERATION_FAILED,
            Self::NotFound(_) => exit_codes::NOT_FOUND,
            Self::Config(_) | Self::Database(_) | Self::Output(_) | Self::Io(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entities_map_to_not_found() {
        let err = CliError::from(ImportError::ProjectNotFound(4));
        assert_eq!(err.exit_code(), exit_codes::NOT_FOUND);
        assert_eq!(err.to_string(), "Project 4 not found");

        let err = CliError::from(ExportError::NotFound {
            kind: "Test suite",
            id: 9,
        });
        assert_eq!(err.exit_code(), exit_codes::NOT_FOUND);
    }

    #[test]
    fn failed_operations_use_their_own_code() {
        let err = CliError::from(ImportError::UnknownStrategy("X".into()));
        assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
        assert_eq!(
            CliError::Config("bad".into()).exit_code(),
            exit_codes::GENERAL_ERROR
        );
    }
}
