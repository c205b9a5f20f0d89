//! Error types for the TestLink interchange engine.
//!
//! Each phase of an import or export has its own error type; [`TestLinkError`]
//! aggregates them for callers that do not care which phase failed.

use std::path::PathBuf;

use thiserror::Error;

/// The XML could not be turned into a suite tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The source file could not be read
    #[error("Failed to read {path}: {reason}")]
    Read {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O message
        reason: String,
    },

    /// The document is not well-formed XML
    #[error("Malformed XML at byte {position}: {reason}")]
    Malformed {
        /// Byte offset reported by the reader
        position: u64,
        /// Reader message
        reason: String,
    },

    /// Neither `<testsuite>` nor `<testcases>` was found
    #[error("No testsuite or testcases root element found")]
    MissingRoot,
}

/// Structural problems found while validating a parsed tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed with {} error(s): {}", .errors.len(), .errors.join("; "))]
pub struct ValidationError {
    /// One message per problem, prefixed with its position in the tree
    pub errors: Vec<String>,
}

impl ValidationError {
    /// Wraps a list of messages
    #[must_use]
    pub const fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }
}

/// A failure talking to the relational store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// SQLite reported an error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A JSON column could not be encoded or decoded
    #[error("Failed to (de)serialize stored value: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value does not map to a known variant
    #[error("Invalid stored value for {field}: {value}")]
    InvalidValue {
        /// Column name
        field: &'static str,
        /// Offending value
        value: String,
    },
}

/// A failure touching the file system outside the import transaction.
#[derive(Debug, Error)]
#[error("{operation} failed for {}: {source}", path.display())]
pub struct FileSystemError {
    /// What was being attempted (e.g. "delete")
    pub operation: &'static str,
    /// File involved
    pub path: PathBuf,
    /// Underlying error
    #[source]
    pub source: std::io::Error,
}

/// Errors raised by the import path (parse, validate, commit, retry).
#[derive(Debug, Error)]
pub enum ImportError {
    /// XML parsing failed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The tree failed structural validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store rejected a read or write
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The import file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The referenced import log does not exist
    #[error("Import log {0} not found")]
    LogNotFound(i64),

    /// The referenced project does not exist
    #[error("Project {0} not found")]
    ProjectNotFound(i64),

    /// Retry was requested outside the retry window or for a non-failed log
    #[error("Retry not allowed for import log {log_id}: {reason}")]
    RetryNotAllowed {
        /// Log that was asked to retry
        log_id: i64,
        /// Why the retry was refused
        reason: String,
    },

    /// A strategy name did not match any known strategy
    #[error("Unknown import strategy: {0}")]
    UnknownStrategy(String),
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Persistence(PersistenceError::Sqlite(err))
    }
}

impl ImportError {
    /// Flattens the error into the strings stored on the import log
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(v) => v.errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// Errors raised while exporting to XML.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The store rejected a read
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The requested suite, case or project does not exist
    #[error("{kind} {id} not found")]
    NotFound {
        /// Entity kind ("Test suite", "Test case", "Project")
        kind: &'static str,
        /// Requested id
        id: i64,
    },

    /// The generated document failed self-validation
    #[error("Generated XML failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Writing the output file failed
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for ExportError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Persistence(PersistenceError::Sqlite(err))
    }
}

/// Configuration loading and saving errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be parsed
    #[error("Failed to parse settings: {0}")]
    Parse(String),

    /// The settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(String),

    /// No configuration directory could be determined
    #[error("Could not determine configuration directory")]
    NoConfigDir,

    /// Reading or writing the settings file failed
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error aggregating every phase.
#[derive(Debug, Error)]
pub enum TestLinkError {
    /// Import path failure
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Export path failure
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Store failure outside an import or export
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Settings failure
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias for import operations
pub type ImportResult<T> = Result<T, ImportError>;

/// Result alias for store operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;
