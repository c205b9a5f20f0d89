//! TestLink Bridge Core Library
//!
//! Imports TestLink XML documents into a relational test repository and
//! exports stored suites and cases back to the same format.
//!
//! # Crate Structure
//!
//! - [`import`] - XML parsing, validation, duplicate analysis, strategies and the transactional commit
//! - [`export`] - Tree reconstruction, XML writer and output self-check
//! - [`import_log`] - Import attempt tracking, retry window and file cleanup
//! - [`store`] - SQLite schema and row-level repository functions
//! - [`models`] - Parsed tree and persisted record types
//! - [`config`] - Settings file loading and persistence
//! - [`tracing`] - Structured logging setup
//! - [`cdata`] - CDATA wrapping and unwrapping helpers

#![warn(missing_docs)]

pub mod cdata;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod import_log;
pub mod models;
pub mod store;
pub mod tracing;

pub use config::{ConfigManager, ImportSettings};
pub use error::{
    ConfigError, ExportError, FileSystemError, ImportError, ImportResult, ParseError,
    PersistenceError, PersistenceResult, TestLinkError, ValidationError,
};
pub use export::{
    ExportDocument, ExportOptions, ExportOutput, ExportScope, ExportValidation, export_to_file,
    export_xml, validate_export,
};
pub use import::{
    DuplicateReport, ImportOptions, ImportPreview, ImportRequest, ImportSummary, MergeStrategy,
    StrategyRecommendation, StrategyThresholds, TestLinkImporter, TreeStatistics,
    analyze_duplicates, compute_statistics, parse_content, parse_file, recommend_strategy,
    validate_tree,
};
pub use import_log::{
    CleanupReport, ImportCounts, ImportLog, ImportStatus, cleanup_expired_files,
    get_import_log, list_import_logs,
};
pub use models::{
    CustomField, ExecutionType, Importance, Keyword, ParsedStep, ParsedSuiteNode,
    ParsedTestCase, Project, Requirement,
};
pub use store::Database;
pub use self::tracing::{TracingConfig, TracingLevel, TracingOutput, init_tracing};
