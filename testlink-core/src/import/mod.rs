//! TestLink XML import.
//!
//! The pieces run in this order:
//! - [`parser`] turns XML into a [`ParsedSuiteNode`](crate::models::ParsedSuiteNode) tree
//! - [`validate`] checks required fields and computes tree metrics
//! - [`duplicates`] looks up suites and cases that already exist
//! - [`strategy`] recommends a [`MergeStrategy`] for previews
//! - [`orchestrator`] commits the tree in one transaction and owns the
//!   import log lifecycle
//!
//! ```ignore
//! let mut importer = TestLinkImporter::new(db.connection_mut());
//! let preview = importer.preview_file(project_id, &path)?;
//! let summary = importer.import_file(&ImportRequest::new(
//!     project_id,
//!     &path,
//!     preview.recommendation.suggested_strategy,
//! ))?;
//! ```

pub mod duplicates;
pub mod orchestrator;
pub mod parser;
pub mod strategy;
pub mod validate;

pub use duplicates::{
    CaseDuplicate, DuplicateReport, DuplicateSummary, MatchType, SuiteDuplicate,
    analyze_duplicates,
};
pub use orchestrator::{
    CaseAction, CaseOutcome, INLINE_FILE_NAME, ImportOptions, ImportPreview, ImportRequest,
    ImportSummary, TestLinkImporter,
};
pub use parser::{TESTCASES_ROOT_NAME, parse_content, parse_file};
pub use strategy::{
    DEFAULT_DEEP_HIERARCHY_THRESHOLD, DEFAULT_LARGE_IMPORT_THRESHOLD, MergeStrategy,
    StrategyRecommendation, StrategyThresholds, recommend_strategy,
};
pub use validate::{TreeStatistics, compute_statistics, ensure_valid, validate_tree};
