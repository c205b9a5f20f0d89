//! TestLink XML export.
//!
//! Export runs in three steps: stored rows are loaded back into the parsed
//! tree shape ([`build_export_tree`]), serialized ([`write_xml`]) and then
//! checked ([`validate_export`]) before anything is returned or written.

mod builder;
mod validate;
mod writer;

use std::path::Path;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ExportError;
use crate::tracing::span_names;

pub use builder::{ExportDocument, build_export_tree};
pub use validate::{ExportValidation, validate_export};
pub use writer::write_xml;

/// Which rows to export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportScope {
    /// The listed cases, in the given order, under a `<testcases>` root
    TestCases(Vec<i64>),
    /// One suite with all its descendants
    Suite(i64),
    /// Every suite of a project
    Project(i64),
}

/// Optional parts of each test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExportOptions {
    /// Write `<keywords>`
    pub include_keywords: bool,
    /// Write `<requirements>`
    pub include_requirements: bool,
    /// Write `<custom_fields>`
    pub include_custom_fields: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_keywords: true,
            include_requirements: true,
            include_custom_fields: true,
        }
    }
}

/// A validated export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    /// The XML document
    pub xml: String,
    /// Suites written
    pub suite_count: usize,
    /// Cases written
    pub case_count: usize,
    /// Non-fatal findings of the self-check
    pub warnings: Vec<String>,
}

/// Exports `scope` as TestLink XML.
///
/// # Errors
///
/// Returns `ExportError::NotFound` for unknown ids, `ExportError::Validation`
/// when the generated document fails its own check, or a store error.
pub fn export_xml(
    conn: &Connection,
    scope: &ExportScope,
    options: &ExportOptions,
) -> Result<ExportOutput, ExportError> {
    let span = tracing::info_span!(span_names::EXPORT_EXECUTE, scope = ?scope);
    let _guard = span.enter();

    let document = build_export_tree(conn, scope, options)?;
    let xml = write_xml(&document);

    let validation = validate_export(&xml);
    if !validation.is_valid() {
        return Err(ExportError::Validation(validation.errors));
    }
    for warning in &validation.warnings {
        warn!(warning = %warning, "Export self-check warning");
    }

    let output = ExportOutput {
        suite_count: document.suite_count(),
        case_count: document.case_count(),
        warnings: validation.warnings,
        xml,
    };
    info!(
        suites = output.suite_count,
        cases = output.case_count,
        bytes = output.xml.len(),
        "Export generated"
    );
    Ok(output)
}

/// Exports `scope` and writes the document to `path`.
///
/// # Errors
///
/// Same as [`export_xml`], plus `ExportError::Io` when writing fails.
pub fn export_to_file(
    conn: &Connection,
    scope: &ExportScope,
    options: &ExportOptions,
    path: &Path,
) -> Result<ExportOutput, ExportError> {
    let output = export_xml(conn, scope, options)?;
    std::fs::write(path, &output.xml)?;
    info!(path = %path.display(), "Export written");
    Ok(output)
}
