//! Import preview command.

use std::fmt::Write as _;
use std::path::Path;

use testlink_core::import::{ImportOptions, ImportPreview, TestLinkImporter};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::util::open_context;

/// Preview command handler
pub fn cmd_preview(
    config_path: Option<&Path>,
    file: &Path,
    project: i64,
    format: OutputFormat,
) -> Result<(), CliError> {
    let mut ctx = open_context(config_path)?;
    let options = ImportOptions::from(&ctx.settings);
    let importer = TestLinkImporter::with_options(ctx.db.connection_mut(), options);
    let preview = importer.preview_file(project, file)?;

    match format {
        OutputFormat::Table => println!("{}", format_preview(&preview)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&preview)?),
    }
    Ok(())
}

/// Format a preview as human-readable text
pub fn format_preview(preview: &ImportPreview) -> String {
    let stats = &preview.statistics;
    let summary = &preview.duplicates.summary;
    let mut output = String::new();

    let _ = writeln!(output, "Root suite: {}", preview.root_name);
    let _ = writeln!(output, "  Test suites: {}", stats.total_test_suites);
    let _ = writeln!(output, "  Test cases: {}", stats.total_test_cases);
    let _ = writeln!(output, "  Max depth: {}", stats.max_depth);
    let _ = writeln!(
        output,
        "  Duplicates: {} suite(s), {} case(s)",
        summary.duplicate_test_suites, summary.duplicate_test_cases
    );

    if !preview.validation_errors.is_empty() {
        let _ = writeln!(output, "\nValidation errors:");
        for error in &preview.validation_errors {
            let _ = writeln!(output, "  - {error}");
        }
    }

    if !preview.duplicates.test_cases.is_empty() {
        let _ = writeln!(output, "\nDuplicate test cases:");
        for dup in &preview.duplicates.test_cases {
            let _ = writeln!(
                output,
                "  - [{}] {} in {} (existing: {:?})",
                dup.internal_id, dup.name, dup.suite_path, dup.existing_ids
            );
        }
    }

    let recommendation = &preview.recommendation;
    let _ = writeln!(
        output,
        "\nSuggested strategy: {}",
        recommendation.suggested_strategy
    );
    for reason in &recommendation.reasons {
        let _ = writeln!(output, "  - {reason}");
    }
    for warning in &recommendation.warnings {
        let _ = writeln!(output, "  ! {warning}");
    }

    output.trim_end().to_string()
}
