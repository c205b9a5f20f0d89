//! Export command.

use std::path::Path;

use testlink_core::export::{ExportOptions, ExportScope, export_to_file};

use crate::cli::ExportArgs;
use crate::error::CliError;
use crate::util::open_context;

/// Export command handler
pub fn cmd_export(config_path: Option<&Path>, args: &ExportArgs) -> Result<(), CliError> {
    let scope = scope_from_args(args)?;
    let options = ExportOptions {
        include_keywords: !args.no_keywords,
        include_requirements: !args.no_requirements,
        include_custom_fields: !args.no_custom_fields,
    };

    let ctx = open_context(config_path)?;
    let output = export_to_file(ctx.db.connection(), &scope, &options, &args.output)?;

    println!(
        "Export complete: {} suite(s), {} case(s) written to {}",
        output.suite_count,
        output.case_count,
        args.output.display()
    );
    for warning in &output.warnings {
        tracing::warn!("Export: {warning}");
    }
    Ok(())
}

fn scope_from_args(args: &ExportArgs) -> Result<ExportScope, CliError> {
    match (args.project, args.suite, &args.cases) {
        (Some(id), None, None) => Ok(ExportScope::Project(id)),
        (None, Some(id), None) => Ok(ExportScope::Suite(id)),
        (None, None, Some(ids)) if !ids.is_empty() => Ok(ExportScope::TestCases(ids.clone())),
        _ => Err(CliError::Config(
            "Specify exactly one of --project, --suite or --cases".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn args() -> ExportArgs {
        ExportArgs {
            project: None,
            suite: None,
            cases: None,
            output: PathBuf::from("out.xml"),
            no_keywords: false,
            no_requirements: false,
            no_custom_fields: false,
        }
    }

    #[test]
    fn scope_follows_the_given_flag() {
        let mut a = args();
        a.suite = Some(4);
        assert_eq!(scope_from_args(&a).unwrap(), ExportScope::Suite(4));

        let mut a = args();
        a.cases = Some(vec![3, 1]);
        assert_eq!(scope_from_args(&a).unwrap(), ExportScope::TestCases(vec![3, 1]));
    }

    #[test]
    fn missing_or_empty_scope_is_rejected() {
        assert!(scope_from_args(&args()).is_err());
        let mut a = args();
        a.cases = Some(Vec::new());
        assert!(scope_from_args(&a).is_err());
    }
}
