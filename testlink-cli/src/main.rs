//! `testlink-cli` - command-line front end for TestLink XML import/export
//!
//! Creates projects, previews and imports TestLink XML files, exports stored
//! suites and cases, and manages the import history (retry, cleanup).

mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;
use cli::Cli;
use testlink_core::config::ImportSettings;
use testlink_core::tracing::{TracingConfig, TracingLevel, init_tracing};

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    init_logging(&cli);

    let result = commands::dispatch(config_path, cli.command);

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}

/// Warnings by default; `-v` switches to the configured level and each
/// further `-v` raises it by one. Output goes to `log_file` when configured.
fn init_logging(cli: &Cli) {
    let settings = util::create_config_manager(cli.config.as_deref())
        .and_then(|manager| manager.load_settings().map_err(error::CliError::from))
        .ok();

    let level = if cli.quiet {
        TracingLevel::Error
    } else if cli.verbose == 0 {
        TracingLevel::Warn
    } else {
        settings
            .as_ref()
            .map(ImportSettings::tracing_level)
            .unwrap_or_default()
            .raised_by(cli.verbose - 1)
    };
    let output = settings
        .as_ref()
        .map(ImportSettings::tracing_output)
        .unwrap_or_default();

    if let Err(e) = init_tracing(&TracingConfig::new().with_level(level).with_output(output)) {
        eprintln!("Failed to initialize logging: {e}");
    }
}
