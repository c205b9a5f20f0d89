//! Command handler modules for the CLI.

mod export;
mod import;
mod init;
mod logs;
mod preview;
mod project;

use std::path::Path;

use crate::cli::Commands;
use crate::error::CliError;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(config_path: Option<&Path>, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Init { database, force } => {
            init::cmd_init(config_path, database.as_deref(), force)
        }
        Commands::Project(subcmd) => project::cmd_project(config_path, subcmd),
        Commands::Preview {
            file,
            project,
            format,
        } => preview::cmd_preview(config_path, &file, project, format),
        Commands::Import {
            file,
            project,
            strategy,
        } => import::cmd_import(config_path, &file, project, strategy.map(Into::into)),
        Commands::Export(args) => export::cmd_export(config_path, &args),
        Commands::Retry { log_id, strategy } => {
            import::cmd_retry(config_path, log_id, strategy.map(Into::into))
        }
        Commands::Cleanup => logs::cmd_cleanup(config_path),
        Commands::Logs { project, format } => logs::cmd_logs(config_path, project, format),
    }
}
