//! Project commands.

use std::fmt::Write as _;
use std::path::Path;

use testlink_core::models::Project;

use crate::cli::{OutputFormat, ProjectCommands};
use crate::error::CliError;
use crate::util::{fit, open_context};

/// Project command handler
pub fn cmd_project(config_path: Option<&Path>, subcmd: ProjectCommands) -> Result<(), CliError> {
    let ctx = open_context(config_path)?;
    match subcmd {
        ProjectCommands::Add { name, description } => {
            let project = ctx.db.create_project(&name, description.as_deref())?;
            println!("Created project {} (id {})", project.name, project.id);
        }
        ProjectCommands::List { format } => {
            let projects = ctx.db.list_projects()?;
            match format {
                OutputFormat::Table => println!("{}", format_table(&projects)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&projects)?),
            }
        }
    }
    Ok(())
}

/// Format projects as a table string
fn format_table(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects found.".to_string();
    }
    let mut output = format!("{:>5}  {}  {}\n", "ID", fit("NAME", 30), "DESCRIPTION");
    for project in projects {
        let _ = writeln!(
            output,
            "{:>5}  {}  {}",
            project.id,
            fit(&project.name, 30),
            project.description.as_deref().unwrap_or("-")
        );
    }
    output.trim_end().to_string()
}
