//! Settings bootstrap command.

use std::path::Path;

use testlink_core::config::ImportSettings;
use testlink_core::store::Database;

use crate::error::CliError;
use crate::util::create_config_manager;

/// Init command handler
pub fn cmd_init(
    config_path: Option<&Path>,
    database: Option<&Path>,
    force: bool,
) -> Result<(), CliError> {
    let manager = create_config_manager(config_path)?;
    let settings_path = manager.settings_path();

    if settings_path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            settings_path.display()
        )));
    }

    let mut settings = ImportSettings::default();
    if let Some(db_path) = database {
        settings.database_path = db_path.to_string_lossy().into_owned();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            settings.upload_dir = parent.join("uploads").to_string_lossy().into_owned();
        }
    }
    manager.save_settings(&settings)?;

    let db_path = settings.database_path();
    Database::open(&db_path)?;

    println!("Settings written to {}", settings_path.display());
    println!("Database ready at {}", db_path.display());
    Ok(())
}
