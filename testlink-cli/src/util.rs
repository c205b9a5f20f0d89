//! Shared utility functions used across command modules.

use std::path::{Path, PathBuf};

use testlink_core::config::{ConfigManager, ImportSettings};
use testlink_core::store::Database;

use crate::error::CliError;

/// Settings and an open database for one command
pub struct Context {
    /// Loaded settings
    pub settings: ImportSettings,
    /// Open database
    pub db: Database,
}

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    ConfigManager::resolve(config_path)
        .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}")))
}

/// Loads settings and opens the configured database
pub fn open_context(config_path: Option<&Path>) -> Result<Context, CliError> {
    let settings = create_config_manager(config_path)?.load_settings()?;
    let db_path = settings.database_path();
    let db = Database::open(&db_path).map_err(|e| {
        CliError::Database(format!("Failed to open {}: {e}", db_path.display()))
    })?;
    Ok(Context { settings, db })
}

/// Copies an import file into the upload directory so a failed import can
/// be retried after the caller's copy is gone.
pub fn stage_upload(settings: &ImportSettings, file: &Path) -> Result<PathBuf, CliError> {
    let upload_dir = settings.upload_dir();
    std::fs::create_dir_all(&upload_dir)?;

    let file_name = file
        .file_name()
        .map_or_else(|| "import.xml".into(), |n| n.to_string_lossy().into_owned());
    let prefix = uuid::Uuid::new_v4().simple().to_string();
    let staged = upload_dir.join(format!("{}-{file_name}", &prefix[..8]));

    std::fs::copy(file, &staged)?;
    tracing::debug!(from = %file.display(), to = %staged.display(), "Import file staged");
    Ok(staged)
}

/// Pads or truncates `value` to `width` characters
pub fn fit(value: &str, width: usize) -> String {
    let count = value.chars().count();
    if count <= width {
        format!("{value:<width$}")
    } else {
        let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
