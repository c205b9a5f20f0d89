//! Settings for the import engine, stored as TOML.
//!
//! [`ConfigManager`] locates the configuration directory and reads or writes
//! `settings.toml`; [`ImportSettings`] holds the values.

mod manager;
mod settings;

pub use manager::{CONFIG_DIR_ENV, ConfigManager, SETTINGS_FILE_NAME};
pub use settings::{DEFAULT_RETRY_WINDOW_HOURS, ImportSettings};
