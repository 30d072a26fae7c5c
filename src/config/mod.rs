//! Configuration module for chmacro.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, LoggingSettings, MacroSettings, MetadataSettings, Settings, SettingsError,
};
