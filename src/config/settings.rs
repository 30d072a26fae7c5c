//! TOML-based configuration for chmacro.
//!
//! Supports a config file (chmacro.toml) with environment variable expansion
//! in path values.
//!
//! Example configuration:
//! ```toml
//! [macros]
//! all_value = "$__all"
//!
//! [metadata]
//! default_database = "default"
//! schema_file = "${HOME}/.config/chmacro/schema.toml"
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::{Context, ALL_VALUE};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub macros: MacroSettings,
    pub metadata: MetadataSettings,
    pub logging: LoggingSettings,
}

/// Macro expansion settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MacroSettings {
    /// Template variable value meaning "all values selected".
    pub all_value: String,
}

impl Default for MacroSettings {
    fn default() -> Self {
        Self {
            all_value: ALL_VALUE.to_string(),
        }
    }
}

/// Metadata configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataSettings {
    /// Database used for unqualified table names.
    pub default_database: String,

    /// Schema file for the static metadata provider (supports ${ENV_VAR} expansion).
    pub schema_file: Option<String>,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            default_database: "default".to_string(),
            schema_file: None,
        }
    }
}

impl MetadataSettings {
    /// The schema file path with environment variables expanded.
    pub fn resolved_schema_file(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.schema_file
            .as_deref()
            .map(|path| expand_env_vars(path).map(PathBuf::from))
            .transpose()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `CHMACRO_CONFIG`
    /// 2. `./chmacro.toml`
    /// 3. `~/.config/chmacro/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("CHMACRO_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("chmacro.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("chmacro").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// A base context carrying the configured defaults.
    pub fn context_defaults(&self) -> Context {
        Context::new().with_all_value(self.macros.all_value.clone())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next(); // consume '{'
        }

        let mut var_name = String::new();
        while let Some(&ch) = chars.peek() {
            if braced && ch == '}' {
                chars.next(); // consume '}'
                break;
            }
            if !braced && !(ch.is_alphanumeric() || ch == '_') {
                break;
            }
            var_name.push(ch);
            chars.next();
        }

        if var_name.is_empty() && !braced {
            // Just a lone $, keep it
            result.push('$');
            continue;
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
