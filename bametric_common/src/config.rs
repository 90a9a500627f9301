//! Settings loading traits and types.
//!
//! Settings are read from an optional TOML file. Every section and key has a
//! default so an empty file (or no file at all) is a valid configuration.
//!
//! # Usage
//!
//! ```rust,no_run
//! use bametric_common::config::{ConfigLoader, Settings, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let settings = Settings::load(Path::new("bametric.toml"))?;
//!     settings.validate()?;
//!     println!("threads: {}", settings.apply.threads);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default number of records between two progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Error type for settings loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Settings file not found at specified path.
    #[error("Settings file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse settings: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Settings validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information, including per-file progress.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!(
                "unknown log level {s:?}: expected trace, debug, info, warn or error"
            )),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Logging verbosity level.
    pub level: LogLevel,

    /// Emit log lines as JSON objects.
    pub json: bool,
}

/// `[apply]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplySettings {
    /// Threads used for BAM decompression. Must be at least 1.
    pub threads: u16,

    /// Records between progress logs. `0` disables progress logging.
    pub progress_interval: u64,
}

impl Default for ApplySettings {
    fn default() -> Self {
        Self {
            threads: 1,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Runtime settings for the `bametric` binary.
///
/// # TOML Example
///
/// ```toml
/// [logging]
/// level = "debug"
/// json = false
///
/// [apply]
/// threads = 4
/// progress_interval = 500000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Logging configuration.
    pub logging: LoggingSettings,

    /// Defaults for the `apply` command.
    pub apply: ApplySettings,
}

impl Settings {
    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `apply.threads` is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.apply.threads == 0 {
            return Err(ConfigError::ValidationError(
                "apply.threads must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize)]
        struct Wrapper {
            level: LogLevel,
        }

        for (text, expected) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let parsed: Wrapper = toml::from_str(&format!("level = \"{text}\"")).unwrap();
            assert_eq!(parsed.level, expected);
            assert_eq!(expected.as_directive(), text);
            assert_eq!(text.to_uppercase().parse::<LogLevel>().unwrap(), expected);
        }
    }

    #[test]
    fn test_settings_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.logging.level, LogLevel::Info);
        assert!(!settings.logging.json);
        assert_eq!(settings.apply.threads, 1);
        assert_eq!(settings.apply.progress_interval, DEFAULT_PROGRESS_INTERVAL);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation_zero_threads() {
        let settings: Settings = toml::from_str("[apply]\nthreads = 0\n").unwrap();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_settings_unknown_key_rejected() {
        let result = toml::from_str::<Settings>("[apply]\nthreadz = 4\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = Settings::load(Path::new("/nonexistent/path/bametric.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = Settings::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_config_loader_success() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[logging]
level = "debug"
json = true

[apply]
threads = 4
progress_interval = 0
"#
        )
        .unwrap();
        file.flush().unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.logging.level, LogLevel::Debug);
        assert!(settings.logging.json);
        assert_eq!(settings.apply.threads, 4);
        assert_eq!(settings.apply.progress_interval, 0);
    }
}
