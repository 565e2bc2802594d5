#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Clientgen Configuration
//!
//! This crate provides configuration management for the client generator.
//! It handles loading, saving, and managing configuration files that specify:
//! - Generation settings (flattening, constant promotion, convenience and async surfaces)
//! - Logging configuration
//! - Code generation parameters
//!
//! Configuration is stored in TOML format and can be loaded from files or created
//! with sensible defaults for development and testing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    /// Failed to parse the TOML configuration file
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize configuration to TOML format
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Configuration file was not found at the specified path
    #[error("Config file not found at: {0}")]
    NotFound(PathBuf),
    /// Could not locate the user's configuration directory
    #[error("Could not find user config directory")]
    ConfigDirUnavailable,
    /// A setting holds a value the generator cannot use
    #[error("Invalid setting `{key}`: {message}")]
    InvalidSetting {
        /// Setting key
        key: String,
        /// What is wrong with it
        message: String,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Generation settings handed to the transform
    #[serde(default)]
    pub settings: GenerationSettings,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Code generation settings
    #[serde(default)]
    pub codegen: CodegenConfig,
}

/// Options recognised by the transform.
///
/// Keys are camelCase so the same document can be embedded in a host's
/// settings object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    /// Lift properties of objects marked for flattening onto the owner
    pub flatten_client_flattened_properties: bool,
    /// Replace optional constants with single-member enums
    pub promote_optional_constants_to_enum: bool,
    /// Emit typed overloads next to the raw-payload methods
    #[serde(rename = "generateConvenienceAPI")]
    pub generate_convenience_api: bool,
    /// Emit `_async` counterparts
    #[serde(rename = "generateAsyncAPI")]
    pub generate_async_api: bool,
    /// Namespace override for every generated type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Required properties become constructor arguments
    pub required_properties_as_constructor_args: bool,
    /// Poll interval used when a long-running operation does not declare one
    pub default_poll_interval_seconds: u64,
    /// Extra status code to exception name entries (`"429" = "HttpResponse"`)
    pub custom_exception_mapping: BTreeMap<String, String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            flatten_client_flattened_properties: true,
            promote_optional_constants_to_enum: true,
            generate_convenience_api: true,
            generate_async_api: true,
            namespace: None,
            required_properties_as_constructor_args: true,
            default_poll_interval_seconds: 1,
            custom_exception_mapping: BTreeMap::new(),
        }
    }
}

impl GenerationSettings {
    /// Parsed `customExceptionMapping` in ascending status order
    pub fn exception_overrides(&self) -> Result<Vec<(u16, String)>, ConfigError> {
        let mut parsed = Vec::with_capacity(self.custom_exception_mapping.len());
        for (code, exception) in &self.custom_exception_mapping {
            let status = code
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|s| (100..=599).contains(s))
                .ok_or_else(|| ConfigError::InvalidSetting {
                    key: format!("customExceptionMapping.{}", code),
                    message: "expected an HTTP status code".to_string(),
                })?;
            if !types::method::KNOWN_EXCEPTIONS.contains(&exception.as_str()) {
                return Err(ConfigError::InvalidSetting {
                    key: format!("customExceptionMapping.{}", code),
                    message: format!(
                        "unknown exception `{}` (expected one of {})",
                        exception,
                        types::method::KNOWN_EXCEPTIONS.join(", ")
                    ),
                });
            }
            parsed.push((status, exception.clone()));
        }
        parsed.sort();
        Ok(parsed)
    }

    /// Reject settings the transform cannot honour
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_poll_interval_seconds == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "defaultPollIntervalSeconds".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if let Some(namespace) = &self.namespace {
            if namespace.trim().is_empty() {
                return Err(ConfigError::InvalidSetting {
                    key: "namespace".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        self.exception_overrides().map(|_| ())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error) or a full filter directive
    pub level: String,
    /// Log file path (optional)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { level: "info".to_string(), file: None } }
}

/// Code generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Path to the code-model JSON document
    pub input_path: PathBuf,
    /// Where to write generated modules
    pub output_dir: PathBuf,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("code-model.json"),
            output_dir: Config::default_output_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file at `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&contents)?;
        config.settings.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise the defaults
    pub fn from_optional_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if !path.as_ref().exists() =>
                Err(ConfigError::NotFound(path.as_ref().to_path_buf())),
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Save this configuration as a pretty-printed TOML file at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Pretty-printed TOML text
    pub fn to_toml(&self) -> Result<String, ConfigError> { Ok(toml::to_string_pretty(self)?) }

    /// Returns the default config file path:
    /// `{config_dir()}/clientgen/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir =
            dirs::config_dir().ok_or(ConfigError::ConfigDirUnavailable)?.join("clientgen");
        Ok(config_dir.join("config.toml"))
    }

    /// Get the default output directory for generated code
    pub fn default_output_dir() -> PathBuf {
        Self::default_output_dir_internal(
            std::env::var("OUT_DIR").ok(),
            std::env::current_dir().ok(),
        )
    }

    fn default_output_dir_internal(
        out_dir: Option<String>,
        current_dir: Option<PathBuf>,
    ) -> PathBuf {
        if let Some(out_dir) = out_dir {
            return PathBuf::from(out_dir);
        }
        if let Some(current_dir) = current_dir {
            return current_dir.join("generated");
        }
        PathBuf::from("generated")
    }
}
