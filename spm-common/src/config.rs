//! Bootstrap configuration and setting resolution
//!
//! Every setting follows the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Built-in default (fallback)
//!
//! The config file itself is located via `--config` / `SPM_CONFIG`, then
//! `~/.config/spm/config.toml`, then `/etc/spm/config.toml`.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SPM_CONFIG";

/// Bootstrap configuration loaded from TOML file
///
/// Read once at startup. The service must restart to pick up changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Path to the serialized model bundle (JSON artifact)
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// HTTP bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted upload body, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// External transcoder used when direct decoding fails
    #[serde(default)]
    pub transcoder: TranscoderConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// File this configuration was read from (`None` for built-in defaults)
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// External transcoder configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranscoderConfig {
    /// Whether the transcoding fallback may be used at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Program name or path (resolved through PATH)
    #[serde(default = "default_transcoder_program")]
    pub program: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_transcoder_program() -> String {
    "ffmpeg".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            transcoder: TranscoderConfig::default(),
            logging: LoggingConfig::default(),
            source_path: None,
        }
    }
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_transcoder_program(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive applying the configured level to each crate
    pub fn filter_directive(&self, crates: &[&str]) -> String {
        crates
            .iter()
            .map(|name| format!("{}={}", name, self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl TomlConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Load configuration from an explicit file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.source_path = Some(path.to_path_buf());
        Ok::<_, Error>(config)
            .map_err(|e| Error::Config(format!("{} ({})", e, path.display())))
    }

    /// Load configuration, discovering the file when none is given
    ///
    /// An explicitly requested file must exist. When no file is requested
    /// and none is found in the standard locations, built-in defaults are
    /// returned. A file that exists but does not parse is always an error.
    ///
    /// Runs before logging is set up, so the chosen file is reported
    /// through `source_path` rather than logged here.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match locate_config_file() {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }
}

/// Find the config file in the standard locations
///
/// 1. `SPM_CONFIG` environment variable
/// 2. `~/.config/spm/config.toml` (platform config dir)
/// 3. `/etc/spm/config.toml` (Linux only)
pub fn locate_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("spm").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/spm/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve one setting: CLI → environment → TOML → default
///
/// An environment variable that is set but does not parse is an error,
/// not a silent fallthrough.
pub fn resolve_setting<T>(
    cli_arg: Option<T>,
    env_var_name: &str,
    toml_value: Option<T>,
    default: T,
) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    // Priority 1: Command-line argument
    if let Some(value) = cli_arg {
        return Ok(value);
    }

    // Priority 2: Environment variable
    if let Ok(raw) = std::env::var(env_var_name) {
        if !raw.is_empty() {
            debug!(var = env_var_name, "Setting taken from environment");
            return raw.parse::<T>().map_err(|e| {
                Error::InvalidInput(format!("{}={:?}: {}", env_var_name, raw, e))
            });
        }
    }

    // Priority 3: TOML config file
    if let Some(value) = toml_value {
        return Ok(value);
    }

    // Priority 4: Built-in default
    Ok(default)
}
