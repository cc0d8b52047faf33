//! Service configuration resolution for spm-mood
//!
//! Each setting resolves CLI → environment → TOML → built-in default, using
//! [`spm_common::config::resolve_setting`].

use spm_common::config::{resolve_setting, TomlConfig};
use spm_common::Result;
use std::path::PathBuf;
use tracing::info;

pub const MODEL_PATH_ENV: &str = "SPM_MODEL_PATH";
pub const HOST_ENV: &str = "SPM_HOST";
pub const PORT_ENV: &str = "SPM_PORT";

/// Model artifact used when nothing else is configured
pub const DEFAULT_MODEL_PATH: &str = "models/mood_model.json";

/// Values given on the command line (all optional)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub model_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub transcoder_enabled: bool,
    pub transcoder_program: String,
}

impl ServiceConfig {
    pub fn resolve(cli: &CliOverrides, toml: &TomlConfig) -> Result<Self> {
        let model_path = resolve_setting(
            cli.model_path.clone(),
            MODEL_PATH_ENV,
            toml.model_path.clone(),
            PathBuf::from(DEFAULT_MODEL_PATH),
        )?;
        let host = resolve_setting(cli.host.clone(), HOST_ENV, Some(toml.host.clone()), toml.host.clone())?;
        let port = resolve_setting(cli.port, PORT_ENV, Some(toml.port), toml.port)?;

        let config = Self {
            model_path,
            host,
            port,
            max_upload_bytes: toml.max_upload_bytes,
            transcoder_enabled: toml.transcoder.enabled,
            transcoder_program: toml.transcoder.program.clone(),
        };

        info!(
            model_path = %config.model_path.display(),
            host = %config.host,
            port = config.port,
            max_upload_bytes = config.max_upload_bytes,
            transcoder = if config.transcoder_enabled { config.transcoder_program.as_str() } else { "disabled" },
            "Configuration resolved"
        );
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
