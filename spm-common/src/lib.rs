//! # SPM Common Library
//!
//! Shared code for the smart playlist mood services:
//! - Error type
//! - Bootstrap configuration (TOML) and config file discovery
//! - Setting resolution (CLI → environment → TOML → default)

pub mod config;
pub mod error;

pub use config::{LoggingConfig, TomlConfig, TranscoderConfig};
pub use error::{Error, Result};
