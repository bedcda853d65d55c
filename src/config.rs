//! Startup configuration.
//!
//! Settings are read once from TOML. Missing keys fall back to their
//! defaults; an unreadable file or malformed document is a
//! [`ConfigurationFault`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigurationFault;

/// Top-level configuration document.
///
/// ```toml
/// [ldn-trusted-services]
/// localhost_default = true
/// from_ip = "203.0.113.5,198.51.100.9"
/// from_hostname = "notify.example.org"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Peers allowed to submit inbound notifications
    #[serde(rename = "ldn-trusted-services", default)]
    pub ldn_trusted: TrustedPeerConfig,
}

/// Trusted peer settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedPeerConfig {
    /// Trust requests from the local host without listing it
    #[serde(default)]
    pub localhost_default: bool,
    /// Comma-separated IP literals
    #[serde(default)]
    pub from_ip: String,
    /// Comma-separated hostnames, resolved once when the registry is built
    #[serde(default)]
    pub from_hostname: String,
}

impl GuardConfig {
    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationFault`] if the document is not valid TOML or
    /// a key has the wrong type.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigurationFault> {
        toml::from_str(content).map_err(|e| ConfigurationFault::new("<inline>", e.to_string()))
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationFault`] naming the file if it cannot be read
    /// or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationFault> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationFault::new(source_name.clone(), e.to_string()))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigurationFault::new(source_name.clone(), e.to_string()))?;
        info!(path = %source_name, "configuration loaded");
        Ok(config)
    }
}
