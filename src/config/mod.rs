//! Configuration module for the relay server
//!
//! Configuration comes from YAML files and environment variables, merged with
//! YAML values taking precedence over the environment and the environment
//! over built-in defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use bitran::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable fallbacks
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::core::upstream::EngineSettings;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

/// Audio parameters announced to the engine when a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AudioConfig {
    /// Container of the client audio forwarded upstream
    pub source_format: String,
    pub source_rate: u32,
    pub source_bits: u32,
    pub source_channel: u32,
    /// Container of the synthesized speech returned by the engine
    pub target_format: String,
    pub target_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            source_format: "wav".to_string(),
            source_rate: 16000,
            source_bits: 16,
            source_channel: 1,
            target_format: "ogg_opus".to_string(),
            target_rate: 24000,
        }
    }
}

/// Server configuration
///
/// Contains all configuration needed to run the relay:
/// - Server settings (host, port)
/// - Translation engine endpoint, credentials and timeouts
/// - Audio parameters
/// - Default language pair
/// - Utterance storage location
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Engine settings
    pub engine_url: String,
    pub engine_app_key: String,
    pub engine_access_key: String,
    pub engine_resource_id: String,
    pub connect_timeout_seconds: u64,
    pub send_timeout_ms: u64,
    /// How long a stopped session waits for the engine's last results
    pub drain_timeout_ms: u64,

    pub audio: AudioConfig,

    // Language pair used when the client does not pick one
    pub default_source_language: String,
    pub default_target_language: String,

    // Storage (if None, utterances are kept in memory)
    pub database_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from a YAML file, falling back to environment variables
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables
    /// 3. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // The .env file is not loaded here: the YAML file is the source of truth
        // and only real environment variables fill its gaps.
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Endpoint and credentials for the engine connector.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            url: self.engine_url.clone(),
            app_key: self.engine_app_key.clone(),
            access_key: self.engine_access_key.clone(),
            resource_id: self.engine_resource_id.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_seconds),
        }
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}
