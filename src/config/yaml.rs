use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration; anything missing
/// falls back to environment variables and then to defaults.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3000
///
/// engine:
///   url: "wss://openspeech.bytedance.com/api/v4/ast/v2/translate"
///   app_key: "your-app-key"
///   access_key: "your-access-key"
///   resource_id: "volc.service_type.10053"
///   connect_timeout_seconds: 10
///   send_timeout_ms: 2000
///   drain_timeout_ms: 3000
///
/// audio:
///   source_format: "wav"
///   source_rate: 16000
///   source_bits: 16
///   source_channel: 1
///   target_format: "ogg_opus"
///   target_rate: 24000
///
/// languages:
///   source: "zh"
///   target: "en"
///
/// storage:
///   database_path: "./data/sessions.db"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub engine: Option<EngineYaml>,
    pub audio: Option<AudioYaml>,
    pub languages: Option<LanguagesYaml>,
    pub storage: Option<StorageYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Translation engine configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EngineYaml {
    pub url: Option<String>,
    pub app_key: Option<String>,
    pub access_key: Option<String>,
    pub resource_id: Option<String>,
    pub connect_timeout_seconds: Option<u64>,
    pub send_timeout_ms: Option<u64>,
    pub drain_timeout_ms: Option<u64>,
}

/// Audio parameters from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AudioYaml {
    pub source_format: Option<String>,
    pub source_rate: Option<u32>,
    pub source_bits: Option<u32>,
    pub source_channel: Option<u32>,
    pub target_format: Option<String>,
    pub target_rate: Option<u32>,
}

/// Default language pair from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LanguagesYaml {
    pub source: Option<String>,
    pub target: Option<String>,
}

/// Storage configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageYaml {
    pub database_path: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080

engine:
  url: "ws://engine.local/translate"
  app_key: "app"
  access_key: "access"
  resource_id: "resource"
  connect_timeout_seconds: 5
  send_timeout_ms: 500
  drain_timeout_ms: 800

audio:
  source_rate: 8000
  target_format: "pcm"

languages:
  source: "ko"
  target: "en"

storage:
  database_path: "/tmp/sessions.db"
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(
            config.server.as_ref().unwrap().host,
            Some("127.0.0.1".to_string())
        );
        assert_eq!(config.server.as_ref().unwrap().port, Some(8080));
        let engine = config.engine.as_ref().unwrap();
        assert_eq!(engine.url, Some("ws://engine.local/translate".to_string()));
        assert_eq!(engine.send_timeout_ms, Some(500));
        assert_eq!(engine.drain_timeout_ms, Some(800));
        let audio = config.audio.as_ref().unwrap();
        assert_eq!(audio.source_rate, Some(8000));
        assert!(audio.source_format.is_none());
        assert_eq!(
            config.languages.as_ref().unwrap().source,
            Some("ko".to_string())
        );
        assert_eq!(
            config.storage.as_ref().unwrap().database_path,
            Some("/tmp/sessions.db".to_string())
        );
    }

    #[test]
    fn test_yaml_config_empty() {
        let config: YamlConfig = serde_yaml::from_str("").unwrap();

        assert!(config.server.is_none());
        assert!(config.engine.is_none());
        assert!(config.audio.is_none());
        assert!(config.languages.is_none());
        assert!(config.storage.is_none());
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "server:\n  host: \"localhost\"\n  port: 3000\n").unwrap();

        let config = YamlConfig::from_file(&config_path).unwrap();

        assert_eq!(
            config.server.as_ref().unwrap().host,
            Some("localhost".to_string())
        );
        assert_eq!(config.server.as_ref().unwrap().port, Some(3000));
    }

    #[test]
    fn test_from_file_not_found() {
        let path = PathBuf::from("/nonexistent/config.yaml");
        let result = YamlConfig::from_file(&path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.yaml");
        fs::write(&config_path, "invalid: yaml: content:").unwrap();

        let result = YamlConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML config")
        );
    }
}
