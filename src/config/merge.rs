use std::env;
use std::path::PathBuf;

use super::utils::parse_number;
use super::yaml::YamlConfig;
use super::{AudioConfig, ServerConfig};

pub(super) const DEFAULT_ENGINE_URL: &str = "wss://openspeech.bytedance.com/api/v4/ast/v2/translate";
pub(super) const DEFAULT_RESOURCE_ID: &str = "volc.service_type.10053";

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. YAML configuration values
/// 2. Environment variables
/// 3. Default values
///
/// Credentials left unset by both sources come out empty; validation
/// rejects them afterwards.
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();

    // Helper macro to get value with priority: YAML > ENV > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            $yaml_value
                .or_else(|| env::var($env_var).ok())
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // Helper macro for optional values: YAML > ENV
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            $yaml_value.or_else(|| env::var($env_var).ok())
        };
    }

    // Helper macro for numbers: YAML > ENV (parsed) > Default
    macro_rules! get_number {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            match $yaml_value {
                Some(value) => value,
                None => match env::var($env_var) {
                    Ok(raw) => parse_number($env_var, &raw)?,
                    Err(_) => $default,
                },
            }
        };
    }

    let server = yaml.server.unwrap_or_default();
    let engine = yaml.engine.unwrap_or_default();
    let audio = yaml.audio.unwrap_or_default();
    let languages = yaml.languages.unwrap_or_default();
    let storage = yaml.storage.unwrap_or_default();
    let audio_defaults = AudioConfig::default();

    // Server configuration
    let host = get_value!("HOST", server.host, "0.0.0.0");
    let port = get_number!("PORT", server.port, 3000u16);

    // Engine configuration
    let engine_url = get_value!("ENGINE_URL", engine.url, DEFAULT_ENGINE_URL);
    let engine_app_key = get_value!("ENGINE_APP_KEY", engine.app_key, "");
    let engine_access_key = get_value!("ENGINE_ACCESS_KEY", engine.access_key, "");
    let engine_resource_id =
        get_value!("ENGINE_RESOURCE_ID", engine.resource_id, DEFAULT_RESOURCE_ID);
    let connect_timeout_seconds = get_number!(
        "ENGINE_CONNECT_TIMEOUT_SECONDS",
        engine.connect_timeout_seconds,
        10u64
    );
    let send_timeout_ms = get_number!("ENGINE_SEND_TIMEOUT_MS", engine.send_timeout_ms, 2000u64);
    let drain_timeout_ms = get_number!(
        "ENGINE_DRAIN_TIMEOUT_MS",
        engine.drain_timeout_ms,
        3000u64
    );

    // Audio configuration
    let audio = AudioConfig {
        source_format: get_value!(
            "AUDIO_SOURCE_FORMAT",
            audio.source_format,
            audio_defaults.source_format
        ),
        source_rate: get_number!(
            "AUDIO_SOURCE_RATE",
            audio.source_rate,
            audio_defaults.source_rate
        ),
        source_bits: get_number!(
            "AUDIO_SOURCE_BITS",
            audio.source_bits,
            audio_defaults.source_bits
        ),
        source_channel: get_number!(
            "AUDIO_SOURCE_CHANNEL",
            audio.source_channel,
            audio_defaults.source_channel
        ),
        target_format: get_value!(
            "AUDIO_TARGET_FORMAT",
            audio.target_format,
            audio_defaults.target_format
        ),
        target_rate: get_number!(
            "AUDIO_TARGET_RATE",
            audio.target_rate,
            audio_defaults.target_rate
        ),
    };

    // Language defaults
    let default_source_language = get_value!("DEFAULT_SOURCE_LANGUAGE", languages.source, "zh");
    let default_target_language = get_value!("DEFAULT_TARGET_LANGUAGE", languages.target, "en");

    // Storage configuration
    let database_path =
        get_optional!("DATABASE_PATH", storage.database_path).map(PathBuf::from);

    Ok(ServerConfig {
        host,
        port,
        engine_url,
        engine_app_key,
        engine_access_key,
        engine_resource_id,
        connect_timeout_seconds,
        send_timeout_ms,
        drain_timeout_ms,
        audio,
        default_source_language,
        default_target_language,
        database_path,
    })
}
