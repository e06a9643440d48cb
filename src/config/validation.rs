use super::ServerConfig;
use crate::core::language::DirectionPair;

/// Validate a fully merged configuration
pub fn validate(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_engine_credentials(&config.engine_app_key, &config.engine_access_key)?;
    validate_engine_url(&config.engine_url)?;
    validate_language_pair(
        &config.default_source_language,
        &config.default_target_language,
    )?;
    validate_timeouts(
        config.connect_timeout_seconds,
        config.send_timeout_ms,
        config.drain_timeout_ms,
    )?;
    Ok(())
}

/// Both engine credentials must be present
pub fn validate_engine_credentials(
    app_key: &str,
    access_key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if app_key.trim().is_empty() {
        return Err("ENGINE_APP_KEY is required to connect to the translation engine".into());
    }
    if access_key.trim().is_empty() {
        return Err("ENGINE_ACCESS_KEY is required to connect to the translation engine".into());
    }
    Ok(())
}

/// The engine speaks WebSocket only
pub fn validate_engine_url(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !(url.starts_with("ws://") || url.starts_with("wss://")) {
        return Err(format!("ENGINE_URL must be a ws:// or wss:// URL, got '{url}'").into());
    }
    Ok(())
}

/// The default pair must be supported and distinguishable by script
pub fn validate_language_pair(
    source: &str,
    target: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    DirectionPair::from_codes(source, target)
        .map_err(|e| format!("Invalid default language pair {source}/{target}: {e}"))?;
    Ok(())
}

pub fn validate_timeouts(
    connect_timeout_seconds: u64,
    send_timeout_ms: u64,
    drain_timeout_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    if connect_timeout_seconds == 0 {
        return Err("ENGINE_CONNECT_TIMEOUT_SECONDS must be greater than zero".into());
    }
    if send_timeout_ms == 0 {
        return Err("ENGINE_SEND_TIMEOUT_MS must be greater than zero".into());
    }
    if drain_timeout_ms == 0 {
        return Err("ENGINE_DRAIN_TIMEOUT_MS must be greater than zero".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_engine_credentials() {
        assert!(validate_engine_credentials("app", "access").is_ok());

        let err = validate_engine_credentials("", "access").unwrap_err();
        assert!(err.to_string().contains("ENGINE_APP_KEY"));

        let err = validate_engine_credentials("app", "  ").unwrap_err();
        assert!(err.to_string().contains("ENGINE_ACCESS_KEY"));
    }

    #[test]
    fn test_validate_engine_url() {
        assert!(validate_engine_url("wss://engine.example.com/translate").is_ok());
        assert!(validate_engine_url("ws://localhost:9000").is_ok());
        assert!(validate_engine_url("https://engine.example.com").is_err());
    }

    #[test]
    fn test_validate_language_pair() {
        assert!(validate_language_pair("zh", "en").is_ok());
        assert!(validate_language_pair("ja", "ko").is_ok());

        let err = validate_language_pair("en", "fr").unwrap_err();
        assert!(err.to_string().contains("en/fr"));

        assert!(validate_language_pair("zh", "xx").is_err());
    }

    #[test]
    fn test_validate_timeouts() {
        assert!(validate_timeouts(10, 2000, 3000).is_ok());
        assert!(validate_timeouts(0, 2000, 3000).is_err());
        assert!(validate_timeouts(10, 0, 3000).is_err());

        let err = validate_timeouts(10, 2000, 0).unwrap_err();
        assert!(err.to_string().contains("ENGINE_DRAIN_TIMEOUT_MS"));
    }
}
