use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Public base URL is set
/// - Readiness polling fits inside its budget
/// - Segmenting window is non-empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let streams = &config.streams;
    if streams.public_base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "streams.public_base_url cannot be empty".to_string(),
        ));
    }

    if streams.transcoder.binary.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "streams.transcoder.binary cannot be empty".to_string(),
        ));
    }

    let readiness = &streams.readiness;
    if readiness.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "streams.readiness.poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if readiness.poll_interval_ms >= readiness.timeout_ms {
        return Err(ConfigError::ValidationError(
            "streams.readiness.poll_interval_ms must be below timeout_ms".to_string(),
        ));
    }

    if streams.transcoder.segment_duration_secs == 0 || streams.transcoder.playlist_size == 0 {
        return Err(ConfigError::ValidationError(
            "streams.transcoder segment duration and playlist size must be positive".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_base_url_fails() {
        let mut config = Config::default();
        config.streams.public_base_url = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_poll_interval_bounds() {
        let mut config = Config::default();
        config.streams.readiness.poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());

        config.streams.readiness.poll_interval_ms = 30_000;
        config.streams.readiness.timeout_ms = 30_000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_window_fails() {
        let mut config = Config::default();
        config.streams.transcoder.playlist_size = 0;
        assert!(validate_config(&config).is_err());
    }
}
