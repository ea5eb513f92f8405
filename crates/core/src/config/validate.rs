use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Polling loops have at least one attempt (stability needs two)
/// - Search oversampling is non-zero
/// - Subprocess timeouts are non-zero
/// - Server port is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Two equal observations are needed before a download counts as stable
    if config.stability.max_attempts < 2 {
        return Err(ConfigError::ValidationError(
            "stability.max_attempts must be at least 2".to_string(),
        ));
    }

    if config.lock_wait.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "lock_wait.max_attempts cannot be 0".to_string(),
        ));
    }

    if config.search.oversample_factor == 0 {
        return Err(ConfigError::ValidationError(
            "search.oversample_factor cannot be 0".to_string(),
        ));
    }

    if config.search.timeout_secs == 0
        || config.download.timeout_secs == 0
        || config.transcoder.timeout_secs == 0
    {
        return Err(ConfigError::ValidationError(
            "timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollConfig;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_single_stability_attempt_fails() {
        let mut config = Config::default();
        config.stability = PollConfig {
            max_attempts: 1,
            delay_ms: 0,
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_lock_attempts_fails() {
        let mut config = Config::default();
        config.lock_wait.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_oversample_fails() {
        let mut config = Config::default();
        config.search.oversample_factor = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.transcoder.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
