use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Matcher ratio and cache eviction fraction are within (0, 1]
/// - Pool size, cache size, race deadline and comment limit are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let ratio = config.matcher.min_containment_ratio;
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "matcher.min_containment_ratio must be in (0, 1], got {}",
            ratio
        )));
    }

    let fraction = config.cache.eviction_fraction;
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "cache.eviction_fraction must be in (0, 1], got {}",
            fraction
        )));
    }

    if config.cache.max_size == 0 {
        return Err(ConfigError::ValidationError(
            "cache.max_size cannot be 0".to_string(),
        ));
    }

    if config.resolver.pool_size == 0 {
        return Err(ConfigError::ValidationError(
            "resolver.pool_size cannot be 0".to_string(),
        ));
    }

    if config.resolver.race_deadline_ms == 0 {
        return Err(ConfigError::ValidationError(
            "resolver.race_deadline_ms cannot be 0".to_string(),
        ));
    }

    if config.resolver.comment_limit == 0 {
        return Err(ConfigError::ValidationError(
            "resolver.comment_limit cannot be 0".to_string(),
        ));
    }

    Ok(())
}
