use crate::config::types::{Config, HttpConfig, SourceConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_source_config("portal-dos-fretes", &config.sources.portal_dos_fretes)?;
    validate_source_config("cargas", &config.sources.cargas)?;
    validate_source_config("guia-do-transporte", &config.sources.guia_do_transporte)?;
    Ok(())
}

/// Validates HTTP configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.listing_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "listing-timeout-secs must be >= 1, got {}",
            config.listing_timeout_secs
        )));
    }

    if config.detail_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "detail-timeout-secs must be >= 1, got {}",
            config.detail_timeout_secs
        )));
    }

    if config.retry_attempts < 1 || config.retry_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "retry-attempts must be between 1 and 10, got {}",
            config.retry_attempts
        )));
    }

    Ok(())
}

/// Validates one `[sources.*]` table
fn validate_source_config(name: &str, config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url for {}: {}", name, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url for {} must use http or https, got '{}'",
            name, config.base_url
        )));
    }

    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers for {} must be between 1 and 64, got {}",
            name, config.workers
        )));
    }

    if config.politeness_delay_ms > 10_000 {
        return Err(ConfigError::Validation(format!(
            "politeness-delay-ms for {} must be <= 10000ms, got {}ms",
            name, config.politeness_delay_ms
        )));
    }

    if config.name_fallback.is_empty() {
        return Err(ConfigError::Validation(format!(
            "name-fallback for {} cannot be empty",
            name
        )));
    }

    let mut seen = HashSet::new();
    for source in &config.name_fallback {
        if !seen.insert(source) {
            return Err(ConfigError::Validation(format!(
                "name-fallback for {} lists {:?} more than once",
                name, source
            )));
        }
    }

    Ok(())
}
