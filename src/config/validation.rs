use crate::config::types::{
    Config, CrawlerConfig, DiscoveryConfig, LoginConfig, OutputConfig, SiteConfig,
};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_login_config(&config.login)?;
    validate_discovery_config(&config.discovery)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates site locations
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;
    validate_http_url("discovery-endpoint", &config.discovery_endpoint)?;
    validate_path("sign-in-path", &config.sign_in_path)?;
    validate_path("giveaway-path", &config.giveaway_path)?;
    validate_regex("kindle-url-pattern", &config.kindle_url_pattern)?;
    Ok(())
}

/// Validates sign-in form settings
fn validate_login_config(config: &LoginConfig) -> Result<(), ConfigError> {
    let pattern = validate_regex("login-url-pattern", &config.login_url_pattern)?;
    if pattern.captures_len() < 2 {
        return Err(ConfigError::InvalidPattern(format!(
            "login-url-pattern must contain a capture group, got '{}'",
            config.login_url_pattern
        )));
    }

    for (key, value) in [
        ("form-name", &config.form_name),
        ("username-field", &config.username_field),
        ("password-field", &config.password_field),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", key)));
        }
    }

    if config.failure_phrases.iter().any(|phrase| phrase.is_empty()) {
        return Err(ConfigError::Validation(
            "failure-phrases cannot contain an empty phrase".to_string(),
        ));
    }

    Ok(())
}

/// Validates listing query variables
fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.sort.is_empty() {
        return Err(ConfigError::Validation("sort cannot be empty".to_string()));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.limit == Some(0) {
        return Err(ConfigError::Validation(
            "limit must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be >= 1s, got request={}s connect={}s",
            config.request_timeout_secs, config.connect_timeout_secs
        )));
    }

    if config.max_concurrent_entries < 1 || config.max_concurrent_entries > 64 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-entries must be between 1 and 64, got {}",
            config.max_concurrent_entries
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.entry_log_path.is_empty() {
        return Err(ConfigError::Validation(
            "entry-log-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates an absolute http(s) URL
fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            key, value
        )));
    }

    Ok(())
}

/// Validates a site-relative path
fn validate_path(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{} must start with '/', got '{}'",
            key, value
        )));
    }
    Ok(())
}

/// Compiles a configured regex
fn validate_regex(key: &str, value: &str) -> Result<Regex, ConfigError> {
    Regex::new(value)
        .map_err(|e| ConfigError::InvalidPattern(format!("Invalid {} '{}': {}", key, value, e)))
}
