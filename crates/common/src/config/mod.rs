//! Configuration management for CiteBuddy
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{AppError, Result};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// ADS API client configuration
    #[serde(default)]
    pub ads: AdsConfig,

    /// Recommendation defaults and lookup policy
    #[serde(default)]
    pub recommender: RecommenderSettings,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdsConfig {
    /// API token; falls back to ADS_API_TOKEN / ADS_DEV_KEY
    pub api_token: Option<String>,

    /// API base URL
    #[serde(default = "default_ads_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_ads_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures
    #[serde(default = "default_ads_retries")]
    pub max_retries: u32,

    /// Client-side request budget
    #[serde(default = "default_ads_requests_per_minute")]
    pub requests_per_minute: u32,

    /// Maximum records returned per lookup
    #[serde(default = "default_ads_rows")]
    pub rows: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecommenderSettings {
    /// Number of recommendations when none is given
    #[serde(default = "default_num")]
    pub num: i64,

    /// Same-author similarity threshold when none is given
    #[serde(default = "default_ratio")]
    pub ratio: f64,

    /// Timeout applied to every single lookup, in seconds
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,

    /// Bound on in-flight lookups within one recommendation
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,

    /// What to do when a downstream lookup fails: "abort" or "skip"
    #[serde(default = "default_on_lookup_failure")]
    pub on_lookup_failure: String,
}

impl AdsConfig {
    /// Get ADS request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RecommenderSettings {
    /// Get per-lookup timeout as Duration
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_ads_base_url() -> String { "https://api.adsabs.harvard.edu/v1".to_string() }
fn default_ads_timeout() -> u64 { 20 }
fn default_ads_retries() -> u32 { 3 }
fn default_ads_requests_per_minute() -> u32 { 300 }
fn default_ads_rows() -> u32 { 10 }
fn default_num() -> i64 { 3 }
fn default_ratio() -> f64 { 0.5 }
fn default_lookup_timeout() -> u64 { 30 }
fn default_max_concurrent_lookups() -> usize { 8 }
fn default_on_lookup_failure() -> String { "abort".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_metrics_port() -> u16 { 0 }
fn default_service_name() -> String { "citebuddy".to_string() }

impl Default for AdsConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: default_ads_base_url(),
            timeout_secs: default_ads_timeout(),
            max_retries: default_ads_retries(),
            requests_per_minute: default_ads_requests_per_minute(),
            rows: default_ads_rows(),
        }
    }
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            num: default_num(),
            ratio: default_ratio(),
            lookup_timeout_secs: default_lookup_timeout(),
            max_concurrent_lookups: default_max_concurrent_lookups(),
            on_lookup_failure: default_on_lookup_failure(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__RECOMMENDER__RATIO=0.8
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        let mut config: Self = config.try_deserialize()?;
        config.apply_token_fallback();
        Ok(config)
    }

    /// Load from a specific configuration file
    pub fn from_file(path: &str) -> std::result::Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        let mut config: Self = config.try_deserialize()?;
        config.apply_token_fallback();
        Ok(config)
    }

    fn apply_token_fallback(&mut self) {
        if self.ads.api_token.is_none() {
            self.ads.api_token = std::env::var("ADS_API_TOKEN")
                .or_else(|_| std::env::var("ADS_DEV_KEY"))
                .ok()
                .filter(|token| !token.trim().is_empty());
        }
    }

    /// Reject settings no recommendation could run with
    pub fn validate(&self) -> Result<()> {
        if self.recommender.max_concurrent_lookups == 0 {
            return Err(AppError::Configuration {
                message: "recommender.max_concurrent_lookups must be at least 1".to_string(),
            });
        }
        if self.recommender.lookup_timeout_secs == 0 {
            return Err(AppError::Configuration {
                message: "recommender.lookup_timeout_secs must be at least 1".to_string(),
            });
        }
        if !matches!(self.recommender.on_lookup_failure.as_str(), "abort" | "skip") {
            return Err(AppError::Configuration {
                message: format!(
                    "recommender.on_lookup_failure must be \"abort\" or \"skip\", got {:?}",
                    self.recommender.on_lookup_failure
                ),
            });
        }
        if self.ads.requests_per_minute == 0 {
            return Err(AppError::Configuration {
                message: "ads.requests_per_minute must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ads: AdsConfig::default(),
            recommender: RecommenderSettings::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.recommender.num, 3);
        assert_eq!(config.recommender.ratio, 0.5);
        assert_eq!(config.ads.base_url, "https://api.adsabs.harvard.edu/v1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_failure_policy() {
        let mut config = AppConfig::default();
        config.recommender.on_lookup_failure = "ignore".to_string();
        assert!(matches!(config.validate(), Err(AppError::Configuration { .. })));
    }

    #[test]
    fn test_rejects_zero_fan_out() {
        let mut config = AppConfig::default();
        config.recommender.max_concurrent_lookups = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeouts() {
        let config = AppConfig::default();
        assert_eq!(config.recommender.lookup_timeout(), Duration::from_secs(30));
        assert_eq!(config.ads.timeout(), Duration::from_secs(20));
    }
}
