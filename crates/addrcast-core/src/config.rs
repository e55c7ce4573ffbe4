use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "ADDRCAST_CONFIG";

/// Placeholders every geocode URL template must carry.
pub const GEOCODE_PLACEHOLDERS: [&str; 4] = ["{street}", "{city}", "{state}", "{zipcode}"];

/// Placeholders every points URL template must carry.
pub const POINTS_PLACEHOLDERS: [&str; 2] = ["{latitude}", "{longitude}"];

const MAX_REASONABLE_TTL_MINUTES: u64 = 24 * 60;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line summary of all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream geocoding and weather services
    pub upstream: UpstreamConfig,

    /// Forecast result cache
    pub cache: CacheConfig,

    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Outbound retry policy (disabled unless configured)
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Geocoder URL template with `{street}`, `{city}`, `{state}` and `{zipcode}`
    pub geocode_url: String,

    /// Weather points URL template with `{latitude}` and `{longitude}`
    pub points_url: String,

    /// Per-request transport timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Sent on every outbound request; the weather service rejects anonymous clients
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("addrcast/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Minutes a cached forecast stays live after being written
    pub ttl_minutes: u64,

    /// Maximum number of cached forecasts
    pub max_entries: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Extra attempts after the first one; 0 keeps single-attempt behavior
    #[serde(default)]
    pub max_retries: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    5000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Field name from serde's "missing field `name`" message.
fn missing_field(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")?
        .split('`')
        .next()
        .filter(|field| !field.is_empty())
}

impl Config {
    /// Parse configuration from TOML text.
    ///
    /// A missing required table or key is reported as `ConfigError::MissingSetting`
    /// with the key's name; any other problem is a `ConfigError::ParseError`.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| match missing_field(e.message()) {
            Some(field) => ConfigError::MissingSetting(field.to_string()),
            None => ConfigError::ParseError(e.to_string()),
        })
    }

    /// Load configuration from a file. There are no defaults for the upstream
    /// URLs or the cache policy, so a missing file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated(path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_template(
            &self.upstream.geocode_url,
            "upstream.geocode_url",
            &GEOCODE_PLACEHOLDERS,
            &mut result,
        );
        validate_template(
            &self.upstream.points_url,
            "upstream.points_url",
            &POINTS_PLACEHOLDERS,
            &mut result,
        );

        if self.upstream.request_timeout_secs == 0 {
            result.add_error(
                "upstream.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.upstream.user_agent.trim().is_empty() {
            result.add_error("upstream.user_agent", "User agent must not be empty");
        }

        if self.cache.ttl_minutes == 0 {
            result.add_error("cache.ttl_minutes", "Cache TTL must be greater than 0");
        } else if self.cache.ttl_minutes > MAX_REASONABLE_TTL_MINUTES {
            result.add_warning(
                "cache.ttl_minutes",
                "Cache TTL is more than 24 hours; forecasts will go stale",
            );
        }

        if self.cache.max_entries == 0 {
            result.add_error("cache.max_entries", "Cache size must be greater than 0");
        }

        if self.server.bind_addr.parse::<SocketAddr>().is_err() {
            result.add_error(
                "server.bind_addr",
                format!("Not a socket address: {}", self.server.bind_addr),
            );
        }

        if self.retry.max_retries > 0 {
            result.add_warning(
                "retry.max_retries",
                format!(
                    "Upstream retries enabled ({} extra attempts per request)",
                    self.retry.max_retries
                ),
            );
        }

        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            result.add_error(
                "retry.initial_delay_ms",
                "Initial retry delay exceeds the maximum delay",
            );
        }

        result
    }

    /// Resolve the config file path: `ADDRCAST_CONFIG` if set, otherwise
    /// `<config dir>/addrcast/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("addrcast");

        Ok(config_dir.join("config.toml"))
    }
}

/// Validate a URL template: every placeholder present, and the URL parses
/// with an http(s) scheme and a host once placeholders are filled in.
fn validate_template(
    template: &str,
    field_name: &str,
    placeholders: &[&str],
    result: &mut ValidationResult,
) {
    for placeholder in placeholders {
        if !template.contains(placeholder) {
            result.add_error(field_name, format!("Missing placeholder {}", placeholder));
        }
    }

    let filled = placeholders
        .iter()
        .fold(template.to_string(), |acc, p| acc.replace(p, "0"));

    match Url::parse(&filled) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID: &str = r#"
        [upstream]
        geocode_url = "https://geocoding.geo.census.gov/geocoder/locations/address?street={street}&city={city}&state={state}&zip={zipcode}&benchmark=Public_AR_Current&format=json"
        points_url = "https://api.weather.gov/points/{latitude},{longitude}"

        [cache]
        ttl_minutes = 30
        max_entries = 1000
    "#;

    fn valid_config() -> Config {
        Config::from_toml_str(VALID).unwrap()
    }

    #[test]
    fn test_valid_config_with_defaults() {
        let config = valid_config();
        let result = config.validate();
        assert!(result.is_valid(), "config should be valid: {:?}", result.errors);
        assert_eq!(config.upstream.request_timeout_secs, 10);
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.retry.max_retries, 0);
        assert!(config.upstream.user_agent.starts_with("addrcast/"));
    }

    #[test]
    fn test_shipped_example_is_valid() {
        let contents = include_str!("../../../config/addrcast.example.toml");
        let config = Config::from_toml_str(contents).unwrap();
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_missing_cache_section_fails_to_parse() {
        let contents = r#"
            [upstream]
            geocode_url = "https://example.com/?s={street}&c={city}&st={state}&z={zipcode}"
            points_url = "https://example.com/points/{latitude},{longitude}"
        "#;
        let err = Config::from_toml_str(contents).unwrap_err();
        assert!(
            matches!(&err, ConfigError::MissingSetting(name) if name == "cache"),
            "{:?}",
            err
        );
    }

    #[test]
    fn test_missing_ttl_fails_to_parse() {
        let contents = VALID.replace("ttl_minutes = 30", "");
        let err = Config::from_toml_str(&contents).unwrap_err();
        assert!(
            matches!(&err, ConfigError::MissingSetting(name) if name == "ttl_minutes"),
            "{:?}",
            err
        );
    }

    #[test]
    fn test_missing_points_url_is_missing_setting() {
        let contents = VALID
            .lines()
            .filter(|line| !line.trim_start().starts_with("points_url"))
            .collect::<Vec<_>>()
            .join("\n");
        let err = Config::from_toml_str(&contents).unwrap_err();
        assert!(
            matches!(&err, ConfigError::MissingSetting(name) if name == "points_url"),
            "{:?}",
            err
        );
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let contents = VALID.replace("ttl_minutes = 30", "ttl_minutes = \"thirty\"");
        let err = Config::from_toml_str(&contents).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)), "{:?}", err);
    }

    #[test]
    fn test_missing_field_extracts_name() {
        assert_eq!(missing_field("missing field `cache`"), Some("cache"));
        assert_eq!(missing_field("missing field `ttl_minutes`\n"), Some("ttl_minutes"));
        assert_eq!(missing_field("invalid type: string \"x\", expected u64"), None);
    }

    #[test]
    fn test_zero_cache_settings_are_errors() {
        let mut config = valid_config();
        config.cache.ttl_minutes = 0;
        config.cache.max_entries = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "cache.ttl_minutes"));
        assert!(result.errors.iter().any(|e| e.field == "cache.max_entries"));
    }

    #[test]
    fn test_long_ttl_is_warning() {
        let mut config = valid_config();
        config.cache.ttl_minutes = 3 * 24 * 60;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "cache.ttl_minutes"));
    }

    #[test]
    fn test_missing_placeholder() {
        let mut config = valid_config();
        config.upstream.points_url = "https://api.weather.gov/points/{latitude}".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result
            .errors
            .iter()
            .any(|e| e.field == "upstream.points_url" && e.message.contains("{longitude}")));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = valid_config();
        config.upstream.geocode_url =
            "ftp://example.com/?s={street}&c={city}&st={state}&z={zipcode}".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_invalid_bind_addr() {
        let mut config = valid_config();
        config.server.bind_addr = "localhost".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "server.bind_addr"));
    }

    #[test]
    fn test_retry_enabled_is_warning() {
        let mut config = valid_config();
        config.retry.max_retries = 2;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "retry.max_retries"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        assert_eq!(result.error_summary(), "field1: error1; field2: error2");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();

        let (config, validation) = Config::load_validated(file.path()).unwrap();
        assert!(validation.is_valid());
        assert_eq!(config.cache.max_entries, 1000);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_reports_missing_setting() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID.replace("max_entries = 1000", "").as_bytes())
            .unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingSetting(name)) if name == "max_entries"
        ));
    }

    #[test]
    fn test_load_validated_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID.replace("max_entries = 1000", "max_entries = 0").as_bytes())
            .unwrap();

        let err = Config::load_validated(file.path()).unwrap_err();
        assert!(err.to_string().contains("cache.max_entries"), "{}", err);
    }
}
