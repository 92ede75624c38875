use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable holding a pre-issued bearer token.
pub const ACCESS_TOKEN_ENV: &str = "WXDASH_ACCESS_TOKEN";

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

    /// Get a user-friendly message summarizing all errors
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
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Geocoder and forecast backend endpoints
    pub services: ServiceConfig,

    /// Login settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Location list and display preferences
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Nominatim-compatible search endpoint
    pub geocoder_url: String,

    /// Country qualifier sent with every geocoding query
    #[serde(default = "default_geocoder_country")]
    pub geocoder_country: String,

    /// Forecast backend endpoint
    pub forecast_url: String,

    /// Per-request timeout for both the geocoder and the forecast backend
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// User-Agent sent to the geocoder (required by the Nominatim usage policy)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_geocoder_country() -> String {
    "united kingdom".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("wxdash/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            geocoder_url: "https://nominatim.openstreetmap.org/search".to_string(),
            geocoder_country: default_geocoder_country(),
            forecast_url: "https://weatherapp-3o2e.onrender.com/weather".to_string(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Auth0 login configuration.
///
/// When `domain`/`client_id` are placeholders, a static `access_token` (or the
/// `WXDASH_ACCESS_TOKEN` environment variable) is used instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Auth0 tenant domain, e.g. `example.eu.auth0.com`
    pub domain: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// API identifier the access token is issued for
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// Pre-issued bearer token (skips the browser login)
    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_redirect_uri() -> String {
    "http://localhost:8080/callback".to_string()
}

impl AuthConfig {
    /// Check if Auth0 credentials are configured (not placeholders)
    pub fn is_configured(&self) -> bool {
        !self.domain.is_empty()
            && !self.client_id.is_empty()
            && !self.domain.starts_with("YOUR_")
            && !self.client_id.starts_with("YOUR_")
    }

    /// Static token from config, falling back to `WXDASH_ACCESS_TOKEN`.
    pub fn static_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok())
            .filter(|t| !t.trim().is_empty())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            domain: "YOUR_AUTH0_DOMAIN".to_string(),
            client_id: "YOUR_AUTH0_CLIENT_ID".to_string(),
            client_secret: String::new(),
            audience: None,
            redirect_uri: default_redirect_uri(),
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Locations offered by the selector, in display order
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,

    /// Location selected at startup
    #[serde(default = "default_location")]
    pub default_location: String,

    /// Date locale such as `en_GB`; falls back to `LC_ALL`/`LANG`
    #[serde(default)]
    pub locale: Option<String>,
}

fn default_locations() -> Vec<String> {
    vec![
        "Leeds".to_string(),
        "London".to_string(),
        "Manchester".to_string(),
    ]
}

fn default_location() -> String {
    "Leeds".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            locations: default_locations(),
            default_location: default_location(),
            locale: None,
        }
    }
}

impl DashboardConfig {
    /// Locale name to format dates with.
    ///
    /// Strips any encoding suffix from the environment value (`en_GB.UTF-8` -> `en_GB`).
    pub fn effective_locale(&self) -> String {
        self.locale
            .clone()
            .or_else(|| std::env::var("LC_ALL").ok())
            .or_else(|| std::env::var("LANG").ok())
            .map(|l| l.split(['.', '@']).next().unwrap_or_default().to_string())
            .filter(|l| !l.is_empty() && l != "C" && l != "POSIX")
            .unwrap_or_else(|| "en_US".to_string())
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wxdash");

        Self {
            config_dir,
            services: ServiceConfig::default(),
            auth: AuthConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, creating it with defaults if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load `path` (or the per-user file when `None`) and validate it.
    ///
    /// An explicit path must exist; the per-user file is created with defaults.
    /// Validation errors fail the load; warnings are logged.
    pub fn load_validated(
        path: Option<&Path>,
    ) -> std::result::Result<(Self, ValidationResult), ConfigError> {
        let loaded = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.display().to_string()))
            }
            Some(path) => Self::load_from(path),
            None => Self::load(),
        };
        let config = loaded.map_err(|e| ConfigError::Load(format!("{:#}", e)))?;

        let validation = config.validate();
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(
            &self.services.geocoder_url,
            "services.geocoder_url",
            &mut result,
        );
        self.validate_url(
            &self.services.forecast_url,
            "services.forecast_url",
            &mut result,
        );

        if self.services.request_timeout_secs == 0 {
            result.add_error(
                "services.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        } else if self.services.request_timeout_secs > 300 {
            result.add_warning(
                "services.request_timeout_secs",
                "Request timeout is unusually long (>300s)",
            );
        }

        if self.dashboard.locations.is_empty() {
            result.add_error("dashboard.locations", "At least one location is required");
        } else if !self
            .dashboard
            .locations
            .iter()
            .any(|l| l.eq_ignore_ascii_case(&self.dashboard.default_location))
        {
            result.add_error(
                "dashboard.default_location",
                format!(
                    "'{}' is not one of dashboard.locations",
                    self.dashboard.default_location
                ),
            );
        }

        if self.auth.is_configured() {
            self.validate_url(&self.auth.redirect_uri, "auth.redirect_uri", &mut result);
        } else if self.auth.static_token().is_none() {
            result.add_warning(
                "auth",
                "Auth0 not configured and no access token set - forecasts cannot be loaded",
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
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

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("wxdash");

        Ok(config_dir.join("config.toml"))
    }
}
