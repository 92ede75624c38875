//! Centralized error types for wxdash.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling throughout the codebase
//! - Provides user-friendly messages suitable for display
//! - Preserves full error context for logging

use thiserror::Error;

/// Top-level application error type.
///
/// Every error that reaches the dashboard is converted to this type.
/// Use `user_message()` to get a display-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Auth(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The server is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Configuration errors raised while loading `config.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration file not found. Check the --config path.",
            ConfigError::Load(_) => "Configuration file could not be read. Check your settings.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
        }
    }
}

/// Authentication errors (OAuth, tokens, gateway state).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Token expired")]
    TokenExpired,

    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("Login is not configured")]
    NotConfigured,

    #[error("Token storage error: {0}")]
    StorageError(String),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::NotAuthenticated => "Not signed in. Please log in.",
            AuthError::TokenExpired => "Your session has expired. Please log in again.",
            AuthError::OAuthFailed(_) => "Login failed. Please try again.",
            AuthError::NotConfigured => "Login is not configured. Check the [auth] settings.",
            AuthError::StorageError(_) => "Failed to save credentials. Please try again.",
        }
    }
}

/// Weather pipeline errors, one per terminal failure kind.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Geocoding failed: {0}")]
    GeocodeFailed(String),

    #[error("Coordinates unresolved: {0}")]
    CoordinateUnresolved(String),

    #[error("Forecast fetch failed: {0}")]
    FetchFailed(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Unsupported location: {0}")]
    UnsupportedLocation(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::GeocodeFailed(_) => "Failed to get coordinates",
            WeatherError::CoordinateUnresolved(_) => "Failed to get coordinates",
            WeatherError::FetchFailed(_) => "Failed to load weather data",
            WeatherError::Timeout(_) => "The weather service took too long to respond",
            WeatherError::UnsupportedLocation(_) => "That location is not supported",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = vec![
            AppError::Config(ConfigError::Invalid("test".into())),
            AppError::Config(ConfigError::NotFound("/tmp/missing.toml".into())),
            AppError::Auth(AuthError::TokenExpired),
            AppError::Weather(WeatherError::GeocodeFailed("Leeds".into())),
            AppError::Weather(WeatherError::Timeout("geocode".into())),
            AppError::Io(std::io::Error::other("disk")),
            AppError::Other(anyhow::anyhow!("boom")),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "empty message for {err:?}");
        }
    }

    #[test]
    fn test_app_error_conversion() {
        let auth_err = AuthError::TokenExpired;
        let app_err: AppError = auth_err.into();
        assert!(matches!(app_err, AppError::Auth(AuthError::TokenExpired)));

        let app_err: AppError = ConfigError::Load("bad toml".into()).into();
        assert!(matches!(app_err, AppError::Config(ConfigError::Load(_))));

        let app_err: AppError = std::io::Error::other("no threads").into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_user_message_propagation() {
        let app_err = AppError::Weather(WeatherError::FetchFailed("500".into()));
        assert_eq!(app_err.user_message(), "Failed to load weather data");
    }

    #[test]
    fn test_server_error_message_depends_on_status() {
        let upstream = NetworkError::ServerError {
            status: 503,
            message: "unavailable".into(),
        };
        let client = NetworkError::ServerError {
            status: 404,
            message: "missing".into(),
        };
        assert_ne!(upstream.user_message(), client.user_message());
    }
}
