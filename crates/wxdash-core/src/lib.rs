pub mod config;
pub mod error;

pub use config::{AuthConfig, Config, DashboardConfig, ServiceConfig, ValidationResult};
pub use error::{AppError, AuthError, ConfigError, NetworkError, ReqwestErrorExt, WeatherError};

use anyhow::Result;

/// Initialize logging for the application.
///
/// Honours `RUST_LOG`; falls back to `info`. Logs go to stderr so they stay
/// out of the dashboard output. Safe to call more than once.
pub fn init() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    tracing::info!("wxdash core initialized");
    Ok(())
}
