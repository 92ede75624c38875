//! Process-wide wiring: the tokio runtime and the services built from config.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use wxdash_auth::{
    Auth0Auth, Auth0Gateway, AuthGateway, GatewayError, SecureStorage, StaticTokenGateway,
};
use wxdash_core::{AppError, Config};
use wxdash_weather::{ForecastClient, ForecastPipeline, GeocodeClient, LocationSet};

// Static tokio runtime that lives for the duration of the application
static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

/// Initialize the tokio runtime (safe to call repeatedly)
pub fn init_runtime() -> std::io::Result<Handle> {
    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime.handle().clone());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("wxdash-tokio")
        .build()?;
    if RUNTIME.set(runtime).is_err() {
        tracing::debug!("Runtime initialized concurrently; using the existing one");
    }

    RUNTIME
        .get()
        .map(|r| r.handle().clone())
        .ok_or_else(|| std::io::Error::other("tokio runtime unavailable"))
}

/// Get the runtime handle (available after `init_runtime`)
pub fn get_runtime() -> Option<Handle> {
    RUNTIME.get().map(|r| r.handle().clone())
}

/// The gateway selected by configuration.
pub enum AppGateway {
    Auth0(Auth0Gateway),
    Static(StaticTokenGateway),
    /// Neither Auth0 nor a static token is configured.
    Unconfigured,
}

impl AppGateway {
    pub fn kind(&self) -> &'static str {
        match self {
            AppGateway::Auth0(_) => "auth0",
            AppGateway::Static(_) => "static token",
            AppGateway::Unconfigured => "none",
        }
    }
}

impl AuthGateway for AppGateway {
    async fn initialize(&self) -> Result<bool, GatewayError> {
        match self {
            AppGateway::Auth0(g) => g.initialize().await,
            AppGateway::Static(g) => g.initialize().await,
            AppGateway::Unconfigured => Ok(false),
        }
    }

    fn access_token(&self) -> Option<String> {
        match self {
            AppGateway::Auth0(g) => g.access_token(),
            AppGateway::Static(g) => g.access_token(),
            AppGateway::Unconfigured => None,
        }
    }

    async fn login(&self) -> Result<bool, GatewayError> {
        match self {
            AppGateway::Auth0(g) => g.login().await,
            AppGateway::Static(g) => g.login().await,
            AppGateway::Unconfigured => Err(GatewayError::NotConfigured),
        }
    }

    async fn logout(&self) -> Result<(), GatewayError> {
        match self {
            AppGateway::Auth0(g) => g.logout().await,
            AppGateway::Static(g) => g.logout().await,
            AppGateway::Unconfigured => Ok(()),
        }
    }
}

/// Pick a gateway: a static token wins, then Auth0, else unconfigured.
pub fn build_gateway(config: &Config) -> Result<AppGateway> {
    if let Some(token) = config.auth.static_token() {
        tracing::info!("Using static access token gateway");
        return Ok(AppGateway::Static(StaticTokenGateway::new(token)));
    }

    if config.auth.is_configured() {
        let provider = Auth0Auth::new(
            &config.auth.domain,
            config.auth.client_id.clone(),
            config.auth.client_secret.clone(),
            config.auth.audience.clone(),
            config.auth.redirect_uri.clone(),
        );
        let storage = SecureStorage::new(config.config_dir.join("tokens"));
        tracing::info!("Using Auth0 gateway for {}", provider.domain());
        return Ok(AppGateway::Auth0(Auth0Gateway::new(provider, storage)));
    }

    tracing::warn!("No authentication configured; forecasts cannot be loaded");
    Ok(AppGateway::Unconfigured)
}

pub fn build_pipeline(config: &Config) -> Result<ForecastPipeline> {
    let timeout = Duration::from_secs(config.services.request_timeout_secs);

    let geocoder = GeocodeClient::new(
        &config.services.geocoder_url,
        &config.services.geocoder_country,
        &config.services.user_agent,
        timeout,
    )
    .context("Failed to create geocoder client")?;

    let forecast = ForecastClient::new(&config.services.forecast_url, timeout)
        .context("Failed to create forecast client")?;

    Ok(ForecastPipeline::new(geocoder, forecast, timeout))
}

/// Everything a dashboard model needs, built once at startup.
pub struct DashboardServices<G: AuthGateway> {
    pub gateway: Arc<G>,
    pub pipeline: Arc<ForecastPipeline>,
    pub locations: LocationSet,
    pub runtime: Handle,
}

impl<G: AuthGateway> Clone for DashboardServices<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            pipeline: self.pipeline.clone(),
            locations: self.locations.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

/// Initialize runtime, gateway and pipeline from config
pub fn initialize_dashboard_services(
    config: &Config,
) -> std::result::Result<DashboardServices<AppGateway>, AppError> {
    let runtime = init_runtime()?;
    let gateway = build_gateway(config)?;
    let pipeline = build_pipeline(config)?;

    tracing::info!(
        gateway = gateway.kind(),
        forecast_url = %config.services.forecast_url,
        "Dashboard services initialized"
    );

    Ok(DashboardServices {
        gateway: Arc::new(gateway),
        pipeline: Arc::new(pipeline),
        locations: LocationSet::new(config.dashboard.locations.iter().cloned()),
        runtime,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn test_static_token_takes_precedence() {
        let mut config = Config::default();
        config.auth.domain = "tenant.auth0.com".to_string();
        config.auth.client_id = "client".to_string();
        config.auth.access_token = Some("abc".to_string());

        let gateway = build_gateway(&config).unwrap();
        assert_eq!(gateway.kind(), "static token");
        assert_eq!(gateway.access_token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_auth0_when_configured() {
        let mut config = Config::default();
        config.auth.domain = "tenant.auth0.com".to_string();
        config.auth.client_id = "client".to_string();
        // Blank tokens are ignored
        config.auth.access_token = Some("   ".to_string());

        let gateway = build_gateway(&config).unwrap();
        assert_eq!(gateway.kind(), "auth0");
        assert!(gateway.access_token().is_none());
    }

    #[test]
    fn test_unconfigured_gateway_refuses_login() {
        let gateway = AppGateway::Unconfigured;
        let runtime = init_runtime().unwrap();
        assert!(!runtime.block_on(gateway.initialize()).unwrap());
        assert!(matches!(
            runtime.block_on(gateway.login()),
            Err(GatewayError::NotConfigured)
        ));
    }

    #[test]
    fn test_init_runtime_is_idempotent() {
        init_runtime().unwrap();
        init_runtime().unwrap();
        assert!(get_runtime().is_some());
    }
}
