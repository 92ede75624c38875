//! Authentication gateway consumed by the dashboard.
//!
//! A gateway answers two questions for the view: is the user signed in, and
//! which bearer token should forecast requests carry. Login and logout are
//! asynchronous because the Auth0 flow round-trips through a browser.

use std::future::Future;

use parking_lot::RwLock;
use thiserror::Error;

use crate::auth0::Auth0Auth;
use crate::oauth::OAuth2Provider;
use crate::storage::{SecureStorage, TokenSet};

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication is not configured")]
    NotConfigured,

    #[error("Login failed: {0}")]
    OAuth(String),

    #[error("Token storage error: {0}")]
    Storage(String),
}

pub trait AuthGateway: Send + Sync + 'static {
    /// Restore any persisted session. Returns whether the user is signed in.
    fn initialize(&self) -> impl Future<Output = Result<bool, GatewayError>> + Send;

    /// Current bearer token, if signed in.
    fn access_token(&self) -> Option<String>;

    fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Interactive sign-in. Returns whether the user ended up signed in.
    fn login(&self) -> impl Future<Output = Result<bool, GatewayError>> + Send;

    fn logout(&self) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// Gateway backed by the Auth0 PKCE flow with on-disk token persistence.
pub struct Auth0Gateway {
    provider: Auth0Auth,
    storage: SecureStorage,
    return_to: String,
    open_logout_page: bool,
    token: RwLock<Option<TokenSet>>,
}

impl Auth0Gateway {
    pub fn new(provider: Auth0Auth, storage: SecureStorage) -> Self {
        let return_to = url::Url::parse(&provider.config().redirect_uri)
            .map(|u| u.origin().ascii_serialization())
            .unwrap_or_default();
        Self {
            provider,
            storage,
            return_to,
            open_logout_page: true,
            token: RwLock::new(None),
        }
    }

    /// Skip opening the provider logout page in the browser on `logout`.
    pub fn without_logout_page(mut self) -> Self {
        self.open_logout_page = false;
        self
    }

    pub fn logout_url(&self) -> String {
        self.provider.logout_url(&self.return_to)
    }
}

impl AuthGateway for Auth0Gateway {
    async fn initialize(&self) -> Result<bool, GatewayError> {
        let restored = match self.provider.get_token(&self.storage) {
            Some(token) if token.is_expired() => {
                tracing::info!("Stored Auth0 token has expired");
                self.provider
                    .sign_out(&self.storage)
                    .map_err(|e| GatewayError::Storage(e.to_string()))?;
                None
            }
            Some(token) => {
                if token.needs_refresh() {
                    tracing::warn!("Stored Auth0 token expires within five minutes");
                }
                Some(token)
            }
            None => None,
        };

        let signed_in = restored.is_some();
        *self.token.write() = restored;
        tracing::debug!(signed_in, "Auth0 gateway initialized");
        Ok(signed_in)
    }

    fn access_token(&self) -> Option<String> {
        self.token
            .read()
            .as_ref()
            .filter(|t| !t.is_expired())
            .map(|t| t.access_token.clone())
    }

    async fn login(&self) -> Result<bool, GatewayError> {
        let token = self
            .provider
            .authenticate(&self.storage)
            .await
            .map_err(|e| GatewayError::OAuth(format!("{:#}", e)))?;
        *self.token.write() = Some(token);
        Ok(true)
    }

    async fn logout(&self) -> Result<(), GatewayError> {
        *self.token.write() = None;
        self.provider
            .sign_out(&self.storage)
            .map_err(|e| GatewayError::Storage(e.to_string()))?;

        let logout_url = self.logout_url();
        if self.open_logout_page {
            if let Err(e) = webbrowser::open(&logout_url) {
                tracing::warn!("Failed to open Auth0 logout page: {}", e);
            }
        }
        tracing::info!("Signed out; Auth0 session ends at {}", logout_url);
        Ok(())
    }
}

/// Gateway around a pre-issued bearer token (config or environment).
pub struct StaticTokenGateway {
    token: String,
    signed_in: RwLock<bool>,
}

impl StaticTokenGateway {
    /// Signed in from the start.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            signed_in: RwLock::new(true),
        }
    }

    /// Holds a token but waits for `login` before exposing it.
    pub fn signed_out(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            signed_in: RwLock::new(false),
        }
    }
}

impl AuthGateway for StaticTokenGateway {
    async fn initialize(&self) -> Result<bool, GatewayError> {
        Ok(self.is_authenticated())
    }

    fn access_token(&self) -> Option<String> {
        (*self.signed_in.read() && !self.token.trim().is_empty()).then(|| self.token.clone())
    }

    async fn login(&self) -> Result<bool, GatewayError> {
        if self.token.trim().is_empty() {
            return Err(GatewayError::NotConfigured);
        }
        *self.signed_in.write() = true;
        Ok(true)
    }

    async fn logout(&self) -> Result<(), GatewayError> {
        *self.signed_in.write() = false;
        Ok(())
    }
}
