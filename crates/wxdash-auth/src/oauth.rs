use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use tokio::sync::oneshot;
use url::Url;
use warp::Filter;

use crate::storage::{SecureStorage, TokenSet};

/// How long to wait for the browser to come back to the callback server.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// OAuth2 configuration
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// Client ID from OAuth provider
    pub client_id: String,

    /// Client secret; empty for public (PKCE-only) clients
    pub client_secret: String,

    /// Authorization endpoint URL
    pub auth_url: String,

    /// Token endpoint URL
    pub token_url: String,

    /// Redirect URI for OAuth callback
    pub redirect_uri: String,

    /// Scopes to request
    pub scopes: Vec<String>,

    /// Extra authorization parameters (e.g. Auth0 `audience`)
    pub extra_params: Vec<(String, String)>,
}

impl OAuth2Config {
    fn client(&self) -> Result<BasicClient> {
        let secret = (!self.client_secret.is_empty())
            .then(|| ClientSecret::new(self.client_secret.clone()));

        Ok(BasicClient::new(
            ClientId::new(self.client_id.clone()),
            secret,
            AuthUrl::new(self.auth_url.clone()).context("Invalid auth URL")?,
            Some(TokenUrl::new(self.token_url.clone()).context("Invalid token URL")?),
        )
        .set_auth_type(AuthType::RequestBody)
        .set_redirect_uri(
            RedirectUrl::new(self.redirect_uri.clone()).context("Invalid redirect URI")?,
        ))
    }

    /// Local address and path the callback server listens on.
    fn callback_endpoint(&self) -> Result<(SocketAddr, String)> {
        let url = Url::parse(&self.redirect_uri).context("Invalid redirect URI")?;
        let port = url.port_or_known_default().context("Redirect URI has no port")?;
        let path = url.path().trim_matches('/').to_string();
        if path.is_empty() {
            anyhow::bail!("Redirect URI must include a callback path");
        }
        Ok((SocketAddr::from(([127, 0, 0, 1], port)), path))
    }
}

/// Pending authorization: where to send the user and what to verify on return.
pub struct AuthorizationRequest {
    pub url: String,
    pub csrf_token: CsrfToken,
    pub pkce_verifier: PkceCodeVerifier,
}

/// OAuth2 provider trait
pub trait OAuth2Provider: Send + Sync {
    /// Get the service identifier (e.g., "auth0")
    fn service_id(&self) -> &str;

    /// Get the OAuth2 configuration
    fn config(&self) -> &OAuth2Config;

    /// Build the authorization URL with a fresh CSRF token and PKCE challenge
    fn authorize(&self) -> Result<AuthorizationRequest> {
        let config = self.config();
        let client = config.client()?;

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client.authorize_url(CsrfToken::new_random);

        for scope in &config.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }
        for (name, value) in &config.extra_params {
            auth_request = auth_request.add_extra_param(name.clone(), value.clone());
        }

        let (auth_url, csrf_token) = auth_request.set_pkce_challenge(pkce_challenge).url();

        Ok(AuthorizationRequest {
            url: auth_url.to_string(),
            csrf_token,
            pkce_verifier,
        })
    }

    /// Exchange an authorization code for tokens and persist them
    async fn exchange_code(
        &self,
        storage: &SecureStorage,
        code: String,
        pkce_verifier: PkceCodeVerifier,
    ) -> Result<TokenSet> {
        let client = self.config().client()?;

        let token_result = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(async_http_client)
            .await
            .context("Failed to exchange authorization code")?;

        let expires_in = token_result
            .expires_in()
            .map(|d| d.as_secs() as i64)
            .unwrap_or(3600); // Default 1 hour
        let expires_at = chrono::Utc::now().timestamp() + expires_in;

        let scopes = token_result
            .scopes()
            .map(|s| s.iter().map(|scope| scope.to_string()).collect())
            .unwrap_or_else(|| self.config().scopes.clone());

        let token_set = TokenSet {
            access_token: token_result.access_token().secret().clone(),
            refresh_token: token_result.refresh_token().map(|t| t.secret().clone()),
            expires_at,
            scopes,
        };

        storage.store_token(self.service_id(), &token_set)?;

        tracing::info!("OAuth2 flow completed for {}", self.service_id());
        Ok(token_set)
    }

    /// Perform full OAuth2 flow with browser and local callback server
    async fn authenticate(&self, storage: &SecureStorage) -> Result<TokenSet> {
        let request = self.authorize()?;
        let (addr, callback_path) = self.config().callback_endpoint()?;

        tracing::info!("Opening browser for {} login", self.service_id());
        tracing::debug!("Auth URL: {}", request.url);

        let (tx, rx) = oneshot::channel::<(String, String)>();
        let tx = Arc::new(tokio::sync::Mutex::new(Some(tx)));

        let routes = warp::get()
            .and(warp::path(callback_path))
            .and(warp::path::end())
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::any().map(move || tx.clone()))
            .and_then(
                |params: HashMap<String, String>,
                 tx: Arc<tokio::sync::Mutex<Option<oneshot::Sender<(String, String)>>>>| async move {
                    let code = params.get("code").cloned().unwrap_or_default();
                    let state = params.get("state").cloned().unwrap_or_default();

                    if let Some(sender) = tx.lock().await.take() {
                        let _ = sender.send((code, state));
                    }

                    Ok::<_, warp::Rejection>(warp::reply::html(
                        "<html><body><h1>Login complete</h1><p>You can close this window and return to wxdash.</p></body></html>",
                    ))
                },
            );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (_, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(addr, async {
                let _ = shutdown_rx.await;
            })
            .with_context(|| format!("Failed to bind OAuth callback on {}", addr))?;
        tokio::spawn(server);

        if let Err(e) = webbrowser::open(&request.url) {
            let _ = shutdown_tx.send(());
            return Err(e).context("Failed to open browser");
        }

        let callback = tokio::time::timeout(CALLBACK_TIMEOUT, rx).await;
        let _ = shutdown_tx.send(());

        let (code, state) = callback
            .context("Timed out waiting for OAuth callback")?
            .context("Failed to receive OAuth callback")?;

        if state != *request.csrf_token.secret() {
            anyhow::bail!("CSRF token mismatch");
        }
        if code.is_empty() {
            anyhow::bail!("OAuth callback did not include an authorization code");
        }

        self.exchange_code(storage, code, request.pkce_verifier).await
    }

    /// Stored token, or None if not authenticated
    fn get_token(&self, storage: &SecureStorage) -> Option<TokenSet> {
        storage.retrieve_token(self.service_id()).ok()
    }

    /// Check if authenticated and token is valid
    fn is_authenticated(&self, storage: &SecureStorage) -> bool {
        self.get_token(storage)
            .map(|token| !token.is_expired())
            .unwrap_or(false)
    }

    /// Sign out (delete stored token)
    fn sign_out(&self, storage: &SecureStorage) -> Result<()> {
        storage.delete_token(self.service_id())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    struct TestProvider {
        config: OAuth2Config,
    }

    impl OAuth2Provider for TestProvider {
        fn service_id(&self) -> &str {
            "test"
        }

        fn config(&self) -> &OAuth2Config {
            &self.config
        }
    }

    fn provider(redirect_uri: &str) -> TestProvider {
        TestProvider {
            config: OAuth2Config {
                client_id: "client".to_string(),
                client_secret: String::new(),
                auth_url: "https://login.example.com/authorize".to_string(),
                token_url: "https://login.example.com/oauth/token".to_string(),
                redirect_uri: redirect_uri.to_string(),
                scopes: vec!["openid".to_string(), "profile".to_string()],
                extra_params: vec![("audience".to_string(), "https://api.example.com".to_string())],
            },
        }
    }

    #[test]
    fn test_authorize_url_carries_pkce_and_params() {
        let request = provider("http://localhost:8080/callback").authorize().unwrap();
        let url = Url::parse(&request.url).unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(params.get("client_id").map(String::as_str), Some("client"));
        assert_eq!(params.get("code_challenge_method").map(String::as_str), Some("S256"));
        assert_eq!(
            params.get("audience").map(String::as_str),
            Some("https://api.example.com")
        );
        assert_eq!(params.get("scope").map(String::as_str), Some("openid profile"));
        assert_eq!(
            params.get("state").map(String::as_str),
            Some(request.csrf_token.secret().as_str())
        );
    }

    #[test]
    fn test_callback_endpoint_from_redirect_uri() {
        let (addr, path) = provider("http://localhost:9123/callback")
            .config()
            .callback_endpoint()
            .unwrap();
        assert_eq!(addr.port(), 9123);
        assert_eq!(path, "callback");
    }

    #[test]
    fn test_callback_endpoint_requires_path() {
        assert!(provider("http://localhost:9123/")
            .config()
            .callback_endpoint()
            .is_err());
    }

    #[test]
    fn test_token_state_uses_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SecureStorage::new(dir.path());
        let p = provider("http://localhost:8080/callback");

        assert!(!p.is_authenticated(&storage));

        let token = TokenSet {
            access_token: "abc".to_string(),
            refresh_token: None,
            expires_at: chrono::Utc::now().timestamp() + 600,
            scopes: vec![],
        };
        storage.store_token("test", &token).unwrap();
        assert!(p.is_authenticated(&storage));

        p.sign_out(&storage).unwrap();
        assert!(p.get_token(&storage).is_none());
    }
}
