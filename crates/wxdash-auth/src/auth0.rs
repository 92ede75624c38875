//! Auth0 identity provider.

use crate::oauth::{OAuth2Config, OAuth2Provider};

const DEFAULT_SCOPES: [&str; 3] = ["openid", "profile", "email"];

/// Auth0 OAuth2 provider for a single tenant domain.
pub struct Auth0Auth {
    domain: String,
    config: OAuth2Config,
}

impl Auth0Auth {
    /// `domain` is the bare tenant host, e.g. `example.eu.auth0.com`.
    pub fn new(
        domain: &str,
        client_id: String,
        client_secret: String,
        audience: Option<String>,
        redirect_uri: String,
    ) -> Self {
        let domain = domain
            .trim()
            .trim_start_matches("https://")
            .trim_end_matches('/')
            .to_string();

        let extra_params = audience
            .filter(|a| !a.trim().is_empty())
            .map(|a| vec![("audience".to_string(), a)])
            .unwrap_or_default();

        Self {
            config: OAuth2Config {
                client_id,
                client_secret,
                auth_url: format!("https://{}/authorize", domain),
                token_url: format!("https://{}/oauth/token", domain),
                redirect_uri,
                scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
                extra_params,
            },
            domain,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Tenant logout endpoint; the browser returns to `return_to` afterwards.
    pub fn logout_url(&self, return_to: &str) -> String {
        format!(
            "https://{}/v2/logout?client_id={}&returnTo={}",
            self.domain,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(return_to),
        )
    }
}

impl OAuth2Provider for Auth0Auth {
    fn service_id(&self) -> &str {
        "auth0"
    }

    fn config(&self) -> &OAuth2Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn auth(audience: Option<&str>) -> Auth0Auth {
        Auth0Auth::new(
            "https://tenant.eu.auth0.com/",
            "client123".to_string(),
            String::new(),
            audience.map(str::to_string),
            "http://localhost:8080/callback".to_string(),
        )
    }

    #[test]
    fn test_auth0_endpoints() {
        let provider = auth(None);
        assert_eq!(provider.service_id(), "auth0");
        assert_eq!(provider.domain(), "tenant.eu.auth0.com");
        assert_eq!(provider.config().auth_url, "https://tenant.eu.auth0.com/authorize");
        assert_eq!(provider.config().token_url, "https://tenant.eu.auth0.com/oauth/token");
        assert_eq!(provider.config().scopes, vec!["openid", "profile", "email"]);
        assert!(provider.config().extra_params.is_empty());
    }

    #[test]
    fn test_audience_becomes_extra_param() {
        let with_audience = auth(Some("https://weather.example.com"));
        assert_eq!(
            with_audience.config().extra_params,
            vec![("audience".to_string(), "https://weather.example.com".to_string())]
        );
        assert!(auth(Some("  ")).config().extra_params.is_empty());
    }

    #[test]
    fn test_logout_url_is_encoded() {
        let url = auth(None).logout_url("http://localhost:8080/");
        assert_eq!(
            url,
            "https://tenant.eu.auth0.com/v2/logout?client_id=client123&returnTo=http%3A%2F%2Flocalhost%3A8080%2F"
        );
    }
}
