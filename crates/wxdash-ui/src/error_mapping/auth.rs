use super::AppErrorExt;
use wxdash_auth::GatewayError;
use wxdash_core::{AppError, AuthError};

impl AppErrorExt for GatewayError {
    fn into_app_error(self) -> AppError {
        match self {
            GatewayError::NotConfigured => AppError::Auth(AuthError::NotConfigured),
            GatewayError::OAuth(s) => AppError::Auth(AuthError::OAuthFailed(s)),
            GatewayError::Storage(s) => AppError::Auth(AuthError::StorageError(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_errors_map_to_auth() {
        let e = GatewayError::OAuth("CSRF token mismatch".into()).into_app_error();
        assert_eq!(e.user_message(), "Login failed. Please try again.");
        assert!(e.to_string().contains("CSRF"));

        let e = GatewayError::NotConfigured.into_app_error();
        assert!(matches!(e, AppError::Auth(AuthError::NotConfigured)));
    }
}
