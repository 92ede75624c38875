pub mod auth0;
pub mod gateway;
pub mod oauth;
pub mod storage;

pub use auth0::Auth0Auth;
pub use gateway::{Auth0Gateway, AuthGateway, GatewayError, StaticTokenGateway};
pub use oauth::{AuthorizationRequest, OAuth2Config, OAuth2Provider};
pub use storage::{SecureStorage, TokenSet};
