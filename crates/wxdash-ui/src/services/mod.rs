pub mod auth_service;
pub mod forecast_service;

pub use auth_service::{
    request_initialize as request_auth_initialize, request_login as request_auth_login,
    request_logout as request_auth_logout, AuthServiceMessage,
};
pub use forecast_service::{request_run as request_forecast_run, ForecastServiceMessage};
