use super::AppErrorExt;
use wxdash_core::{AppError, AuthError, ReqwestErrorExt, WeatherError};
use wxdash_weather::{ForecastError, GeocodeError, PipelineError};

impl AppErrorExt for PipelineError {
    fn into_app_error(self) -> AppError {
        match self {
            PipelineError::Geocode(GeocodeError::Network(e)) => AppError::Weather(
                WeatherError::GeocodeFailed(e.into_network_error().to_string()),
            ),
            PipelineError::Geocode(e) => AppError::Weather(WeatherError::GeocodeFailed(e.to_string())),
            PipelineError::CoordinateUnresolved(location) => {
                AppError::Weather(WeatherError::CoordinateUnresolved(location))
            }
            // The backend rejected the bearer token
            PipelineError::Fetch(ForecastError::Unauthorized(_)) => {
                AppError::Auth(AuthError::TokenExpired)
            }
            PipelineError::Fetch(ForecastError::Network(e)) => AppError::Weather(
                WeatherError::FetchFailed(e.into_network_error().to_string()),
            ),
            PipelineError::Fetch(e) => AppError::Weather(WeatherError::FetchFailed(e.to_string())),
            e @ PipelineError::Timeout(..) => AppError::Weather(WeatherError::Timeout(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use wxdash_weather::Stage;

    #[test]
    fn geocode_failure_message() {
        let e = PipelineError::Geocode(GeocodeError::NoResults("Leeds".into())).into_app_error();
        assert_eq!(e.user_message(), "Failed to get coordinates");

        let e = PipelineError::CoordinateUnresolved("Leeds".into()).into_app_error();
        assert_eq!(e.user_message(), "Failed to get coordinates");
    }

    #[test]
    fn fetch_failure_message() {
        let e = PipelineError::Fetch(ForecastError::Status {
            status: 502,
            message: "Bad Gateway".into(),
        })
        .into_app_error();
        assert_eq!(e.user_message(), "Failed to load weather data");
        assert!(e.to_string().contains("502"));

        let e = PipelineError::Fetch(ForecastError::LengthMismatch {
            dates: 7,
            temperatures: 6,
        })
        .into_app_error();
        assert_eq!(e.user_message(), "Failed to load weather data");
    }

    #[test]
    fn unauthorized_asks_for_login() {
        let e = PipelineError::Fetch(ForecastError::Unauthorized(401)).into_app_error();
        assert!(matches!(e, AppError::Auth(AuthError::TokenExpired)));
    }

    #[test]
    fn timeout_keeps_stage() {
        let e = PipelineError::Timeout(Stage::Fetch, Duration::from_secs(10)).into_app_error();
        assert!(matches!(e, AppError::Weather(WeatherError::Timeout(_))));
        assert!(e.to_string().contains("forecast"));
    }
}
