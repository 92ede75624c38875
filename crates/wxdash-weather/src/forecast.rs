//! Forecast backend client.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{Coordinates, DailyRecord, ForecastDataset, ForecastError};

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    data_day: DataDay,
}

#[derive(Debug, Deserialize)]
struct DataDay {
    time: Vec<String>,
    temperature_max: Vec<f64>,
}

impl DataDay {
    fn into_records(self) -> Result<Vec<DailyRecord>, ForecastError> {
        if self.time.len() != self.temperature_max.len() {
            return Err(ForecastError::LengthMismatch {
                dates: self.time.len(),
                temperatures: self.temperature_max.len(),
            });
        }

        self.time
            .iter()
            .zip(self.temperature_max)
            .map(|(time, temperature_max)| {
                let date = parse_day(time)?;
                Ok(DailyRecord {
                    date,
                    temperature_max,
                })
            })
            .collect()
    }
}

/// Accepts `2024-03-01` as well as a full timestamp such as `2024-03-01T00:00`.
fn parse_day(raw: &str) -> Result<NaiveDate, ForecastError> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| ForecastError::Parse(format!("date '{}': {}", raw, e)))
}

/// Bearer-authenticated forecast client. One attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Client,
    base_url: String,
}

impl ForecastClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ForecastError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the daily forecast for `location` at `coordinates`.
    #[instrument(skip(self, token), level = "info")]
    pub async fn fetch(
        &self,
        coordinates: Coordinates,
        location: &str,
        token: &str,
    ) -> Result<ForecastDataset, ForecastError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("LOCATION", location.to_string()),
            ])
            .bearer_auth(token)
            .send()
            .await?;

        let body: ForecastResponse = self.handle_response(response).await?;
        let days = body.data_day.into_records()?;

        tracing::info!("Fetched {} forecast days for {}", days.len(), location);
        Ok(ForecastDataset {
            location: location.to_string(),
            coordinates,
            days,
        })
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ForecastError> {
        let status = response.status();

        if status.is_success() {
            let text = response.text().await?;
            serde_json::from_str(&text).map_err(|e| ForecastError::Parse(e.to_string()))
        } else if status.as_u16() == 401 || status.as_u16() == 403 {
            Err(ForecastError::Unauthorized(status.as_u16()))
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(ForecastError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn leeds() -> Coordinates {
        Coordinates::resolve(53.8008, -1.5491).unwrap()
    }

    fn client_for(server: &MockServer) -> ForecastClient {
        ForecastClient::new(&format!("{}/weather", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_forecast() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("lat", "53.8008"))
            .and(query_param("lon", "-1.5491"))
            .and(query_param("LOCATION", "Leeds"))
            .and(header("Authorization", "Bearer test_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data_day": {
                    "time": ["2024-03-01", "2024-03-02"],
                    "temperature_max": [10.2, 11.7]
                }
            })))
            .mount(&server)
            .await;

        let dataset = client_for(&server)
            .fetch(leeds(), "Leeds", "test_token")
            .await
            .unwrap();

        assert_eq!(dataset.location, "Leeds");
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.days[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(dataset.days[1].temperature_max, 11.7);
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch(leeds(), "Leeds", "expired").await;
        assert!(matches!(result, Err(ForecastError::Unauthorized(401))));
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch(leeds(), "Leeds", "token").await;
        match result {
            Err(ForecastError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mismatched_series() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data_day": {
                    "time": ["2024-03-01", "2024-03-02"],
                    "temperature_max": [10.2]
                }
            })))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch(leeds(), "Leeds", "token").await;
        assert!(matches!(
            result,
            Err(ForecastError::LengthMismatch {
                dates: 2,
                temperatures: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_missing_data_day() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch(leeds(), "Leeds", "token").await;
        assert!(matches!(result, Err(ForecastError::Parse(_))));
    }

    #[test]
    fn test_parse_day_accepts_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_day("2024-03-01").unwrap(), expected);
        assert_eq!(parse_day("2024-03-01T00:00").unwrap(), expected);
        assert!(parse_day("yesterday").is_err());
    }
}
