//! Forward geocoding: convert a place name to coordinates.
//! Uses Nominatim (OpenStreetMap) search - free, no API key required.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::GeocodeError;


#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

/// First match returned by the geocoder, not yet range-checked.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: Option<String>,
}

/// Geocoder client. One attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    client: Client,
    base_url: String,
    country: String,
}

impl GeocodeClient {
    pub fn new(
        base_url: &str,
        country: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            country: country.to_string(),
        })
    }

    /// Look up `place` and return the first match.
    #[instrument(skip(self), level = "info")]
    pub async fn search(&self, place: &str) -> Result<GeocodeMatch, GeocodeError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("city", place),
                ("country", self.country.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!("Geocode returned status {}", response.status());
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let places: Vec<NominatimPlace> =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Malformed(e.to_string()))?;

        let first = places
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NoResults(place.to_string()))?;

        let latitude = parse_degrees(&first.lat, "lat")?;
        let longitude = parse_degrees(&first.lon, "lon")?;

        tracing::info!("Geocoded {} to {}, {}", place, latitude, longitude);
        Ok(GeocodeMatch {
            latitude,
            longitude,
            display_name: first.display_name,
        })
    }
}

fn parse_degrees(raw: &str, field: &str) -> Result<f64, GeocodeError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| GeocodeError::Malformed(format!("{} '{}': {}", field, raw, e)))
}
