use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A resolved geographic position.
///
/// Only constructed through [`Coordinates::resolve`], so a value of this type
/// is always finite and in range. `0.0` is a legitimate latitude or longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Validate a raw pair, returning `None` if it cannot be a real position.
    pub fn resolve(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Coordinates for the current selection, with an explicit unresolved state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CoordinateState {
    #[default]
    Unresolved,
    Resolved(Coordinates),
}

impl CoordinateState {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Resolved(c) => Some(*c),
            Self::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// One row of the forecast: a calendar day and its maximum temperature in °C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub temperature_max: f64,
}

/// Forecast for one location, replaced wholesale on every successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDataset {
    pub location: String,
    pub coordinates: Coordinates,
    pub days: Vec<DailyRecord>,
}

impl ForecastDataset {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Pipeline status as seen by the view.
///
/// A dataset exists only in `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Per-run session context: a snapshot of the bearer token.
///
/// The pipeline never holds on to it past the run it was passed to.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
}

impl Session {
    /// Returns `None` for an empty or blank token.
    pub fn new(access_token: impl Into<String>) -> Option<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return None;
        }
        Some(Self { access_token })
    }

    pub fn bearer_token(&self) -> &str {
        &self.access_token
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Which network call a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Geocode,
    Fetch,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Geocode => write!(f, "geocode"),
            Stage::Fetch => write!(f, "forecast"),
        }
    }
}

/// Geocoder errors
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("No results for '{0}'")]
    NoResults(String),
    #[error("Geocoder returned status {0}")]
    Status(u16),
    #[error("Malformed geocoder response: {0}")]
    Malformed(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GeocodeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network(e) if e.is_timeout())
    }
}

/// Forecast backend errors
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("Unauthorized ({0})")]
    Unauthorized(u16),
    #[error("Forecast API error: {status} - {message}")]
    Status { status: u16, message: String },
    #[error("Malformed forecast payload: {0}")]
    Parse(String),
    #[error("Forecast has {dates} dates but {temperatures} temperatures")]
    LengthMismatch { dates: usize, temperatures: usize },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ForecastError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network(e) if e.is_timeout())
    }
}

/// Terminal failure of a single pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Geocoding failed: {0}")]
    Geocode(#[from] GeocodeError),
    #[error("Could not resolve usable coordinates for '{0}'")]
    CoordinateUnresolved(String),
    #[error("Forecast fetch failed: {0}")]
    Fetch(#[from] ForecastError),
    #[error("{0} request timed out after {1:?}")]
    Timeout(Stage, Duration),
}

/// Coarse classification of [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    GeocodeFailure,
    CoordinateUnresolved,
    FetchFailure,
    Timeout,
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Geocode(_) => FailureKind::GeocodeFailure,
            Self::CoordinateUnresolved(_) => FailureKind::CoordinateUnresolved,
            Self::Fetch(_) => FailureKind::FetchFailure,
            Self::Timeout(..) => FailureKind::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_accepts_zero() {
        let c = Coordinates::resolve(0.0, 0.0);
        assert_eq!(
            c,
            Some(Coordinates {
                latitude: 0.0,
                longitude: 0.0
            })
        );
    }

    #[test]
    fn test_resolve_rejects_out_of_range() {
        assert!(Coordinates::resolve(91.0, 0.0).is_none());
        assert!(Coordinates::resolve(0.0, -180.5).is_none());
        assert!(Coordinates::resolve(f64::NAN, 1.0).is_none());
        assert!(Coordinates::resolve(1.0, f64::INFINITY).is_none());
    }

    #[test]
    fn test_coordinate_state() {
        assert!(!CoordinateState::default().is_resolved());
        let leeds = Coordinates::resolve(53.8008, -1.5491);
        let state = leeds.map(CoordinateState::Resolved).unwrap_or_default();
        assert!(state.is_resolved());
        assert_eq!(state.coordinates(), leeds);
    }

    #[test]
    fn test_session_rejects_blank_token() {
        assert!(Session::new("").is_none());
        assert!(Session::new("  ").is_none());
        assert_eq!(Session::new("abc").map(|s| s.bearer_token().to_string()), Some("abc".into()));
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::new("secret-token");
        let debug = format!("{:?}", session);
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn test_failure_kinds() {
        let err = PipelineError::Geocode(GeocodeError::NoResults("Leeds".into()));
        assert_eq!(err.kind(), FailureKind::GeocodeFailure);

        let err = PipelineError::Fetch(ForecastError::Unauthorized(401));
        assert_eq!(err.kind(), FailureKind::FetchFailure);

        let err = PipelineError::Timeout(Stage::Fetch, Duration::from_secs(1));
        assert_eq!(err.kind(), FailureKind::Timeout);
        assert!(err.to_string().contains("forecast"));
    }
}
