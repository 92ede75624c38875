//! Forecast pipeline for wxdash
//!
//! Geocodes a selected place name with Nominatim, fetches its daily forecast
//! from the bearer-authenticated backend, and projects it into table rows.

pub mod types;
pub mod format;
pub mod forecast;
pub mod geocode;
pub mod location;
pub mod pipeline;

pub use types::*;
pub use format::{forecast_rows, format_date, parse_locale, ForecastRow};
pub use forecast::ForecastClient;
pub use geocode::{GeocodeClient, GeocodeMatch};
pub use location::LocationSet;
pub use pipeline::{ForecastPipeline, PipelineSnapshot, RunOutcome, RunReport, RunTicket};
