//! Location-to-forecast pipeline: geocode, fetch, publish.
//!
//! Runs are serialised by generation. Starting a run cancels the one still in
//! flight, and a completion whose generation is no longer current is dropped
//! without touching state.

use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::forecast::ForecastClient;
use crate::geocode::GeocodeClient;
use crate::types::{
    CoordinateState, Coordinates, FailureKind, ForecastDataset, PipelineError, PipelineStatus,
    Session, Stage,
};

/// Point-in-time copy of the pipeline state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineSnapshot {
    pub generation: u64,
    pub status: PipelineStatus,
    pub location: Option<String>,
    pub coordinates: CoordinateState,
    pub dataset: Option<ForecastDataset>,
    pub failure: Option<FailureKind>,
}

/// How a single run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Ready(ForecastDataset),
    Failed(PipelineError),
    /// A newer run started (or the pipeline was reset) before this one finished.
    Superseded,
}

#[derive(Debug)]
pub struct RunReport {
    pub generation: u64,
    pub location: String,
    pub outcome: RunOutcome,
}

/// Handle for a run that has been started but not yet driven.
#[derive(Debug)]
pub struct RunTicket {
    generation: u64,
    location: String,
    cancel: CancellationToken,
}

impl RunTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

#[derive(Debug, Default)]
struct PipelineState {
    snapshot: PipelineSnapshot,
    in_flight: Option<CancellationToken>,
}

pub struct ForecastPipeline {
    geocoder: GeocodeClient,
    forecast: ForecastClient,
    timeout: Duration,
    state: Mutex<PipelineState>,
}

impl ForecastPipeline {
    /// `timeout` bounds each of the two network calls separately.
    pub fn new(geocoder: GeocodeClient, forecast: ForecastClient, timeout: Duration) -> Self {
        Self {
            geocoder,
            forecast,
            timeout,
            state: Mutex::new(PipelineState::default()),
        }
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.state.lock().snapshot.clone()
    }

    pub fn status(&self) -> PipelineStatus {
        self.state.lock().snapshot.status
    }

    /// Run geocode -> fetch for `location` with the given session.
    ///
    /// Status is `Loading` for the duration of the run and ends in exactly one
    /// of `Ready` or `Failed`, unless the run is superseded first.
    pub async fn run(&self, location: &str, session: &Session) -> RunReport {
        let ticket = self.start(location);
        self.drive(ticket, session).await
    }

    /// Begin a run without awaiting it.
    ///
    /// Bumps the generation, cancels the previous run and moves to `Loading`
    /// immediately, so a caller on a UI thread knows the generation before the
    /// network work is spawned.
    pub fn start(&self, location: &str) -> RunTicket {
        let (generation, cancel) = self.begin(location);
        tracing::info!(generation, location, "Forecast run started");
        RunTicket {
            generation,
            location: location.to_string(),
            cancel,
        }
    }

    /// Execute a started run to completion (or supersession).
    pub async fn drive(&self, ticket: RunTicket, session: &Session) -> RunReport {
        let RunTicket {
            generation,
            location,
            cancel,
        } = ticket;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.execute(generation, &location, session) => Some(result),
        };

        let outcome = match result {
            Some(result) => self.finish(generation, result),
            None => {
                tracing::debug!(generation, "Forecast run cancelled");
                RunOutcome::Superseded
            }
        };

        RunReport {
            generation,
            location,
            outcome,
        }
    }

    /// Cancel any in-flight run and return to `Idle` with no dataset.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        if let Some(token) = state.in_flight.take() {
            token.cancel();
        }
        let generation = state.snapshot.generation + 1;
        state.snapshot = PipelineSnapshot {
            generation,
            ..PipelineSnapshot::default()
        };
        tracing::info!(generation, "Forecast pipeline reset");
    }

    fn begin(&self, location: &str) -> (u64, CancellationToken) {
        let mut state = self.state.lock();
        if let Some(previous) = state.in_flight.take() {
            previous.cancel();
        }

        let token = CancellationToken::new();
        state.in_flight = Some(token.clone());

        let generation = state.snapshot.generation + 1;
        state.snapshot = PipelineSnapshot {
            generation,
            status: PipelineStatus::Loading,
            location: Some(location.to_string()),
            coordinates: CoordinateState::Unresolved,
            dataset: None,
            failure: None,
        };

        (generation, token)
    }

    async fn execute(
        &self,
        generation: u64,
        location: &str,
        session: &Session,
    ) -> Result<ForecastDataset, PipelineError> {
        let found = match tokio::time::timeout(self.timeout, self.geocoder.search(location)).await
        {
            Err(_) => return Err(PipelineError::Timeout(Stage::Geocode, self.timeout)),
            Ok(Err(e)) if e.is_timeout() => {
                return Err(PipelineError::Timeout(Stage::Geocode, self.timeout))
            }
            Ok(result) => result?,
        };

        let coordinates = Coordinates::resolve(found.latitude, found.longitude)
            .ok_or_else(|| PipelineError::CoordinateUnresolved(location.to_string()))?;
        self.store_coordinates(generation, coordinates);

        let fetch = self
            .forecast
            .fetch(coordinates, location, session.bearer_token());
        let dataset = match tokio::time::timeout(self.timeout, fetch).await {
            Err(_) => return Err(PipelineError::Timeout(Stage::Fetch, self.timeout)),
            Ok(Err(e)) if e.is_timeout() => {
                return Err(PipelineError::Timeout(Stage::Fetch, self.timeout))
            }
            Ok(result) => result?,
        };

        Ok(dataset)
    }

    fn store_coordinates(&self, generation: u64, coordinates: Coordinates) {
        let mut state = self.state.lock();
        if state.snapshot.generation == generation {
            state.snapshot.coordinates = CoordinateState::Resolved(coordinates);
        }
    }

    fn finish(
        &self,
        generation: u64,
        result: Result<ForecastDataset, PipelineError>,
    ) -> RunOutcome {
        let mut state = self.state.lock();
        if state.snapshot.generation != generation {
            tracing::debug!(
                generation,
                current = state.snapshot.generation,
                "Discarding superseded forecast result"
            );
            return RunOutcome::Superseded;
        }

        state.in_flight = None;
        match result {
            Ok(dataset) => {
                tracing::info!(generation, days = dataset.len(), "Forecast ready");
                state.snapshot.status = PipelineStatus::Ready;
                state.snapshot.dataset = Some(dataset.clone());
                state.snapshot.failure = None;
                RunOutcome::Ready(dataset)
            }
            Err(e) => {
                tracing::warn!(generation, "Forecast run failed: {}", e);
                state.snapshot.status = PipelineStatus::Failed;
                state.snapshot.dataset = None;
                state.snapshot.failure = Some(e.kind());
                RunOutcome::Failed(e)
            }
        }
    }
}
