//! Dashboard view-model.
//!
//! Owns the user's location selection and the rendered forecast rows, and
//! decides when the pipeline runs:
//! - once after the session is restored, if already signed in
//! - on every change of location while signed in
//! - on a signed-out -> signed-in transition
//! - never while signed out, or once a sign-out has been requested
//!
//! A backend that rejects the bearer token ends the session in the view.
//!
//! Async work reports back over channels; the front-end calls
//! [`DashboardModel::poll_channel`] from its own thread and then drains
//! [`DashboardModel::take_signals`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use chrono::Locale;
use tokio::runtime::Handle;
use wxdash_auth::AuthGateway;
use wxdash_core::{AppError, AuthError, WeatherError};
use wxdash_weather::{
    forecast_rows, ForecastPipeline, ForecastRow, LocationSet, PipelineStatus, RunOutcome,
    RunReport, Session,
};

use crate::bridge::DashboardServices;
use crate::error_mapping::AppErrorExt;
use crate::services::{
    request_auth_initialize, request_auth_login, request_auth_logout, request_forecast_run,
    AuthServiceMessage, ForecastServiceMessage,
};

/// Change notifications for the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardSignal {
    /// Session restored or changed; carries the signed-in flag
    SessionChanged(bool),
    SelectionChanged(String),
    LoadingChanged(bool),
    /// Rows, header or status changed
    ForecastChanged,
    /// One user-facing message
    Notification(String),
}

pub struct DashboardModel<G: AuthGateway> {
    gateway: Arc<G>,
    pipeline: Arc<ForecastPipeline>,
    runtime: Handle,
    locations: LocationSet,
    locale: Locale,

    selection: String,
    authenticated: bool,
    initialized: bool,
    auth_busy: bool,
    signing_out: bool,

    // Generation of the run whose result the view is waiting for
    awaiting: Option<u64>,
    status: PipelineStatus,
    rows: Vec<ForecastRow>,
    forecast_location: Option<String>,

    signals: Vec<DashboardSignal>,
    forecast_tx: Sender<ForecastServiceMessage>,
    forecast_rx: Receiver<ForecastServiceMessage>,
    auth_tx: Sender<AuthServiceMessage>,
    auth_rx: Receiver<AuthServiceMessage>,
}

impl<G: AuthGateway> DashboardModel<G> {
    /// `initial_location` falls back to the first supported location when unknown.
    pub fn new(services: DashboardServices<G>, initial_location: &str, locale: Locale) -> Self {
        let selection = match services.locations.find(initial_location) {
            Some(name) => name.to_string(),
            None => {
                let fallback = services.locations.first().unwrap_or_default().to_string();
                tracing::warn!(
                    "Location '{}' is not supported, starting with '{}'",
                    initial_location,
                    fallback
                );
                fallback
            }
        };

        let (forecast_tx, forecast_rx) = mpsc::channel();
        let (auth_tx, auth_rx) = mpsc::channel();

        Self {
            gateway: services.gateway,
            pipeline: services.pipeline,
            runtime: services.runtime,
            locations: services.locations,
            locale,
            selection,
            authenticated: false,
            initialized: false,
            auth_busy: false,
            signing_out: false,
            awaiting: None,
            status: PipelineStatus::Idle,
            rows: Vec::new(),
            forecast_location: None,
            signals: Vec::new(),
            forecast_tx,
            forecast_rx,
            auth_tx,
            auth_rx,
        }
    }

    // ---- state accessors ----

    pub fn selection(&self) -> &str {
        &self.selection
    }

    pub fn locations(&self) -> &[String] {
        self.locations.names()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_loading(&self) -> bool {
        self.status == PipelineStatus::Loading
    }

    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// `7-Day Weather Forecast (<location>)` once a forecast is shown.
    pub fn header(&self) -> Option<String> {
        self.forecast_location
            .as_ref()
            .map(|location| format!("7-Day Weather Forecast ({})", location))
    }

    /// Signals raised since the last call, oldest first.
    pub fn take_signals(&mut self) -> Vec<DashboardSignal> {
        std::mem::take(&mut self.signals)
    }

    // ---- user intent ----

    /// Restore the persisted session. Call once when the dashboard is shown.
    pub fn mount(&mut self) {
        if self.initialized || self.auth_busy {
            return;
        }
        self.auth_busy = true;
        request_auth_initialize(&self.auth_tx, &self.runtime, self.gateway.clone());
    }

    /// Record a new selection; re-runs when signed in and the value changed.
    pub fn select_location(&mut self, name: &str) {
        let canonical = match self.locations.find(name) {
            Some(n) => n.to_string(),
            None => {
                tracing::warn!("Rejected unsupported location '{}'", name);
                self.notify(AppError::Weather(WeatherError::UnsupportedLocation(
                    name.to_string(),
                )));
                return;
            }
        };

        if canonical == self.selection {
            return;
        }

        tracing::info!("Location changed to {}", canonical);
        self.selection = canonical.clone();
        self.signals.push(DashboardSignal::SelectionChanged(canonical));

        if self.signed_in() {
            self.start_run();
        }
    }

    pub fn login(&mut self) {
        if self.auth_busy {
            return;
        }
        if self.authenticated {
            tracing::debug!("Login requested while already signed in");
            return;
        }
        self.auth_busy = true;
        request_auth_login(&self.auth_tx, &self.runtime, self.gateway.clone());
    }

    pub fn logout(&mut self) {
        if self.auth_busy {
            return;
        }
        self.auth_busy = true;
        self.signing_out = true;
        // Stop any in-flight run right away; the gateway call may take a moment
        self.awaiting = None;
        self.pipeline.reset();
        request_auth_logout(&self.auth_tx, &self.runtime, self.gateway.clone());
    }

    /// Re-run for the current selection.
    pub fn refresh(&mut self) {
        if !self.signed_in() {
            self.notify(AppError::Auth(AuthError::NotAuthenticated));
            return;
        }
        self.start_run();
    }

    // ---- async results ----

    /// Apply every pending service message. Returns whether anything arrived.
    pub fn poll_channel(&mut self) -> bool {
        let mut handled = false;

        while let Ok(msg) = self.auth_rx.try_recv() {
            handled = true;
            self.handle_auth_message(msg);
        }
        while let Ok(msg) = self.forecast_rx.try_recv() {
            handled = true;
            match msg {
                ForecastServiceMessage::RunDone(report) => self.handle_run_report(report),
            }
        }

        handled
    }

    fn handle_auth_message(&mut self, msg: AuthServiceMessage) {
        self.auth_busy = false;

        match msg {
            AuthServiceMessage::InitializeDone(result) => {
                self.initialized = true;
                let signed_in = match result {
                    Ok(signed_in) => signed_in,
                    Err(e) => {
                        tracing::error!("Session restore failed: {}", e);
                        self.notify(e.into_app_error());
                        false
                    }
                };
                // Always announce once after initialization so the view can refresh
                self.signals.push(DashboardSignal::SessionChanged(signed_in));
                self.apply_session(signed_in);
            }
            AuthServiceMessage::LoginDone(Ok(signed_in)) => {
                if signed_in != self.authenticated {
                    self.signals.push(DashboardSignal::SessionChanged(signed_in));
                }
                self.apply_session(signed_in);
            }
            AuthServiceMessage::LoginDone(Err(e)) => {
                tracing::error!("Login failed: {}", e);
                self.notify(e.into_app_error());
            }
            AuthServiceMessage::LogoutDone(result) => {
                self.signing_out = false;
                self.awaiting = None;
                self.pipeline.reset();
                if let Err(e) = result {
                    tracing::error!("Logout failed: {}", e);
                    self.notify(e.into_app_error());
                }
                let was_authenticated = self.authenticated;
                self.authenticated = false;
                self.clear_forecast(PipelineStatus::Idle);
                if was_authenticated {
                    self.signals.push(DashboardSignal::SessionChanged(false));
                }
            }
        }
    }

    /// Record the session flag, running on a signed-out -> signed-in edge.
    fn apply_session(&mut self, signed_in: bool) {
        let was_authenticated = self.authenticated;
        self.authenticated = signed_in;

        if signed_in && !was_authenticated {
            self.start_run();
        }
    }

    /// Signed in with no sign-out pending.
    fn signed_in(&self) -> bool {
        self.authenticated && !self.signing_out
    }

    /// Drop to signed out after the gateway or backend stopped accepting the token.
    fn end_session(&mut self) {
        if self.authenticated {
            tracing::info!("Session ended; sign in again to load forecasts");
            self.authenticated = false;
            self.signals.push(DashboardSignal::SessionChanged(false));
        }
    }

    fn start_run(&mut self) {
        if self.signing_out {
            tracing::debug!("Sign-out pending; not starting a forecast run");
            return;
        }

        let session = match self.gateway.access_token().and_then(Session::new) {
            Some(session) => session,
            None => {
                tracing::warn!("No usable access token; not starting a forecast run");
                self.notify(AppError::Auth(AuthError::NotAuthenticated));
                self.end_session();
                return;
            }
        };

        let ticket = self.pipeline.start(&self.selection);
        self.awaiting = Some(ticket.generation());
        self.clear_forecast(PipelineStatus::Loading);

        request_forecast_run(
            &self.forecast_tx,
            &self.runtime,
            self.pipeline.clone(),
            ticket,
            session,
        );
    }

    fn handle_run_report(&mut self, report: RunReport) {
        if self.awaiting != Some(report.generation) {
            tracing::debug!(generation = report.generation, "Ignoring stale forecast report");
            return;
        }

        match report.outcome {
            RunOutcome::Superseded => {
                tracing::debug!(generation = report.generation, "Forecast run superseded");
            }
            RunOutcome::Ready(dataset) => {
                self.awaiting = None;
                self.rows = forecast_rows(&dataset, self.locale);
                self.forecast_location = Some(dataset.location);
                self.set_status(PipelineStatus::Ready);
                self.signals.push(DashboardSignal::ForecastChanged);
            }
            RunOutcome::Failed(e) => {
                self.awaiting = None;
                self.clear_forecast(PipelineStatus::Failed);
                let error = e.into_app_error();
                if matches!(error, AppError::Auth(AuthError::TokenExpired)) {
                    self.end_session();
                }
                self.notify(error);
            }
        }
    }

    fn clear_forecast(&mut self, status: PipelineStatus) {
        self.rows.clear();
        self.forecast_location = None;
        self.set_status(status);
        self.signals.push(DashboardSignal::ForecastChanged);
    }

    fn set_status(&mut self, status: PipelineStatus) {
        let was_loading = self.is_loading();
        self.status = status;
        if was_loading != self.is_loading() {
            self.signals
                .push(DashboardSignal::LoadingChanged(self.is_loading()));
        }
    }

    fn notify(&mut self, error: AppError) {
        tracing::debug!("Notifying user: {}", error);
        self.signals
            .push(DashboardSignal::Notification(error.user_message().to_string()));
    }
}
