//! Forecast backend: drives pipeline runs off the UI thread.
//! Results are sent back via mpsc and picked up by `poll_channel`.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use tokio::runtime::Handle;
use wxdash_weather::{ForecastPipeline, RunReport, RunTicket, Session};

/// Messages sent from async operations back to the UI thread
#[derive(Debug)]
pub enum ForecastServiceMessage {
    /// A run finished, failed or was superseded
    RunDone(RunReport),
}

/// Drive a started run on the runtime.
/// Sends `RunDone` on the channel when complete.
pub fn request_run(
    tx: &Sender<ForecastServiceMessage>,
    runtime: &Handle,
    pipeline: Arc<ForecastPipeline>,
    ticket: RunTicket,
    session: Session,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let report = pipeline.drive(ticket, &session).await;
        if tx.send(ForecastServiceMessage::RunDone(report)).is_err() {
            tracing::debug!("Dashboard dropped before forecast run completed");
        }
    });
}
