// Poller - Periodic fetch cycle owning the dashboard state
use crate::application::glucose_source::GlucoseSource;
use crate::domain::reading::{NormalizedReading, RawSeriesPoint};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Shown for every failed cycle, whatever the cause
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch glucose data. Please try again later.";

/// Data from one successful cycle
#[derive(Debug, Clone, PartialEq)]
pub struct GlucoseSnapshot {
    pub reading: NormalizedReading,
    pub series: Vec<RawSeriesPoint>,
    pub fetched_at: DateTime<Utc>,
}

/// Dashboard state machine.
///
/// `Idle` with an error means no cycle has succeeded yet, `Ready` with an
/// error means the last cycle failed and the previous snapshot is still shown.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Idle { error: Option<String> },
    Loading { previous: Option<GlucoseSnapshot> },
    Ready { snapshot: GlucoseSnapshot, error: Option<String> },
}

impl Default for PollState {
    fn default() -> Self {
        PollState::Idle { error: None }
    }
}

impl PollState {
    /// Enter `Loading`, clearing any error and keeping the last snapshot
    pub fn begin_cycle(self) -> Self {
        PollState::Loading {
            previous: self.into_snapshot(),
        }
    }

    pub fn complete(self, snapshot: GlucoseSnapshot) -> Self {
        PollState::Ready {
            snapshot,
            error: None,
        }
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        let error = Some(message.into());
        match self.into_snapshot() {
            Some(snapshot) => PollState::Ready { snapshot, error },
            None => PollState::Idle { error },
        }
    }

    pub fn snapshot(&self) -> Option<&GlucoseSnapshot> {
        match self {
            PollState::Idle { .. } => None,
            PollState::Loading { previous } => previous.as_ref(),
            PollState::Ready { snapshot, .. } => Some(snapshot),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PollState::Idle { error } | PollState::Ready { error, .. } => error.as_deref(),
            PollState::Loading { .. } => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PollState::Loading { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            PollState::Idle { .. } => "idle",
            PollState::Loading { .. } => "loading",
            PollState::Ready { .. } => "ready",
        }
    }

    fn into_snapshot(self) -> Option<GlucoseSnapshot> {
        match self {
            PollState::Idle { .. } => None,
            PollState::Loading { previous } => previous,
            PollState::Ready { snapshot, .. } => Some(snapshot),
        }
    }
}

pub struct Poller {
    source: Arc<dyn GlucoseSource>,
    state: watch::Sender<PollState>,
}

impl Poller {
    pub fn new(source: Arc<dyn GlucoseSource>) -> Self {
        let (state, _) = watch::channel(PollState::default());
        Self { source, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    /// Run one fetch cycle: Loading, then Ready or an error state
    pub async fn run_cycle(&self) {
        self.state
            .send_modify(|state| *state = std::mem::take(state).begin_cycle());
        tracing::debug!("Fetching glucose data");

        match self.source.fetch_glucose().await {
            Ok(fetch) => {
                let Some(reading) = NormalizedReading::from_raw(&fetch.reading) else {
                    tracing::warn!("Glucose reading has no numeric Value");
                    self.state.send_modify(|state| {
                        *state = std::mem::take(state).fail(FETCH_ERROR_MESSAGE)
                    });
                    return;
                };
                let snapshot = GlucoseSnapshot {
                    reading,
                    series: fetch.series,
                    fetched_at: Utc::now(),
                };
                tracing::info!(
                    "Glucose {} mg/dL ({:?}), {} series points",
                    snapshot.reading.value,
                    snapshot.reading.level,
                    snapshot.series.len()
                );
                self.state
                    .send_modify(|state| *state = std::mem::take(state).complete(snapshot));
            }
            Err(e) => {
                tracing::warn!("Error fetching glucose data: {}", e);
                self.state.send_modify(|state| {
                    *state = std::mem::take(state).fail(FETCH_ERROR_MESSAGE)
                });
            }
        }
    }

    /// Run a cycle now and then every `interval` until the handle is stopped.
    ///
    /// Cycles never overlap: a tick that comes due while a fetch is still in
    /// flight is skipped.
    pub fn start(self, interval: Duration) -> PollerHandle {
        let state = self.subscribe();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.run_cycle().await;
            }
        });

        tracing::info!("Polling glucose every {:?}", interval);
        PollerHandle {
            state,
            task: Some(task),
        }
    }
}

/// Owns the polling task. Stopping (or dropping) it cancels the timer and
/// any fetch in flight, so no state update lands afterwards.
pub struct PollerHandle {
    state: watch::Receiver<PollState>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.clone()
    }

    /// Readers keep the last published state; a stop during a fetch leaves
    /// them at `Loading`.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            tracing::info!("Glucose polling stopped");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
