//! Cloneable façade for driving a run session.
//!
//! [`SessionHandle`] hides channel plumbing and offers async helpers for the
//! recording screen: start, stop, discard, submit, live snapshots and topic
//! subscriptions.
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};

use client_claim_core::{Address, SubmissionResult, SyncedProgress};
use run_core::{GeoPosition, RunSession, RunState, RunSummary};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::{ClaimPipeline, Command};

/// Read-only view of the live session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: RunState,
    pub started_at_ms: Option<u64>,
    pub elapsed_seconds: u64,
    pub total_distance_m: f64,
    pub current_position: Option<GeoPosition>,
    pub path: Vec<GeoPosition>,
    /// `None` below the pace distance threshold.
    pub avg_pace_seconds_per_km: Option<f64>,
}

impl SessionSnapshot {
    pub(crate) fn of(session: &RunSession) -> Self {
        Self {
            state: session.state(),
            started_at_ms: session.started_at_ms(),
            elapsed_seconds: session.elapsed_seconds(),
            total_distance_m: session.total_distance_m(),
            current_position: session.current_position(),
            path: session.path().to_vec(),
            avg_pace_seconds_per_km: session.avg_pace_seconds_per_km(),
        }
    }
}

/// Client-facing handle to the session worker
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    pipeline: Option<Arc<ClaimPipeline>>,
}

impl SessionHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
        pipeline: Option<Arc<ClaimPipeline>>,
    ) -> Self {
        Self {
            command_tx,
            event_bus,
            pipeline,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Starts recording.
    ///
    /// Resolves to [`RunState::Tracking`], or to [`RunState::Idle`] when the
    /// platform has no location support.
    pub async fn start(&self) -> Result<RunState> {
        self.request(|reply| Command::Start { reply }).await?
    }

    /// Stops recording and returns the frozen totals.
    ///
    /// Once this resolves, no sample or tick can change the session.
    pub async fn stop(&self) -> Result<RunSummary> {
        self.request(|reply| Command::Stop { reply }).await?
    }

    /// Throws away a finished run. A no-op when idle.
    pub async fn discard(&self) -> Result<()> {
        self.request(|reply| Command::Discard { reply }).await?
    }

    /// Builds, signs and submits a claim for the finished run.
    ///
    /// The session is consumed on any verdict, including a rejection. On a
    /// signing or transport error it stays Completed and may be resubmitted.
    pub async fn submit(&self, wallet: Address) -> Result<SubmissionResult> {
        self.request(|reply| Command::Submit { wallet, reply }).await?
    }

    /// Current session state (read-only copy).
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Fetches the relay-signed progress snapshot for `wallet`.
    pub async fn sync_progress(&self, wallet: Address) -> Result<SyncedProgress> {
        let pipeline = self
            .pipeline
            .as_ref()
            .ok_or(RuntimeError::SubmitterNotConfigured)?;
        Ok(pipeline.sync_progress(wallet).await?)
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Session` - lifecycle transitions
    /// - `Topic::Location` - fixes and acquisition errors
    /// - `Topic::Clock` - elapsed-time ticks
    /// - `Topic::Submission` - claim submission progress
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
