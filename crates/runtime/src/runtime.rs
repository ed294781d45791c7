//! High-level runtime orchestrator.
//!
//! The runtime owns the session worker, wires up command/event channels, and
//! exposes a builder-based API for embedding a recording session.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use client_claim_core::{ClaimBuilder, RunApi, SubmissionClient};
use run_core::{EnvironmentProbe, MIN_PACE_DISTANCE_M, RunSession, StaticProbe};

use crate::api::{Result, RuntimeError, SessionHandle};
use crate::events::{Event, EventBus, Topic};
use crate::sampler::{GeoSampler, WatchOptions};
use crate::workers::{ClaimPipeline, Command, SessionWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub watch_options: WatchOptions,
    /// Distance below which average pace is undefined (meters).
    pub min_pace_distance_m: f64,
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            watch_options: WatchOptions::default(),
            min_pace_distance_m: MIN_PACE_DISTANCE_M,
            command_buffer_size: 32,
            event_buffer_size: 128,
        }
    }
}

/// Owns the session worker.
///
/// [`SessionHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: SessionHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to the session
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Waits for the worker to exit once every other handle is dropped.
    ///
    /// An in-flight submission keeps the worker alive until its verdict has
    /// been applied.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    sampler: Option<Box<dyn GeoSampler>>,
    claims: Option<(ClaimBuilder, Arc<dyn RunApi>)>,
    probe: Arc<dyn EnvironmentProbe>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            sampler: None,
            claims: None,
            probe: Arc::new(StaticProbe(None)),
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the location source (required)
    pub fn sampler(mut self, sampler: impl GeoSampler + 'static) -> Self {
        self.sampler = Some(Box::new(sampler));
        self
    }

    /// Enable claim submission.
    pub fn claims(mut self, builder: ClaimBuilder, api: Arc<dyn RunApi>) -> Self {
        self.claims = Some((builder, api));
        self
    }

    /// Source of device attributes for fingerprinting.
    ///
    /// Defaults to a probe without a client environment, which yields the
    /// sentinel device hash.
    pub fn environment_probe(mut self, probe: Arc<dyn EnvironmentProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Build the runtime and spawn its worker
    pub async fn build(self) -> Result<Runtime> {
        let sampler = self.sampler.ok_or(RuntimeError::MissingSampler)?;

        let pipeline = self.claims.map(|(builder, api)| {
            Arc::new(ClaimPipeline::new(
                builder,
                SubmissionClient::new(api),
                Arc::clone(&self.probe),
            ))
        });

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let worker = SessionWorker::new(
            RunSession::with_pace_threshold(self.config.min_pace_distance_m),
            sampler,
            self.config.watch_options,
            command_rx,
            command_tx.downgrade(),
            event_bus.clone(),
            pipeline.clone(),
        );
        let worker_handle = tokio::spawn(worker.run());

        tracing::debug!(
            "Runtime started (submission {})",
            if pipeline.is_some() { "enabled" } else { "disabled" }
        );

        Ok(Runtime {
            handle: SessionHandle::new(command_tx, event_bus, pipeline),
            worker_handle,
        })
    }
}
