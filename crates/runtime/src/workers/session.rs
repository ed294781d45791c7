//! Session worker that owns the authoritative [`RunSession`].
//!
//! Commands from [`SessionHandle`](crate::SessionHandle), location samples and
//! clock ticks are all handled in one `select!` loop, so the path is mutated
//! by exactly one task and samples are applied in arrival order. The sample
//! stream and the ticker are dropped inside the `Stop`/`Discard` handler:
//! once the reply is sent, nothing can reach the session anymore.

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval, Sleep};
use tracing::{debug, info, warn};

use client_claim_core::{Address, SubmissionResult};
use run_core::{GeoPosition, RunSession, RunState, RunSummary};

use super::ClaimPipeline;
use super::pipeline::now_ms;
use crate::api::{Result, RuntimeError, SessionSnapshot};
use crate::events::{ClockEvent, Event, EventBus, LocationEvent, SessionEvent, SubmissionEvent};
use crate::sampler::{AcquisitionError, GeoSampler, SampleEvent, SampleStream, WatchOptions};

const TICK: Duration = Duration::from_secs(1);

/// Consecutive samples handled before a pending command is served.
const SAMPLE_BURST: usize = 32;

/// Commands that can be sent to the session worker
pub enum Command {
    Start {
        reply: oneshot::Sender<Result<RunState>>,
    },
    Stop {
        reply: oneshot::Sender<Result<RunSummary>>,
    },
    Discard {
        reply: oneshot::Sender<Result<()>>,
    },
    /// Reserve the finished run and submit it in the background.
    Submit {
        wallet: Address,
        reply: oneshot::Sender<Result<SubmissionResult>>,
    },
    /// Sent by the submission task once the pipeline has an outcome.
    FinishSubmit {
        outcome: Result<SubmissionResult>,
        reply: oneshot::Sender<Result<SubmissionResult>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Background task that processes session commands, samples and ticks.
pub struct SessionWorker {
    session: RunSession,
    sampler: Box<dyn GeoSampler>,
    watch_options: WatchOptions,
    // Per-watch producers; set together on start, dropped together on stop.
    samples: Option<SampleStream>,
    ticker: Option<Interval>,
    fix_deadline: Option<Pin<Box<Sleep>>>,
    command_rx: mpsc::Receiver<Command>,
    command_tx: mpsc::WeakSender<Command>,
    event_bus: EventBus,
    pipeline: Option<Arc<ClaimPipeline>>,
}

impl SessionWorker {
    pub fn new(
        session: RunSession,
        sampler: Box<dyn GeoSampler>,
        watch_options: WatchOptions,
        command_rx: mpsc::Receiver<Command>,
        command_tx: mpsc::WeakSender<Command>,
        event_bus: EventBus,
        pipeline: Option<Arc<ClaimPipeline>>,
    ) -> Self {
        Self {
            session,
            sampler,
            watch_options,
            samples: None,
            ticker: None,
            fix_deadline: None,
            command_rx,
            command_tx,
            event_bus,
            pipeline,
        }
    }

    /// Main worker loop. Ends when every handle has been dropped.
    ///
    /// Samples win the `biased` select, so after [`SAMPLE_BURST`] of them in
    /// a row a queued command is served first. A flooding sampler cannot
    /// hold off `Stop` or `Discard`.
    pub async fn run(mut self) {
        let mut burst = 0;
        loop {
            if burst >= SAMPLE_BURST {
                burst = 0;
                match self.command_rx.try_recv() {
                    Ok(cmd) => {
                        self.handle_command(cmd);
                        continue;
                    }
                    Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }
            }

            tokio::select! {
                biased;

                sample = next_sample(&mut self.samples) => {
                    burst += 1;
                    self.handle_sample(sample);
                }
                _ = next_tick(&mut self.ticker) => self.handle_tick(),
                _ = fix_timeout(&mut self.fix_deadline) => self.handle_fix_timeout(),
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => {
                        burst = 0;
                        self.handle_command(cmd);
                    }
                    None => break,
                },
            }
        }

        self.end_watch();
        debug!("Session worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start { reply } => {
                let result = self.start();
                respond(reply, result, "Start");
            }
            Command::Stop { reply } => {
                let result = self.stop();
                respond(reply, result, "Stop");
            }
            Command::Discard { reply } => {
                let result = self.discard();
                respond(reply, result, "Discard");
            }
            Command::Submit { wallet, reply } => self.begin_submit(wallet, reply),
            Command::FinishSubmit { outcome, reply } => {
                let result = self.finish_submit(outcome);
                respond(reply, result, "Submit");
            }
            Command::Snapshot { reply } => {
                respond(reply, SessionSnapshot::of(&self.session), "Snapshot");
            }
        }
    }

    fn start(&mut self) -> Result<RunState> {
        let from = self.session.state();
        let started_at_ms = now_ms();
        self.session.start(started_at_ms)?;

        match self.sampler.start(&self.watch_options) {
            Ok(samples) => {
                self.samples = Some(samples);
                self.ticker = Some(tokio::time::interval_at(Instant::now() + TICK, TICK));
                self.fix_deadline = Some(Box::pin(tokio::time::sleep(self.watch_options.timeout)));
                info!("Run started");
                self.publish(Event::Session(SessionEvent::Started { started_at_ms }));
                self.transitioned(from);
            }
            Err(error) => {
                self.session.abort_start();
                warn!("Location unavailable, run not started: {}", error);
                self.publish(Event::Location(LocationEvent::Error { error }));
                self.publish(Event::Session(SessionEvent::StartAbandoned));
                self.transitioned(from);
            }
        }

        Ok(self.session.state())
    }

    fn stop(&mut self) -> Result<RunSummary> {
        let summary = self.session.stop()?;
        self.end_watch();

        info!(
            "Run stopped: {:.1} m in {} s",
            summary.total_distance_m, summary.elapsed_seconds
        );
        self.publish(Event::Session(SessionEvent::Stopped {
            summary: summary.clone(),
        }));
        self.transitioned(RunState::Tracking);
        Ok(summary)
    }

    fn discard(&mut self) -> Result<()> {
        let from = self.session.state();
        self.session.discard()?;
        self.end_watch();

        if from != RunState::Idle {
            info!("Run discarded");
            self.publish(Event::Session(SessionEvent::Discarded));
            self.transitioned(from);
        }
        Ok(())
    }

    fn begin_submit(&mut self, wallet: Address, reply: oneshot::Sender<Result<SubmissionResult>>) {
        let Some(pipeline) = self.pipeline.clone() else {
            respond(reply, Err(RuntimeError::SubmitterNotConfigured), "Submit");
            return;
        };
        let Some(command_tx) = self.command_tx.upgrade() else {
            respond(reply, Err(RuntimeError::CommandChannelClosed), "Submit");
            return;
        };

        let summary = match self.session.begin_submit() {
            Ok(summary) => summary,
            Err(e) => {
                debug!("Submit rejected: {}", e);
                respond(reply, Err(e.into()), "Submit");
                return;
            }
        };

        info!("Submitting run for {}", wallet);
        self.publish(Event::Submission(SubmissionEvent::Started));
        self.transitioned(RunState::Completed);

        // Detached so a caller dropping its future cannot strand the reservation.
        tokio::spawn(async move {
            let outcome = pipeline.submit(summary, wallet).await;
            if command_tx
                .send(Command::FinishSubmit { outcome, reply })
                .await
                .is_err()
            {
                warn!("Session worker stopped before submission finished");
            }
        });
    }

    fn finish_submit(&mut self, outcome: Result<SubmissionResult>) -> Result<SubmissionResult> {
        match outcome {
            Ok(result) => {
                if let Err(e) = self.session.commit_submit() {
                    warn!("Submission finished outside a reservation: {}", e);
                }
                self.publish(Event::Submission(SubmissionEvent::verdict(&result)));
                self.transitioned(RunState::Submitting);
                Ok(result)
            }
            Err(error) => {
                if let Err(e) = self.session.release_submit() {
                    warn!("Submission failed outside a reservation: {}", e);
                }
                warn!("Submission failed, run kept for retry: {}", error);
                self.publish(Event::Submission(SubmissionEvent::Failed {
                    error: error.to_string(),
                }));
                self.transitioned(RunState::Submitting);
                Err(error)
            }
        }
    }

    fn handle_sample(&mut self, sample: Option<SampleEvent>) {
        match sample {
            Some(SampleEvent::Fix(position)) => self.record(position),
            Some(SampleEvent::Error(error)) => {
                warn!("Location error: {}", error);
                self.publish(Event::Location(LocationEvent::Error { error }));
            }
            None => {
                debug!("Location stream ended");
                self.samples = None;
            }
        }
    }

    fn record(&mut self, position: GeoPosition) {
        let before = self.session.total_distance_m();
        if !self.session.record(position) {
            warn!("Dropping sample received while {}", self.session.state());
            return;
        }
        let total_distance_m = self.session.total_distance_m();
        debug!(
            "Fix ({:.6}, {:.6}), total {:.1} m",
            position.latitude(),
            position.longitude(),
            total_distance_m
        );

        self.rearm_fix_deadline();
        self.publish(Event::Location(LocationEvent::Fix {
            position,
            segment_m: total_distance_m - before,
            total_distance_m,
        }));
    }

    fn handle_tick(&mut self) {
        if self.session.tick() {
            self.publish(Event::Clock(ClockEvent {
                elapsed_seconds: self.session.elapsed_seconds(),
                avg_pace_seconds_per_km: self.session.avg_pace_seconds_per_km(),
            }));
        }
    }

    fn handle_fix_timeout(&mut self) {
        self.rearm_fix_deadline();
        warn!("No location fix within {:?}", self.watch_options.timeout);
        self.publish(Event::Location(LocationEvent::Error {
            error: AcquisitionError::Timeout,
        }));
    }

    fn rearm_fix_deadline(&mut self) {
        if let Some(deadline) = self.fix_deadline.as_mut() {
            deadline
                .as_mut()
                .reset(Instant::now() + self.watch_options.timeout);
        }
    }

    /// Releases the platform watch and drops every per-watch producer.
    fn end_watch(&mut self) {
        self.sampler.stop();
        self.samples = None;
        self.ticker = None;
        self.fix_deadline = None;
    }

    fn transitioned(&self, from: RunState) {
        let to = self.session.state();
        if from != to {
            self.publish(Event::Session(SessionEvent::StateChanged { from, to }));
        }
    }

    fn publish(&self, event: Event) {
        self.event_bus.publish(event);
    }
}

fn respond<T>(reply: oneshot::Sender<T>, value: T, command: &str) {
    if reply.send(value).is_err() {
        debug!("{} reply channel closed (caller dropped)", command);
    }
}

async fn next_sample(samples: &mut Option<SampleStream>) -> Option<SampleEvent> {
    match samples {
        Some(samples) => samples.recv().await,
        None => pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => pending().await,
    }
}

async fn fix_timeout(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(deadline) => deadline.as_mut().await,
        None => pending().await,
    }
}
