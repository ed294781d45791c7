//! Replay a recorded track through a live session
//!
//! The track drives a real [`runtime::Runtime`] exactly as a platform
//! location watch would: fixes arrive at their recorded pace (scaled by
//! `--speed`), the clock ticks in wall time, and the run is stopped once the
//! last fix has been applied.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use client_bootstrap::{ClientConfig, RuntimeBuilder};
use client_claim_core::{Address, SubmissionResult};
use run_core::{RunState, RunSummary, format_distance_km, format_duration, format_pace};
use runtime::{ClockEvent, Event, LocationEvent, ReplaySampler, Topic};
use tokio::sync::broadcast::error::RecvError;

/// Time allowed past the track's own duration for the last fix to land.
const DEADLINE_GRACE: Duration = Duration::from_secs(2);

/// Replay a recorded track through a live session
#[derive(Parser, Debug)]
pub struct Replay {
    /// Track file: JSON array of `{latitude, longitude, capturedAtMs}`
    pub track: PathBuf,

    /// Playback speed multiplier
    #[arg(long, default_value = "1.0")]
    pub speed: f64,

    /// Wallet address credited with the run (0x-prefixed hex)
    #[arg(long)]
    pub wallet: Option<Address>,

    /// Submit the finished run for verification
    #[arg(long, requires = "wallet")]
    pub submit: bool,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl Replay {
    pub async fn execute(self, config: ClientConfig) -> Result<()> {
        let text = std::fs::read_to_string(&self.track)
            .with_context(|| format!("failed to read {}", self.track.display()))?;
        let sampler = ReplaySampler::from_json(&text)
            .with_context(|| format!("invalid track {}", self.track.display()))?
            .with_speed(self.speed);
        let expected_fixes = sampler.track().len();
        let deadline = sampler.duration().saturating_add(DEADLINE_GRACE);

        tracing::info!(
            "Replaying {} fixes from {} at {}x",
            expected_fixes,
            self.track.display(),
            self.speed
        );

        let mut builder = RuntimeBuilder::new(config).sampler(sampler);
        if !self.submit {
            builder = builder.without_submissions();
        }
        let runtime = builder.build().await?;
        let handle = runtime.handle();

        let mut location = handle.subscribe(Topic::Location);
        let mut clock = handle.subscribe(Topic::Clock);

        if handle.start().await? != RunState::Tracking {
            bail!("location unavailable; run not started");
        }

        let replay_deadline = tokio::time::sleep(deadline);
        tokio::pin!(replay_deadline);
        let mut fixes = 0;

        loop {
            tokio::select! {
                event = location.recv() => match event {
                    Ok(event) => {
                        if matches!(event, Event::Location(LocationEvent::Fix { .. })) {
                            fixes += 1;
                        }
                        self.print(&event)?;
                        if fixes >= expected_fixes {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Skipped {} location events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
                event = clock.recv() => {
                    if let Ok(event) = event {
                        self.print(&event)?;
                    }
                }
                _ = &mut replay_deadline => {
                    tracing::warn!(
                        "Replay deadline reached after {} of {} fixes",
                        fixes,
                        expected_fixes
                    );
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, stopping run");
                    break;
                }
            }
        }

        let summary = handle.stop().await?;
        self.print_summary(&summary)?;

        let outcome = if self.submit
            && let Some(wallet) = self.wallet
        {
            Some(handle.submit(wallet).await)
        } else {
            None
        };

        drop(handle);
        runtime.shutdown().await?;

        match outcome {
            Some(Ok(result)) => self.print_result(&result),
            Some(Err(e)) => return Err(e).context("submission failed"),
            None => {}
        }
        Ok(())
    }

    fn print(&self, event: &Event) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(event)?);
        } else if let Some(line) = render(event) {
            println!("{line}");
        }
        Ok(())
    }

    fn print_summary(&self, summary: &RunSummary) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(summary)?);
        } else {
            println!(
                "Run finished: {} in {}, pace {} /km, {} points",
                format_distance_km(summary.total_distance_m),
                format_duration(summary.elapsed_seconds),
                format_pace(summary.avg_pace_seconds_per_km),
                summary.path.len()
            );
        }
        Ok(())
    }

    fn print_result(&self, result: &SubmissionResult) {
        println!("Verification: {}", result.status);
        if let Some(xp) = result.xp_earned {
            println!("XP earned: {xp}");
        }
        if let Some(message) = result.display_message() {
            println!("{message}");
        }
    }
}

/// Human-readable line for a live event.
fn render(event: &Event) -> Option<String> {
    match event {
        Event::Location(LocationEvent::Fix {
            position,
            segment_m,
            total_distance_m,
        }) => Some(format!(
            "fix {:.6}, {:.6}  +{:.1} m  total {}",
            position.latitude(),
            position.longitude(),
            segment_m,
            format_distance_km(*total_distance_m)
        )),
        Event::Location(LocationEvent::Error { error }) => Some(format!("location error: {error}")),
        Event::Clock(ClockEvent {
            elapsed_seconds,
            avg_pace_seconds_per_km,
        }) => Some(format!(
            "{}  pace {} /km",
            format_duration(*elapsed_seconds),
            format_pace(*avg_pace_seconds_per_km)
        )),
        _ => None,
    }
}
