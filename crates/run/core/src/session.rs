//! Recording session state machine.
//!
//! [`RunSession`] is the functional core of a recording: it owns the path and
//! clock counters and validates every lifecycle transition. It performs no I/O
//! and reads no clocks; the runtime feeds it samples, ticks and timestamps.
//!
//! ```text
//!   Idle ──start──▶ Tracking ──stop──▶ Completed ──begin_submit──▶ Submitting
//!    ▲                                  │   ▲                          │   │
//!    │                                  │   └───────── release ────────┘   │
//!    ├───────────── discard ────────────┘                                  │
//!    └──────────────────────────────── commit ─────────────────────────────┘
//! ```
//!
//! `start` is also accepted from Completed, which drops the finished run.

use crate::geo::GeoPosition;
use crate::pace::{MIN_PACE_DISTANCE_M, average_pace};
use crate::path::PathAccumulator;

/// Lifecycle state of a [`RunSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    Idle,
    Tracking,
    Completed,
    /// A claim built from the completed run is in flight.
    Submitting,
}

/// Operations that drive [`RunSession`] transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionOp {
    Start,
    Stop,
    Discard,
    Submit,
    Commit,
    Release,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {op} a session that is {from}")]
    Invalid { from: RunState, op: SessionOp },
}

/// Frozen totals of a finished run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RunSummary {
    pub started_at_ms: u64,
    pub elapsed_seconds: u64,
    pub total_distance_m: f64,
    /// Seconds per kilometer; `None` below the pace distance threshold.
    pub avg_pace_seconds_per_km: Option<f64>,
    pub path: Vec<GeoPosition>,
}

/// A single recording session.
#[derive(Clone, Debug)]
pub struct RunSession {
    state: RunState,
    started_at_ms: Option<u64>,
    elapsed_seconds: u64,
    path: PathAccumulator,
    current_position: Option<GeoPosition>,
    min_pace_distance_m: f64,
}

impl Default for RunSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSession {
    pub fn new() -> Self {
        Self::with_pace_threshold(MIN_PACE_DISTANCE_M)
    }

    /// Creates a session with a custom minimum distance for pace derivation.
    pub fn with_pace_threshold(min_pace_distance_m: f64) -> Self {
        Self {
            state: RunState::Idle,
            started_at_ms: None,
            elapsed_seconds: 0,
            path: PathAccumulator::new(),
            current_position: None,
            min_pace_distance_m,
        }
    }

    /// Begins tracking. Valid from Idle or Completed.
    pub fn start(&mut self, now_ms: u64) -> Result<(), TransitionError> {
        self.expect(&[RunState::Idle, RunState::Completed], SessionOp::Start)?;
        self.reset();
        self.elapsed_seconds = 0;
        self.started_at_ms = Some(now_ms);
        self.state = RunState::Tracking;
        Ok(())
    }

    /// Rolls a just-started session back to Idle.
    ///
    /// Used when location acquisition turns out to be unsupported.
    pub fn abort_start(&mut self) {
        if self.state == RunState::Tracking {
            self.clear();
        }
    }

    /// Applies a fix. Returns `false` (and leaves state untouched) unless tracking.
    pub fn record(&mut self, position: GeoPosition) -> bool {
        if self.state != RunState::Tracking {
            return false;
        }
        self.path.append(position);
        self.current_position = Some(position);
        true
    }

    /// Advances the clock by one second. Returns `false` unless tracking.
    pub fn tick(&mut self) -> bool {
        if self.state != RunState::Tracking {
            return false;
        }
        self.elapsed_seconds += 1;
        true
    }

    /// Freezes the run. Valid only from Tracking.
    pub fn stop(&mut self) -> Result<RunSummary, TransitionError> {
        self.expect(&[RunState::Tracking], SessionOp::Stop)?;
        self.state = RunState::Completed;
        Ok(self.summary())
    }

    /// Drops a finished run. No-op from Idle.
    pub fn discard(&mut self) -> Result<(), TransitionError> {
        match self.state {
            RunState::Idle => Ok(()),
            RunState::Completed => {
                self.clear();
                Ok(())
            }
            from => Err(TransitionError::Invalid {
                from,
                op: SessionOp::Discard,
            }),
        }
    }

    /// Reserves a completed run for claim submission.
    ///
    /// While reserved, further submits, starts and discards are rejected.
    pub fn begin_submit(&mut self) -> Result<RunSummary, TransitionError> {
        self.expect(&[RunState::Completed], SessionOp::Submit)?;
        self.state = RunState::Submitting;
        Ok(self.summary())
    }

    /// The claim reached a verdict: the run is consumed.
    pub fn commit_submit(&mut self) -> Result<(), TransitionError> {
        self.expect(&[RunState::Submitting], SessionOp::Commit)?;
        self.clear();
        Ok(())
    }

    /// The claim failed before a verdict: the run becomes resubmittable.
    pub fn release_submit(&mut self) -> Result<(), TransitionError> {
        self.expect(&[RunState::Submitting], SessionOp::Release)?;
        self.state = RunState::Completed;
        Ok(())
    }

    /// Clears the path and current position. Idempotent.
    pub fn reset(&mut self) {
        self.path.clear();
        self.current_position = None;
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn started_at_ms(&self) -> Option<u64> {
        self.started_at_ms
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn total_distance_m(&self) -> f64 {
        self.path.total_distance_m()
    }

    pub fn current_position(&self) -> Option<GeoPosition> {
        self.current_position
    }

    pub fn path(&self) -> &[GeoPosition] {
        self.path.points()
    }

    pub fn avg_pace_seconds_per_km(&self) -> Option<f64> {
        average_pace(
            self.elapsed_seconds,
            self.path.total_distance_m(),
            self.min_pace_distance_m,
        )
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            started_at_ms: self.started_at_ms.unwrap_or_default(),
            elapsed_seconds: self.elapsed_seconds,
            total_distance_m: self.path.total_distance_m(),
            avg_pace_seconds_per_km: self.avg_pace_seconds_per_km(),
            path: self.path.points().to_vec(),
        }
    }

    fn clear(&mut self) {
        self.reset();
        self.elapsed_seconds = 0;
        self.started_at_ms = None;
        self.state = RunState::Idle;
    }

    fn expect(&self, allowed: &[RunState], op: SessionOp) -> Result<(), TransitionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(TransitionError::Invalid {
                from: self.state,
                op,
            })
        }
    }
}
