//! Event types for each topic.

use serde::Serialize;

use client_claim_core::{SubmissionResult, VerificationStatus};
use run_core::{GeoPosition, RunState, RunSummary};

use crate::sampler::AcquisitionError;

/// Lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// Recording began; path and distance were reset.
    Started { started_at_ms: u64 },

    /// `start` fell back to Idle because location is unsupported.
    StartAbandoned,

    /// Recording ended; totals are frozen.
    Stopped { summary: RunSummary },

    /// A finished run was thrown away.
    Discarded,

    StateChanged { from: RunState, to: RunState },
}

/// Location watch output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LocationEvent {
    /// A fix was appended to the path.
    Fix {
        position: GeoPosition,
        segment_m: f64,
        total_distance_m: f64,
    },

    /// Non-fatal acquisition failure; tracking continues.
    Error { error: AcquisitionError },
}

/// One-second wall-clock tick while tracking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockEvent {
    pub elapsed_seconds: u64,
    pub avg_pace_seconds_per_km: Option<f64>,
}

/// Claim submission progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SubmissionEvent {
    /// The session was reserved and a claim is being built.
    Started,

    /// The backend returned a verdict; the session is back to Idle.
    Verdict {
        accepted: bool,
        #[serde(serialize_with = "serialize_display")]
        status: VerificationStatus,
        xp_earned: Option<u64>,
        message: Option<String>,
    },

    /// Signing or transport failed; the session is Completed again.
    Failed { error: String },
}

impl SubmissionEvent {
    pub(crate) fn verdict(result: &SubmissionResult) -> Self {
        SubmissionEvent::Verdict {
            accepted: result.accepted,
            status: result.status,
            xp_earned: result.xp_earned,
            message: result.display_message(),
        }
    }
}

fn serialize_display<S: serde::Serializer>(
    value: &VerificationStatus,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
