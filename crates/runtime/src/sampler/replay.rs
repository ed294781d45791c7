use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use run_core::GeoPosition;

use super::{AcquisitionError, GeoSampler, SampleEvent, SampleStream, WatchOptions};

#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("failed to parse track: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("track contains no positions")]
    Empty,
}

/// Replays a recorded track, pacing fixes by their capture-time deltas.
pub struct ReplaySampler {
    track: Vec<GeoPosition>,
    speed: f64,
    task: Option<JoinHandle<()>>,
}

impl ReplaySampler {
    pub const MIN_SPEED: f64 = 0.01;

    pub fn new(track: Vec<GeoPosition>) -> Self {
        Self {
            track,
            speed: 1.0,
            task: None,
        }
    }

    /// Parses a JSON array of `{latitude, longitude, capturedAtMs}`.
    pub fn from_json(json: &str) -> Result<Self, TrackError> {
        let track: Vec<GeoPosition> = serde_json::from_str(json)?;
        if track.is_empty() {
            return Err(TrackError::Empty);
        }
        Ok(Self::new(track))
    }

    /// Playback speed multiplier, at least [`MIN_SPEED`](Self::MIN_SPEED).
    /// Non-positive or non-finite values mean 1×.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = if speed.is_finite() && speed > 0.0 {
            speed.max(Self::MIN_SPEED)
        } else {
            1.0
        };
        self
    }

    pub fn track(&self) -> &[GeoPosition] {
        &self.track
    }

    /// Wall-clock time the replay takes at the configured speed.
    pub fn duration(&self) -> Duration {
        match (self.track.first(), self.track.last()) {
            (Some(first), Some(last)) => scaled(
                last.captured_at_ms().saturating_sub(first.captured_at_ms()),
                self.speed,
            ),
            _ => Duration::ZERO,
        }
    }
}

fn scaled(delta_ms: u64, speed: f64) -> Duration {
    Duration::try_from_secs_f64(delta_ms as f64 / 1000.0 / speed).unwrap_or(Duration::MAX)
}

impl GeoSampler for ReplaySampler {
    fn start(&mut self, _options: &WatchOptions) -> Result<SampleStream, AcquisitionError> {
        self.stop();

        let (tx, rx) = mpsc::unbounded_channel();
        let track = self.track.clone();
        let speed = self.speed;

        self.task = Some(tokio::spawn(async move {
            let mut previous: Option<u64> = None;
            for position in track {
                if let Some(prev) = previous {
                    let delta = position.captured_at_ms().saturating_sub(prev);
                    tokio::time::sleep(scaled(delta, speed)).await;
                }
                previous = Some(position.captured_at_ms());
                if tx.send(SampleEvent::Fix(position)).is_err() {
                    return;
                }
            }
            tracing::debug!("Replay track exhausted");
        }));

        Ok(rx)
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ReplaySampler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: &str = r#"[
        {"latitude": 0.0, "longitude": 0.0, "capturedAtMs": 1000},
        {"latitude": 0.0, "longitude": 0.001, "capturedAtMs": 3000},
        {"latitude": 0.0, "longitude": 0.002, "capturedAtMs": 7000}
    ]"#;

    #[test]
    fn parses_track_json() {
        let sampler = ReplaySampler::from_json(TRACK).unwrap();
        assert_eq!(sampler.track().len(), 3);
        assert_eq!(sampler.duration(), Duration::from_secs(6));
        assert_eq!(
            sampler.with_speed(3.0).duration(),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn tiny_speeds_are_clamped() {
        let sampler = ReplaySampler::from_json(TRACK).unwrap().with_speed(1e-20);
        assert_eq!(sampler.duration(), Duration::from_secs(600));
        assert_eq!(scaled(u64::MAX, f64::MIN_POSITIVE), Duration::MAX);
    }

    #[test]
    fn rejects_empty_and_invalid_tracks() {
        assert!(matches!(
            ReplaySampler::from_json("[]"),
            Err(TrackError::Empty)
        ));
        assert!(matches!(
            ReplaySampler::from_json(r#"[{"latitude": 95.0, "longitude": 0.0, "capturedAtMs": 0}]"#),
            Err(TrackError::Parse(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn replays_with_original_spacing() {
        let mut sampler = ReplaySampler::from_json(TRACK).unwrap().with_speed(2.0);
        let mut stream = sampler.start(&WatchOptions::default()).unwrap();
        let started = tokio::time::Instant::now();

        let mut arrivals = Vec::new();
        while let Some(event) = stream.recv().await {
            let SampleEvent::Fix(position) = event else {
                panic!("unexpected event {event:?}");
            };
            arrivals.push((position.captured_at_ms(), started.elapsed()));
        }

        assert_eq!(
            arrivals,
            vec![
                (1000, Duration::ZERO),
                (3000, Duration::from_secs(1)),
                (7000, Duration::from_secs(3)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_stream() {
        let mut sampler = ReplaySampler::from_json(TRACK).unwrap();
        let mut stream = sampler.start(&WatchOptions::default()).unwrap();
        assert!(matches!(stream.recv().await, Some(SampleEvent::Fix(_))));

        sampler.stop();
        assert_eq!(stream.recv().await, None);
    }
}
