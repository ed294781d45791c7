//! Recording lifecycle driven through the public runtime API.
//!
//! Time is paused so ticks and the fix watchdog advance only when the test
//! says so.

use std::f64::consts::PI;
use std::time::Duration;

use run_core::{EARTH_RADIUS_M, GeoPosition, RunState, TransitionError};
use runtime::{
    AcquisitionError, ChannelSampler, Event, FixSender, LocationEvent, Runtime, RuntimeError,
    SessionEvent, SessionHandle, Topic, UnsupportedSampler,
};

async fn recording_runtime() -> (Runtime, SessionHandle, FixSender) {
    let (sampler, fixes) = ChannelSampler::new();
    let runtime = Runtime::builder()
        .sampler(sampler)
        .build()
        .await
        .expect("runtime should build");
    let handle = runtime.handle();
    (runtime, handle, fixes)
}

fn fix(lat: f64, lon: f64, ms: u64) -> GeoPosition {
    GeoPosition::new(lat, lon, ms).unwrap()
}

/// Degrees of longitude along the equator covering `meters`.
fn equator_degrees(meters: f64) -> f64 {
    meters / (EARTH_RADIUS_M * PI / 180.0)
}

#[tokio::test(start_paused = true)]
async fn records_distance_elapsed_and_pace() {
    let (_runtime, handle, fixes) = recording_runtime().await;

    assert_eq!(handle.start().await.unwrap(), RunState::Tracking);
    assert!(fixes.send_fix(fix(0.0, 0.0, 0)));
    assert!(fixes.send_fix(fix(0.0, 0.001, 1_000)));

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.path.len(), 2);
    assert!((snapshot.total_distance_m - 111.19).abs() < 111.19 * 0.01);
    assert_eq!(snapshot.current_position, Some(fix(0.0, 0.001, 1_000)));

    assert!(fixes.send_fix(fix(0.0, equator_degrees(200.0), 60_000)));
    tokio::time::advance(Duration::from_secs(60)).await;

    let summary = handle.stop().await.unwrap();
    assert_eq!(summary.elapsed_seconds, 60);
    assert!((summary.total_distance_m - 200.0).abs() < 1e-6);
    let pace = summary.avg_pace_seconds_per_km.expect("pace defined over 10 m");
    assert!((pace - 300.0).abs() < 1e-3);
}

#[tokio::test(start_paused = true)]
async fn pace_is_undefined_before_any_distance() {
    let (_runtime, handle, _fixes) = recording_runtime().await;

    handle.start().await.unwrap();
    tokio::time::advance(Duration::from_secs(5)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.elapsed_seconds, 5);
    assert_eq!(snapshot.total_distance_m, 0.0);
    assert_eq!(snapshot.avg_pace_seconds_per_km, None);
}

#[tokio::test(start_paused = true)]
async fn invalid_transitions_are_rejected() {
    let (_runtime, handle, _fixes) = recording_runtime().await;

    let err = handle.stop().await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Transition(TransitionError::Invalid {
            from: RunState::Idle,
            ..
        })
    ));

    handle.start().await.unwrap();
    let err = handle.start().await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Transition(TransitionError::Invalid {
            from: RunState::Tracking,
            ..
        })
    ));

    // Discarding a live recording is not allowed either.
    assert!(handle.discard().await.is_err());
    assert_eq!(handle.snapshot().await.unwrap().state, RunState::Tracking);
}

#[tokio::test(start_paused = true)]
async fn stop_is_served_while_fixes_keep_flooding_in() {
    let (_runtime, handle, fixes) = recording_runtime().await;
    handle.start().await.unwrap();

    let flood = 10_000u64;
    for i in 0..flood {
        assert!(fixes.send_fix(fix(0.0, i as f64 * 1e-6, i)));
    }
    let summary = handle.stop().await.unwrap();

    assert!(!summary.path.is_empty());
    assert!((summary.path.len() as u64) < flood);
    assert!(!fixes.is_watching());
}

#[tokio::test(start_paused = true)]
async fn late_samples_after_stop_are_dropped() {
    let (_runtime, handle, fixes) = recording_runtime().await;

    handle.start().await.unwrap();
    fixes.send_fix(fix(0.0, 0.0, 0));
    fixes.send_fix(fix(0.0, 0.001, 1_000));
    tokio::time::advance(Duration::from_secs(3)).await;
    let summary = handle.stop().await.unwrap();

    // The platform fires once more after the watch was cleared.
    assert!(!fixes.send_fix(fix(0.0, 0.002, 2_000)));
    tokio::time::advance(Duration::from_secs(10)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, RunState::Completed);
    assert_eq!(snapshot.total_distance_m, summary.total_distance_m);
    assert_eq!(snapshot.path.len(), 2);
    assert_eq!(snapshot.elapsed_seconds, 3);
}

#[tokio::test(start_paused = true)]
async fn discard_then_start_begins_fresh() {
    let (_runtime, handle, fixes) = recording_runtime().await;
    let mut session_events = handle.subscribe(Topic::Session);

    handle.start().await.unwrap();
    fixes.send_fix(fix(10.0, 10.0, 0));
    fixes.send_fix(fix(10.0, 10.01, 5_000));
    tokio::time::advance(Duration::from_secs(2)).await;
    handle.stop().await.unwrap();
    handle.discard().await.unwrap();
    assert_eq!(handle.snapshot().await.unwrap().state, RunState::Idle);

    // Discard from Idle is a no-op.
    handle.discard().await.unwrap();

    handle.start().await.unwrap();
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.total_distance_m, 0.0);
    assert!(snapshot.path.is_empty());
    assert_eq!(snapshot.elapsed_seconds, 0);
    assert_eq!(snapshot.current_position, None);

    let mut discarded = 0;
    while let Ok(event) = session_events.try_recv() {
        if event == Event::Session(SessionEvent::Discarded) {
            discarded += 1;
        }
    }
    assert_eq!(discarded, 1);
}

#[tokio::test(start_paused = true)]
async fn restart_from_completed_resets_the_run() {
    let (_runtime, handle, fixes) = recording_runtime().await;

    handle.start().await.unwrap();
    fixes.send_fix(fix(0.0, 0.0, 0));
    fixes.send_fix(fix(0.0, 0.01, 5_000));
    handle.stop().await.unwrap();

    assert_eq!(handle.start().await.unwrap(), RunState::Tracking);
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.total_distance_m, 0.0);
    assert!(snapshot.path.is_empty());
}

#[tokio::test(start_paused = true)]
async fn unsupported_location_falls_back_to_idle() {
    let runtime = Runtime::builder()
        .sampler(UnsupportedSampler)
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();
    let mut session_events = handle.subscribe(Topic::Session);
    let mut location_events = handle.subscribe(Topic::Location);

    assert_eq!(handle.start().await.unwrap(), RunState::Idle);
    assert_eq!(handle.snapshot().await.unwrap().state, RunState::Idle);

    assert_eq!(
        location_events.try_recv().unwrap(),
        Event::Location(LocationEvent::Error {
            error: AcquisitionError::Unsupported
        })
    );
    assert_eq!(
        session_events.try_recv().unwrap(),
        Event::Session(SessionEvent::StartAbandoned)
    );

    // No clock runs for an abandoned start.
    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(handle.snapshot().await.unwrap().elapsed_seconds, 0);
}

#[tokio::test(start_paused = true)]
async fn acquisition_errors_do_not_end_tracking() {
    let (_runtime, handle, fixes) = recording_runtime().await;
    let mut location_events = handle.subscribe(Topic::Location);

    handle.start().await.unwrap();
    assert!(fixes.send_error(AcquisitionError::PermissionDenied));
    assert!(fixes.send_fix(fix(1.0, 1.0, 0)));

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, RunState::Tracking);
    assert_eq!(snapshot.path.len(), 1);

    assert_eq!(
        location_events.try_recv().unwrap(),
        Event::Location(LocationEvent::Error {
            error: AcquisitionError::PermissionDenied
        })
    );
    assert!(matches!(
        location_events.try_recv().unwrap(),
        Event::Location(LocationEvent::Fix { segment_m, .. }) if segment_m == 0.0
    ));
}

#[tokio::test(start_paused = true)]
async fn missing_fixes_raise_timeout_events() {
    let (_runtime, handle, fixes) = recording_runtime().await;
    let mut location_events = handle.subscribe(Topic::Location);

    handle.start().await.unwrap();
    tokio::time::advance(Duration::from_secs(8)).await;
    fixes.send_fix(fix(0.0, 0.0, 8_000));
    handle.snapshot().await.unwrap();

    // A fix re-arms the watchdog, so 8 more seconds stay quiet.
    tokio::time::advance(Duration::from_secs(8)).await;
    handle.snapshot().await.unwrap();
    assert!(matches!(
        location_events.try_recv().unwrap(),
        Event::Location(LocationEvent::Fix { .. })
    ));
    assert!(location_events.try_recv().is_err());

    tokio::time::advance(Duration::from_secs(3)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(
        location_events.try_recv().unwrap(),
        Event::Location(LocationEvent::Error {
            error: AcquisitionError::Timeout
        })
    );
    assert_eq!(snapshot.state, RunState::Tracking);
}

#[tokio::test(start_paused = true)]
async fn watch_options_reach_the_platform() {
    let (_runtime, handle, fixes) = recording_runtime().await;
    assert!(!fixes.is_watching());

    handle.start().await.unwrap();
    let options = fixes.watch_options().expect("watch active");
    assert!(options.high_accuracy);
    assert_eq!(options.timeout, Duration::from_secs(10));

    handle.stop().await.unwrap();
    assert!(!fixes.is_watching());
}

#[tokio::test]
async fn builder_requires_a_sampler() {
    assert!(matches!(
        Runtime::builder().build().await,
        Err(RuntimeError::MissingSampler)
    ));
}

#[tokio::test]
async fn shutdown_joins_the_worker() {
    let (runtime, handle, _fixes) = recording_runtime().await;
    drop(handle);
    runtime.shutdown().await.unwrap();
}
