//! Pace derivation and display helpers.

/// Distance below which pace is undefined (meters).
pub const MIN_PACE_DISTANCE_M: f64 = 10.0;

/// Placeholder shown when pace is undefined.
pub const PACE_PLACEHOLDER: &str = "--:--";

/// Average pace in seconds per kilometer.
///
/// Returns `None` when `distance_m` is below `min_distance_m` (or not positive).
pub fn average_pace(elapsed_seconds: u64, distance_m: f64, min_distance_m: f64) -> Option<f64> {
    if distance_m.is_nan() || distance_m <= 0.0 || distance_m < min_distance_m {
        return None;
    }
    Some(elapsed_seconds as f64 / (distance_m / 1000.0))
}

/// Formats a pace as `m:ss` per kilometer, or [`PACE_PLACEHOLDER`].
pub fn format_pace(pace_seconds_per_km: Option<f64>) -> String {
    match pace_seconds_per_km {
        Some(pace) if pace.is_finite() => {
            let total = pace.round() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => PACE_PLACEHOLDER.to_string(),
    }
}

/// Formats elapsed time as `h:mm:ss`, or `mm:ss` under an hour.
pub fn format_duration(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Formats a distance as kilometers with two decimals.
pub fn format_distance_km(distance_m: f64) -> String {
    format!("{:.2} km", distance_m / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_seconds_over_two_hundred_meters() {
        let pace = average_pace(60, 200.0, MIN_PACE_DISTANCE_M).unwrap();
        assert!((pace - 300.0).abs() < 1e-9);
        assert_eq!(format_pace(Some(pace)), "5:00");
    }

    #[test]
    fn pace_undefined_without_distance() {
        assert_eq!(average_pace(60, 0.0, MIN_PACE_DISTANCE_M), None);
        assert_eq!(average_pace(60, 9.99, MIN_PACE_DISTANCE_M), None);
        assert_eq!(average_pace(0, 0.0, 0.0), None);
        assert_eq!(format_pace(None), PACE_PLACEHOLDER);
    }

    #[test]
    fn threshold_is_inclusive() {
        let pace = average_pace(10, 10.0, 10.0).unwrap();
        assert!((pace - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(59), "00:59");
        assert_eq!(format_duration(61), "01:01");
        assert_eq!(format_duration(3_723), "1:02:03");
    }

    #[test]
    fn distances() {
        assert_eq!(format_distance_km(1234.0), "1.23 km");
    }
}
