//! Geographic primitives and great-circle distance.

/// Mean Earth radius used by the haversine formula (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Errors raised when constructing a [`GeoPosition`] from raw coordinates.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PositionError {
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A single location fix.
///
/// Coordinates are WGS84 degrees. `captured_at_ms` is the platform's fix time
/// in Unix epoch milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(rename_all = "camelCase", try_from = "RawPosition")
)]
pub struct GeoPosition {
    latitude: f64,
    longitude: f64,
    captured_at_ms: u64,
}

impl GeoPosition {
    /// Creates a validated position.
    ///
    /// NaN coordinates fail the range checks and are rejected.
    pub fn new(latitude: f64, longitude: f64, captured_at_ms: u64) -> Result<Self, PositionError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(PositionError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(PositionError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
            captured_at_ms,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn captured_at_ms(&self) -> u64 {
        self.captured_at_ms
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &GeoPosition) -> f64 {
        haversine_m(self, other)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPosition {
    latitude: f64,
    longitude: f64,
    captured_at_ms: u64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPosition> for GeoPosition {
    type Error = PositionError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        GeoPosition::new(raw.latitude, raw.longitude, raw.captured_at_ms)
    }
}

/// Haversine great-circle distance between two positions (meters).
///
/// ```text
/// a = sin²(Δlat/2) + cos(lat1)·cos(lat2)·sin²(Δlon/2)
/// d = 2·R·atan2(√a, √(1-a))
/// ```
pub fn haversine_m(a: &GeoPosition, b: &GeoPosition) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Total distance of a path computed in one pass, in insertion order.
///
/// Reference for the incremental total kept by [`crate::PathAccumulator`].
pub fn path_distance(points: &[GeoPosition]) -> f64 {
    points.windows(2).map(|w| haversine_m(&w[0], &w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pos(lat: f64, lon: f64) -> GeoPosition {
        GeoPosition::new(lat, lon, 0).unwrap()
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert_eq!(
            GeoPosition::new(90.5, 0.0, 0),
            Err(PositionError::LatitudeOutOfRange(90.5))
        );
        assert_eq!(
            GeoPosition::new(0.0, -180.1, 0),
            Err(PositionError::LongitudeOutOfRange(-180.1))
        );
        assert!(GeoPosition::new(f64::NAN, 0.0, 0).is_err());
        assert!(GeoPosition::new(-90.0, 180.0, 0).is_ok());
    }

    #[test]
    fn thousandth_degree_of_longitude_at_equator() {
        let d = haversine_m(&pos(0.0, 0.0), &pos(0.0, 0.001));
        // 111.19 m ± 1%
        assert!((d - 111.19).abs() < 1.1119, "got {d}");
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = haversine_m(&pos(0.0, 0.0), &pos(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 200.0);
    }

    #[test]
    fn short_paths_have_zero_distance() {
        assert_eq!(path_distance(&[]), 0.0);
        assert_eq!(path_distance(&[pos(12.0, 34.0)]), 0.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialization_validates_range() {
        let ok: GeoPosition =
            serde_json::from_str(r#"{"latitude":1.5,"longitude":2.5,"capturedAtMs":7}"#).unwrap();
        assert_eq!(ok.captured_at_ms(), 7);

        let bad = serde_json::from_str::<GeoPosition>(
            r#"{"latitude":91.0,"longitude":2.5,"capturedAtMs":7}"#,
        );
        assert!(bad.is_err());
    }

    fn arb_position() -> impl Strategy<Value = GeoPosition> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lon)| pos(lat, lon))
    }

    proptest! {
        /// Property: distance from a point to itself is zero
        #[test]
        fn prop_identity_is_zero(p in arb_position()) {
            prop_assert_eq!(haversine_m(&p, &p), 0.0);
        }

        /// Property: haversine is symmetric
        #[test]
        fn prop_symmetric(a in arb_position(), b in arb_position()) {
            let ab = haversine_m(&a, &b);
            let ba = haversine_m(&b, &a);
            prop_assert!((ab - ba).abs() < 1e-6, "d(a,b)={} d(b,a)={}", ab, ba);
        }

        /// Property: never exceeds half the circumference
        #[test]
        fn prop_bounded(a in arb_position(), b in arb_position()) {
            let d = haversine_m(&a, &b);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_M + 1e-6);
        }
    }
}
