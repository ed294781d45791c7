//! Append-only path history with a running distance total.

use crate::geo::{GeoPosition, haversine_m};

/// Ordered path of fixes plus the cumulative haversine distance.
///
/// Each append costs one segment computation; the total is never recomputed
/// from scratch. Samples are kept in arrival order and never sorted, so an
/// out-of-order timestamp only affects the segment it participates in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathAccumulator {
    points: Vec<GeoPosition>,
    total_m: f64,
}

impl PathAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fix and returns the length of the segment it closed.
    ///
    /// The first fix closes no segment and returns `0.0`.
    pub fn append(&mut self, position: GeoPosition) -> f64 {
        let segment = match self.points.last() {
            Some(last) => haversine_m(last, &position),
            None => 0.0,
        };
        self.total_m += segment;
        self.points.push(position);
        segment
    }

    /// Drops every fix and zeroes the total. Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.points.clear();
        self.total_m = 0.0;
    }

    pub fn total_distance_m(&self) -> f64 {
        self.total_m
    }

    pub fn points(&self) -> &[GeoPosition] {
        &self.points
    }

    pub fn last(&self) -> Option<&GeoPosition> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Extend<GeoPosition> for PathAccumulator {
    fn extend<I: IntoIterator<Item = GeoPosition>>(&mut self, iter: I) {
        for position in iter {
            self.append(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::path_distance;
    use proptest::prelude::*;

    fn pos(lat: f64, lon: f64, t: u64) -> GeoPosition {
        GeoPosition::new(lat, lon, t).unwrap()
    }

    #[test]
    fn first_sample_contributes_zero() {
        let mut path = PathAccumulator::new();
        assert_eq!(path.append(pos(10.0, 10.0, 0)), 0.0);
        assert_eq!(path.total_distance_m(), 0.0);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn duplicate_consecutive_positions_add_nothing() {
        let mut path = PathAccumulator::new();
        path.append(pos(1.0, 1.0, 0));
        path.append(pos(1.0, 1.0, 1000));
        path.append(pos(1.0, 1.0, 2000));
        assert_eq!(path.total_distance_m(), 0.0);
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn gps_jumps_are_kept_as_is() {
        let mut path = PathAccumulator::new();
        path.append(pos(0.0, 0.0, 0));
        let jump = path.append(pos(0.0, 1.0, 1000));
        assert!(jump > 100_000.0);
        assert_eq!(path.total_distance_m(), jump);
    }

    #[test]
    fn out_of_order_timestamps_keep_arrival_order() {
        let mut path = PathAccumulator::new();
        path.append(pos(0.0, 0.0, 2000));
        path.append(pos(0.0, 0.001, 1000));
        path.append(pos(0.0, 0.002, 3000));

        let times: Vec<u64> = path.points().iter().map(|p| p.captured_at_ms()).collect();
        assert_eq!(times, vec![2000, 1000, 3000]);
        assert!((path.total_distance_m() - path_distance(path.points())).abs() < 1e-9);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut path = PathAccumulator::new();
        path.extend([pos(0.0, 0.0, 0), pos(0.0, 0.01, 1)]);
        path.clear();
        path.clear();
        assert!(path.is_empty());
        assert_eq!(path.total_distance_m(), 0.0);
    }

    proptest! {
        /// Property: one-at-a-time accumulation matches a batch pass
        #[test]
        fn prop_incremental_matches_batch(
            coords in proptest::collection::vec((-60.0f64..60.0, -170.0f64..170.0), 0..64)
        ) {
            let points: Vec<GeoPosition> = coords
                .iter()
                .enumerate()
                .map(|(i, (lat, lon))| pos(*lat, *lon, i as u64 * 1000))
                .collect();

            let mut path = PathAccumulator::new();
            for p in &points {
                path.append(*p);
            }

            let batch = path_distance(&points);
            let tolerance = 1e-9 * batch.max(1.0);
            prop_assert!((path.total_distance_m() - batch).abs() <= tolerance);
            if points.len() <= 1 {
                prop_assert_eq!(path.total_distance_m(), 0.0);
            }
        }
    }
}
