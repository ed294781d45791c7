//! Douglas-Peucker path reduction.
//!
//! Deviation is measured in meters on a local equirectangular projection
//! centered on the first point, which is accurate well below GPS noise for
//! run-sized paths. Both endpoints are always kept, and so is the point that
//! deviates most from the chord of the whole path.

use crate::geo::{EARTH_RADIUS_M, GeoPosition};

/// Upper bound on tolerance doublings in [`simplify_to_budget`].
const MAX_DOUBLINGS: usize = 40;

/// Outcome of [`simplify_to_budget`].
#[derive(Clone, Debug, PartialEq)]
pub struct Simplified {
    pub points: Vec<GeoPosition>,
    /// Tolerance that produced `points`; `None` if the path was kept as-is.
    pub tolerance_m: Option<f64>,
}

impl Simplified {
    pub fn is_simplified(&self) -> bool {
        self.tolerance_m.is_some()
    }
}

/// Reduces `points` so that no dropped point lies farther than `tolerance_m`
/// from the simplified polyline.
pub fn simplify(points: &[GeoPosition], tolerance_m: f64) -> Vec<GeoPosition> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let projected = project(points);
    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    // The global farthest point is retained regardless of tolerance.
    if let Some((index, deviation)) = farthest(&projected, 0, last)
        && deviation > 0.0
    {
        keep[index] = true;
    }

    let mut stack = vec![(0usize, last)];
    while let Some((first, end)) = stack.pop() {
        let Some((index, deviation)) = farthest(&projected, first, end) else {
            continue;
        };
        if deviation > tolerance_m || keep[index] {
            keep[index] = true;
            stack.push((first, index));
            stack.push((index, end));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Keeps the full path when it fits in `max_points`; otherwise simplifies with
/// a tolerance that starts at `initial_tolerance_m` and doubles until it fits.
pub fn simplify_to_budget(
    points: &[GeoPosition],
    max_points: usize,
    initial_tolerance_m: f64,
) -> Simplified {
    let max_points = max_points.max(3);
    if points.len() <= max_points {
        return Simplified {
            points: points.to_vec(),
            tolerance_m: None,
        };
    }

    let mut tolerance = initial_tolerance_m.max(0.1);
    let mut reduced = simplify(points, tolerance);
    for _ in 0..MAX_DOUBLINGS {
        if reduced.len() <= max_points {
            break;
        }
        tolerance *= 2.0;
        reduced = simplify(points, tolerance);
    }

    Simplified {
        points: reduced,
        tolerance_m: Some(tolerance),
    }
}

fn project(points: &[GeoPosition]) -> Vec<(f64, f64)> {
    let origin = points[0];
    let cos_lat = origin.latitude().to_radians().cos();
    points
        .iter()
        .map(|p| {
            let x = (p.longitude() - origin.longitude()).to_radians() * cos_lat * EARTH_RADIUS_M;
            let y = (p.latitude() - origin.latitude()).to_radians() * EARTH_RADIUS_M;
            (x, y)
        })
        .collect()
}

/// Index and deviation of the point between `first` and `end` (exclusive)
/// farthest from the segment joining them.
fn farthest(projected: &[(f64, f64)], first: usize, end: usize) -> Option<(usize, f64)> {
    (first + 1..end)
        .map(|i| (i, segment_distance(projected[i], projected[first], projected[end])))
        .fold(None, |best, (i, d)| match best {
            Some((_, best_d)) if best_d >= d => best,
            _ => Some((i, d)),
        })
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return ((p.0 - a.0).powi(2) + (p.1 - a.1).powi(2)).sqrt();
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(lat: f64, lon: f64, t: u64) -> GeoPosition {
        GeoPosition::new(lat, lon, t).unwrap()
    }

    /// Straight eastward line along the equator with a single spike.
    fn line_with_spike(n: usize, spike_at: usize) -> Vec<GeoPosition> {
        (0..n)
            .map(|i| {
                let lat = if i == spike_at { 0.001 } else { 0.0 };
                pos(lat, i as f64 * 0.0001, i as u64 * 1000)
            })
            .collect()
    }

    #[test]
    fn short_paths_are_untouched() {
        let points = vec![pos(0.0, 0.0, 0), pos(1.0, 1.0, 1)];
        assert_eq!(simplify(&points, 1000.0), points);
    }

    #[test]
    fn collinear_points_collapse_to_endpoints() {
        let points: Vec<_> = (0..50).map(|i| pos(0.0, i as f64 * 0.0001, i)).collect();
        let reduced = simplify(&points, 1.0);
        assert_eq!(reduced.len(), 2);
        assert_eq!(reduced[0], points[0]);
        assert_eq!(reduced[1], points[49]);
    }

    #[test]
    fn spike_survives_simplification() {
        let points = line_with_spike(100, 40);
        let reduced = simplify(&points, 5.0);
        assert!(reduced.contains(&points[40]));
        assert_eq!(reduced.first(), points.first());
        assert_eq!(reduced.last(), points.last());
    }

    #[test]
    fn farthest_point_kept_even_below_tolerance() {
        let points = line_with_spike(10, 3);
        // Spike is ~111 m off the line; tolerance far larger.
        let reduced = simplify(&points, 10_000.0);
        assert_eq!(reduced, vec![points[0], points[3], points[9]]);
    }

    #[test]
    fn budget_keeps_full_path_when_it_fits() {
        let points = line_with_spike(20, 5);
        let out = simplify_to_budget(&points, 20, 5.0);
        assert!(!out.is_simplified());
        assert_eq!(out.points, points);
    }

    #[test]
    fn budget_is_met_with_endpoints_and_spike() {
        // A noisy zigzag that cannot be reduced at small tolerances.
        let mut points: Vec<_> = (0..500)
            .map(|i| {
                let lat = if i % 2 == 0 { 0.0 } else { 0.00005 };
                pos(lat, i as f64 * 0.0001, i as u64)
            })
            .collect();
        points[250] = pos(0.01, 250.0 * 0.0001, 250);

        let out = simplify_to_budget(&points, 50, 1.0);
        assert!(out.is_simplified());
        assert!(out.points.len() <= 50);
        assert_eq!(out.points.first(), points.first());
        assert_eq!(out.points.last(), points.last());
        assert!(out.points.contains(&points[250]));
    }

    #[test]
    fn order_is_preserved() {
        let points = line_with_spike(200, 120);
        let reduced = simplify(&points, 0.5);
        let times: Vec<u64> = reduced.iter().map(|p| p.captured_at_ms()).collect();
        let mut sorted = times.clone();
        sorted.sort_unstable();
        assert_eq!(times, sorted);
    }
}
