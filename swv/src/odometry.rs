// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! GPS-based odometry.
//!
//! The [Odometer] folds a stream of [PositionFix] samples into a cumulative
//! traveled distance and a distance from the incident anchor. Invalid or
//! absent samples never change state, so the cumulative distance is
//! monotonically non-decreasing for the lifetime of one run.

use crate::fix::PositionFix;

/// Mean Earth radius in meters, for the great-circle distance.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle (haversine) distance between two fixes, in meters.
///
/// Symmetric, non-negative and zero for identical points.
pub fn haversine_m(a: PositionFix, b: PositionFix) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Converts consecutive position fixes into traveled distance.
#[derive(Debug, Default)]
pub struct Odometer {
    anchor: Option<PositionFix>,
    last_sample: Option<PositionFix>,
    cumulative_m: f64,
}

impl Odometer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `fix` as the incident anchor and the last sample, resetting the
    /// cumulative distance. Fails without touching prior state if no valid
    /// fix is available.
    pub fn set_anchor(&mut self, fix: Option<PositionFix>) -> bool {
        match fix.filter(PositionFix::is_valid) {
            Some(fix) => {
                self.anchor = Some(fix);
                self.last_sample = Some(fix);
                self.cumulative_m = 0.0;
                true
            }
            None => false,
        }
    }

    /// Advance the cumulative distance by the segment between the last sample
    /// and `fix`. An invalid or absent fix changes nothing; the first valid
    /// fix only seeds the last sample. Returns the cumulative distance.
    pub fn advance(&mut self, fix: Option<PositionFix>) -> f64 {
        if let Some(fix) = fix.filter(PositionFix::is_valid) {
            if let Some(last) = self.last_sample {
                self.cumulative_m += haversine_m(last, fix);
            }
            self.last_sample = Some(fix);
        }
        self.cumulative_m
    }

    /// Distance between the anchor and `current`, or the cumulative distance
    /// as a conservative fallback when no current fix is available.
    pub fn distance_from_anchor(&self, current: Option<PositionFix>) -> f64 {
        match (self.anchor, current.filter(PositionFix::is_valid)) {
            (Some(anchor), Some(current)) => haversine_m(anchor, current),
            _ => self.cumulative_m,
        }
    }

    pub fn anchor(&self) -> Option<PositionFix> {
        self.anchor
    }

    pub fn cumulative_m(&self) -> f64 {
        self.cumulative_m
    }
}

#[cfg(test)]
mod test {
    use super::{haversine_m, Odometer};
    use crate::fix::PositionFix;

    const A: PositionFix = PositionFix::new(25.0330, 121.5654);
    // Roughly 111 m north of A (0.001 degrees of latitude).
    const B: PositionFix = PositionFix::new(25.0340, 121.5654);
    const C: PositionFix = PositionFix::new(25.0350, 121.5654);

    #[test]
    fn haversine_zero_for_identical_points() {
        assert_eq!(haversine_m(A, A), 0.0);
    }

    #[test]
    fn haversine_symmetric() {
        assert!((haversine_m(A, B) - haversine_m(B, A)).abs() < 1e-9);
    }

    #[test]
    fn haversine_one_millidegree_latitude() {
        let d = haversine_m(A, B);
        assert!((d - 111.2).abs() < 1.0, "got {d}");
    }

    #[test]
    fn anchor_requires_valid_fix() {
        let mut odo = Odometer::new();
        assert!(!odo.set_anchor(None));
        assert!(!odo.set_anchor(Some(PositionFix::new(0.0, 0.0))));
        assert!(odo.anchor().is_none());
        assert!(odo.set_anchor(Some(A)));
        assert_eq!(odo.anchor(), Some(A));
        assert_eq!(odo.cumulative_m(), 0.0);
    }

    #[test]
    fn distance_is_monotonic_and_sums_segments() {
        let mut odo = Odometer::new();
        assert!(odo.set_anchor(Some(A)));

        let d1 = odo.advance(Some(B));
        let d2 = odo.advance(Some(C));
        assert!(d1 > 0.0);
        assert!(d2 >= d1);

        let expected = haversine_m(A, B) + haversine_m(B, C);
        assert!((d2 - expected).abs() < 1e-9);
    }

    #[test]
    fn invalid_fix_is_a_no_op() {
        let mut odo = Odometer::new();
        odo.set_anchor(Some(A));
        let before = odo.advance(Some(B));

        assert_eq!(odo.advance(None), before);
        assert_eq!(odo.advance(Some(PositionFix::new(0.0, 0.0))), before);
        // The last sample is untouched too: advancing to C still measures B->C.
        let after = odo.advance(Some(C));
        assert!((after - before - haversine_m(B, C)).abs() < 1e-9);
    }

    #[test]
    fn first_valid_fix_only_seeds_last_sample() {
        let mut odo = Odometer::new();
        assert_eq!(odo.advance(Some(A)), 0.0);
        assert!(odo.advance(Some(B)) > 0.0);
    }

    #[test]
    fn distance_from_anchor_matches_geodesic() {
        let mut odo = Odometer::new();
        odo.set_anchor(Some(A));
        odo.advance(Some(B));

        let d = odo.distance_from_anchor(Some(B));
        assert!((d - haversine_m(A, B)).abs() < 1e-9);
        assert_eq!(odo.distance_from_anchor(Some(A)), 0.0);
    }

    #[test]
    fn distance_from_anchor_falls_back_to_cumulative() {
        let mut odo = Odometer::new();
        odo.set_anchor(Some(A));
        let traveled = odo.advance(Some(B));
        assert_eq!(odo.distance_from_anchor(None), traveled);
    }
}
