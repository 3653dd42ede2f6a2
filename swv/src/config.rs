// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Vehicle configuration.
//!
//! One immutable [VehicleConfig] is constructed at startup and passed by
//! reference into each component's constructor. The defaults mirror the field
//! configuration the vehicle ships with; the application binary may override
//! them from the environment before the loop is built.

use crate::fix::PositionFix;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct VehicleConfig {
    /// Identifier carried in every incident report.
    pub device_id: String,
    /// Anchor substituted when positioning never acquires a fix.
    pub fallback_anchor: PositionFix,
    /// Bounded wait for the first GPS fix during Init.
    pub gps_fix_timeout: Duration,
    /// Bounded wait for the first camera frame during Init. Fatal on expiry.
    pub video_init_timeout: Duration,
    /// Steady monitoring tick period.
    pub poll_period: Duration,
    /// Minimum spacing between accepted report attempts.
    pub report_cooldown: Duration,

    /// Minimum obstacle bounding-box area, in pixels.
    pub obstacle_min_area: usize,
    /// Horizontal attention band: obstacles whose center is further than this
    /// fraction of the frame width from the frame center are ignored.
    pub obstacle_center_band: f64,
    /// Person detections scoring below this are dropped.
    pub person_confidence: f64,

    /// Safe-distance table, meters, by road type.
    pub highway_distance_m: f64,
    pub expressway_distance_m: f64,
    pub city_road_distance_m: f64,
    pub local_road_distance_m: f64,

    /// Travel speeds, percent of full scale.
    pub speed_normal: u8,
    pub speed_avoid: u8,
    /// How long an avoidance turn is held before resuming baseline travel.
    pub avoid_turn_duration: Duration,
    /// Assumed travel speed for dead-reckoned progress while positioning is
    /// degraded, meters per second.
    pub assumed_speed_mps: f64,

    /// Alarm playback length on a person detection, seconds.
    pub alarm_duration_secs: u32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            device_id: "vehicle_001".into(),
            fallback_anchor: PositionFix::new(25.0330, 121.5654),
            gps_fix_timeout: Duration::from_secs(30),
            video_init_timeout: Duration::from_secs(5),
            poll_period: Duration::from_millis(200),
            report_cooldown: Duration::from_secs(10),
            obstacle_min_area: 500,
            obstacle_center_band: 0.4,
            person_confidence: 0.5,
            highway_distance_m: 100.0,
            expressway_distance_m: 80.0,
            city_road_distance_m: 50.0,
            local_road_distance_m: 30.0,
            speed_normal: 60,
            speed_avoid: 50,
            avoid_turn_duration: Duration::from_secs(1),
            assumed_speed_mps: 0.5,
            alarm_duration_secs: 3,
        }
    }
}

impl VehicleConfig {
    /// Safe distance behind the incident for a road's speed limit (km/h).
    /// Faster roads need a longer buffer; an unknown limit is treated as a
    /// local road.
    pub fn target_distance(&self, speed_limit: Option<u32>) -> f64 {
        match speed_limit {
            Some(limit) if limit >= 100 => self.highway_distance_m,
            Some(limit) if limit > 60 => self.expressway_distance_m,
            Some(limit) if limit >= 50 => self.city_road_distance_m,
            _ => self.local_road_distance_m,
        }
    }
}

#[cfg(test)]
mod test {
    use super::VehicleConfig;

    #[test]
    fn target_distance_boundaries() {
        let config = VehicleConfig::default();
        let cases = [
            (Some(100), 100.0),
            (Some(130), 100.0),
            (Some(99), 80.0),
            (Some(61), 80.0),
            (Some(60), 50.0),
            (Some(50), 50.0),
            (Some(49), 30.0),
            (Some(30), 30.0),
            (None, 30.0),
        ];
        for (limit, expected) in cases {
            assert_eq!(config.target_distance(limit), expected, "limit {limit:?}");
        }
    }
}
