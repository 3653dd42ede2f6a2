// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Emulated vehicle hardware.
//!
//! Drop-in stand-ins for the positioning receiver, the camera, the actuator
//! board and the report collector, so the full control loop runs on a
//! development host with no devices attached.

use log::info;
use std::hash::{BuildHasher as _, Hasher as _, RandomState};
use std::ops::Range;
use std::sync::{Arc, Mutex};
use swv::actuator::{ActuatorGateway, Side, Travel};
use swv::error::Error;
use swv::fix::PositionFix;
use swv::report::{IncidentReport, ReportClient};
use swv::sensor::{PositioningSensor, VideoSource};
use swv::vision::Frame;

const FRAME_WIDTH: usize = 320;
const FRAME_HEIGHT: usize = 240;

/// Emulated positioning receiver
///
/// Produces a fix on every read, drifting away from the base coordinate as a
/// random walk. Roughly 0.00005 degrees of latitude is 5.5 m, so the default
/// drift makes the odometer accumulate distance at a plausible walking pace.
#[derive(Debug)]
pub struct SimPositioning {
    fix: PositionFix,
    // Local state for pseudo-random output generation
    max_delta_deg: f64,
}

impl SimPositioning {
    pub fn new(base: PositionFix) -> Self {
        Self {
            fix: base,
            max_delta_deg: 0.00005,
        }
    }
}

impl PositioningSensor for SimPositioning {
    fn connect(&mut self) -> bool {
        true
    }

    fn try_read_fix(&mut self) -> Option<PositionFix> {
        self.fix = PositionFix::new(
            random_walk_float(self.fix.latitude, 1.0, self.max_delta_deg),
            random_walk_float(self.fix.longitude, 1.0, self.max_delta_deg),
        );
        Some(self.fix)
    }
}

/// Emulated camera
///
/// Renders a mid-gray road scene with one dark obstacle whose horizontal
/// position random-walks across the frame, giving the detection pipeline
/// something to chew on.
#[derive(Debug)]
pub struct SimCamera {
    // Local state for pseudo-random output generation
    obstacle_x: usize,
    released: bool,
}

impl SimCamera {
    pub fn new() -> Self {
        Self {
            obstacle_x: FRAME_WIDTH / 2,
            released: false,
        }
    }
}

impl Default for SimCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSource for SimCamera {
    fn try_read_frame(&mut self) -> Option<Frame> {
        if self.released {
            return None;
        }
        self.obstacle_x = random_walk_integer(self.obstacle_x, 0.8, 12)
            .min(FRAME_WIDTH - OBSTACLE_SIZE);

        let mut frame = Frame::filled(FRAME_WIDTH, FRAME_HEIGHT, 128);
        frame.fill_rect(self.obstacle_x, 150, OBSTACLE_SIZE, OBSTACLE_SIZE, 20);
        if gen_random_in_range(0..100) < 20 {
            draw_person_silhouette(&mut frame);
        }
        Some(frame)
    }

    fn release(&mut self) {
        self.released = true;
    }
}

const OBSTACLE_SIZE: usize = 60;

/// High-contrast vertical stripe flanks, the kind of edge profile the person
/// detector keys on.
fn draw_person_silhouette(frame: &mut Frame) {
    const PERSON_X: usize = 200;
    const PERSON_Y: usize = 60;
    for band in [8usize..16, 48..56] {
        for xx in band {
            if (xx / 2) % 2 == 0 {
                frame.fill_rect(PERSON_X + xx, PERSON_Y, 1, 128, 235);
            }
        }
    }
}

/// Actuator gateway that logs and records every command instead of driving
/// hardware.
#[derive(Debug, Clone, Default)]
pub struct SimGateway {
    commands: Arc<Mutex<Vec<String>>>,
}

impl SimGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command received so far, in order.
    pub fn commands(&self) -> Vec<String> {
        match self.commands.lock() {
            Ok(commands) => commands.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, command: String) {
        info!("sim actuator: {command}");
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command);
        }
    }
}

impl ActuatorGateway for SimGateway {
    fn set_travel(&mut self, direction: Travel, speed: u8) {
        self.record(format!("travel {direction:?} at {speed}"));
    }

    fn turn(&mut self, side: Side, speed: u8) {
        self.record(format!("turn {side:?} at {speed}"));
    }

    fn raise_sign(&mut self) {
        self.record("sign up".into());
    }

    fn lower_sign(&mut self) {
        self.record("sign down".into());
    }

    fn play_alarm(&mut self, duration_secs: u32) {
        self.record(format!("alarm for {duration_secs} s"));
    }

    fn set_warning_light(&mut self, brightness: u8) {
        self.record(format!("warning light {brightness}"));
    }

    fn close(&mut self) {
        self.record("closed".into());
    }
}

/// Report collector that logs each report as JSON.
#[derive(Debug, Default)]
pub struct LoggingCollector;

impl ReportClient for LoggingCollector {
    fn send(&mut self, report: &IncidentReport) -> Result<(), Error> {
        let json = serde_json::to_string(report)
            .map_err(|e| Error::Report(format!("report serialization failed: {e}")))?;
        info!("sim collector: {json}");
        Ok(())
    }
}

/// Report collector that retains every report, for inspection in tests and
/// demos.
#[derive(Debug, Clone, Default)]
pub struct MemoryCollector {
    reports: Arc<Mutex<Vec<IncidentReport>>>,
}

impl MemoryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<IncidentReport> {
        match self.reports.lock() {
            Ok(reports) => reports.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ReportClient for MemoryCollector {
    fn send(&mut self, report: &IncidentReport) -> Result<(), Error> {
        match self.reports.lock() {
            Ok(mut reports) => {
                reports.push(report.clone());
                Ok(())
            }
            Err(_) => Err(Error::Report("collector mutex poisoned".into())),
        }
    }
}

fn gen_random_in_range(range: Range<i64>) -> i64 {
    let rand = RandomState::new().build_hasher().finish();
    let rand = (rand % (i64::MAX as u64)) as i64;
    rand % (range.end - range.start + 1) + range.start
}

/// Random walk from `previous` with a probability of `change_prop` in a range of +/-`max_delta`
fn random_walk_float(previous: f64, change_prop: f64, max_delta: f64) -> f64 {
    if gen_random_in_range(0..100) as f64 / 100.0 < change_prop {
        const SCALE_FACTOR: f64 = 1_000_000.0;

        // Scale delta to work in integers
        let scaled_max_delta = (max_delta * SCALE_FACTOR) as i64;
        let scaled_delta = gen_random_in_range(-scaled_max_delta..scaled_max_delta) as f64;

        return previous + (scaled_delta / SCALE_FACTOR);
    }

    previous
}

/// Random walk from `previous` with a probability of `change_prop` in a range of +/-`max_delta`
fn random_walk_integer(previous: usize, change_prop: f64, max_delta: usize) -> usize {
    let max_delta = max_delta as i64;

    if gen_random_in_range(0..100) as f64 / 100.0 < change_prop {
        let delta = gen_random_in_range(-max_delta..max_delta);

        return i64::max(0, previous as i64 + delta) as usize;
    }

    previous
}

#[cfg(test)]
mod test {
    use super::{SimCamera, SimGateway, SimPositioning, FRAME_HEIGHT, FRAME_WIDTH};
    use swv::actuator::{ActuatorGateway, Travel};
    use swv::fix::PositionFix;
    use swv::sensor::{PositioningSensor, VideoSource};

    #[test]
    fn positioning_always_fixes_near_base() {
        let base = PositionFix::new(25.0330, 121.5654);
        let mut gps = SimPositioning::new(base);

        assert!(gps.connect());
        for _ in 0..50 {
            let fix = gps.try_read_fix().expect("sim always fixes");
            assert!((fix.latitude - base.latitude).abs() < 0.01);
            assert!((fix.longitude - base.longitude).abs() < 0.01);
        }
    }

    #[test]
    fn camera_frames_until_released() {
        let mut camera = SimCamera::new();
        let frame = camera.try_read_frame().expect("frame before release");
        assert_eq!(frame.width(), FRAME_WIDTH);
        assert_eq!(frame.height(), FRAME_HEIGHT);
        // The obstacle is darker than the road.
        assert!(frame.pixels().iter().any(|&p| p == 20));

        camera.release();
        assert!(camera.try_read_frame().is_none());
    }

    #[test]
    fn gateway_records_command_stream() {
        let mut gateway = SimGateway::new();
        gateway.set_travel(Travel::Backward, 60);
        gateway.raise_sign();
        gateway.close();

        assert_eq!(
            gateway.commands(),
            ["travel Backward at 60", "sign up", "closed"]
        );
    }
}
