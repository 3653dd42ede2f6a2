// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! The safety control loop.
//!
//! One incident response is a single pass through the state machine
//! `Init -> AnchorSet -> Monitoring -> Terminated`; no transition re-enters
//! `Init`. The loop is single-threaded and cooperative: each tick is a
//! bounded unit of work followed by a fixed sleep, and a shared running flag
//! is checked every tick. Termination cleanup always runs, whether the loop
//! ends by stop signal or by error, and every cleanup step is guarded
//! independently of the others.

use crate::actuator::{ActuatorGateway, Side, Travel};
use crate::config::VehicleConfig;
use crate::error::Error;
use crate::odometry::Odometer;
use crate::planner::{self, Decision};
use crate::report::{IncidentReport, ReportClient, ReportGate};
use crate::sensor::{self, PositioningSensor, VideoSource};
use crate::vision::{Frame, ObstacleDetector, PersonDetector};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Control loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    AnchorSet,
    Monitoring,
    Terminated,
}

/// Poll interval while validating the video source during Init.
const VIDEO_POLL: Duration = Duration::from_millis(100);

/// Orchestrates one incident response.
pub struct SafetyControlLoop {
    config: VehicleConfig,
    gps: Box<dyn PositioningSensor + Send>,
    video: Arc<Mutex<dyn VideoSource + Send>>,
    obstacle_detector: Box<dyn ObstacleDetector + Send>,
    person_detector: Box<dyn PersonDetector + Send>,
    gateway: Box<dyn ActuatorGateway + Send>,
    reporter: Box<dyn ReportClient + Send>,
    odometer: Odometer,
    gate: ReportGate,
    running: Arc<AtomicBool>,
    phase: Phase,
    /// Whether the positioning sensor has ever produced a fix this run.
    gps_live: bool,
}

impl SafetyControlLoop {
    pub fn new(
        config: VehicleConfig,
        gps: Box<dyn PositioningSensor + Send>,
        video: Arc<Mutex<dyn VideoSource + Send>>,
        obstacle_detector: Box<dyn ObstacleDetector + Send>,
        person_detector: Box<dyn PersonDetector + Send>,
        gateway: Box<dyn ActuatorGateway + Send>,
        reporter: Box<dyn ReportClient + Send>,
    ) -> Self {
        let gate = ReportGate::new(config.report_cooldown);
        Self {
            config,
            gps,
            video,
            obstacle_detector,
            person_detector,
            gateway,
            reporter,
            odometer: Odometer::new(),
            gate,
            running: Arc::new(AtomicBool::new(true)),
            phase: Phase::Init,
            gps_live: false,
        }
    }

    /// Shared running flag; a signal handler stores `false` to request
    /// cooperative termination.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// The shared camera handle, for the streaming thread.
    pub fn video_handle(&self) -> Arc<Mutex<dyn VideoSource + Send>> {
        self.video.clone()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Execute the full incident response. Cleanup always runs; errors are
    /// surfaced to the caller afterwards.
    pub fn run(&mut self, speed_limit: Option<u32>) -> Result<(), Error> {
        let result = self.mission(speed_limit);
        self.terminate();
        result
    }

    fn mission(&mut self, speed_limit: Option<u32>) -> Result<(), Error> {
        self.init()?;
        self.set_anchor();
        self.initial_report();
        self.monitor(speed_limit);
        Ok(())
    }

    /// Acquire the sensors. Positioning is never fatal: it degrades to the
    /// configured fallback anchor. A video source that never produces a
    /// frame within the bounded validation window is.
    fn init(&mut self) -> Result<(), Error> {
        info!("initializing safety vehicle {}", self.config.device_id);

        if self.gps.connect() {
            match sensor::wait_for_fix(self.gps.as_mut(), self.config.gps_fix_timeout) {
                Some(fix) => {
                    self.gps_live = true;
                    info!("positioning acquired: {:.6}, {:.6}", fix.latitude, fix.longitude);
                }
                None => warn!("no position fix within timeout, running degraded"),
            }
        } else {
            warn!("positioning sensor unreachable, running degraded");
        }

        let deadline = Instant::now() + self.config.video_init_timeout;
        loop {
            if self.read_frame().is_some() {
                info!("video source validated");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::Video("no frame from video source during init"));
            }
            thread::sleep(VIDEO_POLL.min(self.config.video_init_timeout));
        }
    }

    /// Record the incident anchor, falling back to the configured coordinate
    /// so the rest of the loop proceeds deterministically. Never blocks.
    fn set_anchor(&mut self) {
        let fix = self.gps.try_read_fix();
        if fix.is_some() {
            self.gps_live = true;
        }
        if !self.odometer.set_anchor(fix) {
            warn!(
                "no valid fix for the incident anchor, using fallback {:.4}, {:.4}",
                self.config.fallback_anchor.latitude, self.config.fallback_anchor.longitude
            );
            self.odometer.set_anchor(Some(self.config.fallback_anchor));
        }
        self.phase = Phase::AnchorSet;
    }

    /// The mandatory zero-injury report: establishes the incident record
    /// immediately, bypassing the gate but still counting as an attempt.
    fn initial_report(&mut self) {
        let frame = self.read_frame();
        self.send_report(0, frame.as_ref());
        self.gate.record(Instant::now());
    }

    /// Steady loop: person monitoring every tick, interleaved with the
    /// movement sub-loop until the safe distance is reached. Ends on the
    /// stop signal.
    fn monitor(&mut self, speed_limit: Option<u32>) {
        self.phase = Phase::Monitoring;
        let target = self.config.target_distance(speed_limit);
        info!("monitoring; retreating to {target:.0} m");

        let mut moving = true;
        let mut dead_reckoned = 0.0f64;

        while self.running.load(Ordering::SeqCst) {
            let frame = self.read_frame();

            if let Some(frame) = &frame {
                let persons = self.person_detector.detect(frame);
                if !persons.is_empty() && self.gate.try_admit(Instant::now()) {
                    info!("{} person(s) in view, reporting", persons.len());
                    self.send_report(persons.len() as i64, Some(frame));
                    self.warn_surroundings();
                }
            }

            if moving {
                moving = self.movement_tick(frame.as_ref(), target, &mut dead_reckoned);
            }

            thread::sleep(self.config.poll_period);
        }
        info!("stop requested");
    }

    /// One tick of the movement sub-loop. Returns false once the target
    /// distance is reached and the single stop command has been issued.
    fn movement_tick(&mut self, frame: Option<&Frame>, target: f64, dead_reckoned: &mut f64) -> bool {
        match frame {
            Some(frame) => {
                let obstacles = self.obstacle_detector.detect(frame);
                match planner::plan(frame.width(), &obstacles) {
                    Decision::Forward => self
                        .gateway
                        .set_travel(Travel::Backward, self.config.speed_normal),
                    decision => self.avoid(decision),
                }
            }
            // An unreadable frame is "no detection this tick", keep going.
            None => self
                .gateway
                .set_travel(Travel::Backward, self.config.speed_normal),
        }

        let fix = self.gps.try_read_fix();
        if fix.is_some() {
            self.gps_live = true;
        }
        let traveled = self.odometer.advance(fix);

        // Without positioning the loop would retreat forever; estimate
        // progress from the configured travel speed instead.
        let progress = if self.gps_live {
            traveled
        } else {
            *dead_reckoned += self.config.assumed_speed_mps * self.config.poll_period.as_secs_f64();
            *dead_reckoned
        };
        debug!("retreat progress {progress:.1} / {target:.1} m");

        if progress >= target {
            info!("safe distance reached ({progress:.1} m), stopping");
            self.gateway.set_travel(Travel::Stop, 0);
            return false;
        }
        true
    }

    /// Timed turn towards the decided side, then resume baseline travel.
    fn avoid(&mut self, decision: Decision) {
        let side = match decision {
            Decision::Left => Side::Left,
            Decision::Right => Side::Right,
            Decision::Forward => return,
        };
        info!("obstacle ahead, avoiding towards {side:?}");
        self.gateway.turn(side, self.config.speed_avoid);
        thread::sleep(self.config.avoid_turn_duration);
        self.gateway
            .set_travel(Travel::Backward, self.config.speed_normal);
    }

    /// Raise the physical warnings. Each capability call is independent; the
    /// gateway logs failures instead of propagating them.
    fn warn_surroundings(&mut self) {
        self.gateway.raise_sign();
        self.gateway.play_alarm(self.config.alarm_duration_secs);
        self.gateway.set_warning_light(255);
    }

    fn send_report(&mut self, injured: i64, frame: Option<&Frame>) {
        let position = self
            .odometer
            .anchor()
            .unwrap_or(self.config.fallback_anchor);
        let mut report = IncidentReport::new(position, &self.config.device_id, injured);
        if let Some(frame) = frame {
            report = report.with_image(&frame.to_pgm());
        }
        match self.reporter.send(&report) {
            Ok(()) => info!("incident report sent (injured_count {})", report.injured_count),
            Err(e) => warn!("incident report failed: {e}"),
        }
    }

    /// Best-effort teardown; every step runs regardless of its siblings.
    fn terminate(&mut self) {
        info!("terminating");
        self.running.store(false, Ordering::SeqCst);
        self.phase = Phase::Terminated;

        self.gateway.set_travel(Travel::Stop, 0);
        self.gateway.lower_sign();
        match self.video.lock() {
            Ok(mut video) => video.release(),
            Err(poisoned) => {
                warn!("video mutex poisoned during cleanup");
                poisoned.into_inner().release();
            }
        }
        self.gateway.close();
        // The positioning sensor transport is released on drop.
        info!("shutdown complete");
    }

    fn read_frame(&self) -> Option<Frame> {
        match self.video.lock() {
            Ok(mut video) => video.try_read_frame(),
            Err(_) => {
                warn!("video mutex poisoned");
                None
            }
        }
    }
}
