// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! SWV is the onboard control stack of an unmanned safety warning vehicle.
//!
//! The vehicle is dropped behind a road incident, backs away from it to a
//! road-type-dependent safe distance while steering around obstacles, watches
//! its camera for injured persons and reports the incident state to a remote
//! collector while raising physical warning signals.
//!
//! # Sensing
//!
//! Positioning arrives as NMEA sentences ([fix]) and is folded into traveled
//! distance by the [odometry] module. Camera frames are plain grayscale
//! buffers ([vision::Frame]); obstacle and person detection are pluggable
//! strategies behind the [vision::ObstacleDetector] and
//! [vision::PersonDetector] traits.
//!
//! # Acting
//!
//! Motion and signaling commands go through the [actuator::ActuatorGateway]
//! capability interface; incident updates go through [report::ReportClient],
//! rate limited by the [report::ReportGate].
//!
//! # Orchestration
//!
//! [control::SafetyControlLoop] sequences the mission as a state machine
//! `Init -> AnchorSet -> Monitoring -> Terminated` with a fixed tick period.
//! A second thread ([stream]) may pull frames from the same camera for remote
//! viewing; camera access is serialized behind one mutex.

pub mod actuator;
pub mod config;
pub mod control;
pub mod error;
pub mod fix;
pub mod odometry;
pub mod planner;
pub mod report;
pub mod sensor;
pub mod stream;
pub mod vision;

/// Re-export the public API
pub mod prelude {
    pub use crate::actuator::{ActuatorGateway, LineGateway, Side, Travel};
    pub use crate::config::VehicleConfig;
    pub use crate::control::{Phase, SafetyControlLoop};
    pub use crate::error::Error;
    pub use crate::fix::PositionFix;
    pub use crate::odometry::Odometer;
    pub use crate::planner::{plan, Decision};
    pub use crate::report::{IncidentReport, ReportClient, ReportGate};
    pub use crate::sensor::{PositioningSensor, VideoSource};
    pub use crate::vision::{Frame, ObstacleDetector, PersonDetector, Region};
}
