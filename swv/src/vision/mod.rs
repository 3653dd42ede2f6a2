// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Vision: frames, obstacle detection, person detection.
//!
//! Detectors are pluggable strategies behind the [ObstacleDetector] and
//! [PersonDetector] traits so the control loop and the avoidance planner can
//! be exercised with synthetic, deterministic detections. The default
//! implementations work on owned 8-bit grayscale [Frame] buffers.

pub mod frame;
pub mod obstacle;
mod ops;
pub mod overlay;
pub mod person;

pub use frame::{Frame, Region, RegionLabel};
pub use obstacle::{EdgeObstacleDetector, ObstacleDetector};
pub use person::{HogPersonDetector, PersonDetector};
