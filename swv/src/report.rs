// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Incident reporting.
//!
//! Reports are best-effort: a send attempt, successful or not, is terminal.
//! The [ReportGate] limits how often attempts are made; only the mandatory
//! initial zero-injury report bypasses it, and even that records the attempt
//! so the cooldown starts immediately.

use crate::error::Error;
use crate::fix::PositionFix;
use serde::Serialize;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// One incident state sample, handed to the reporting collaborator and not
/// retained after the send attempt.
#[derive(Debug, Clone, Serialize)]
pub struct IncidentReport {
    pub latitude: f64,
    pub longitude: f64,
    /// Unix timestamp, seconds.
    pub timestamp: f64,
    /// Base64-encoded snapshot, when a frame was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub device_id: String,
    pub injured_count: u32,
}

impl IncidentReport {
    /// Build a report for `position`. `injured` is clamped to zero.
    pub fn new(position: PositionFix, device_id: &str, injured: i64) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs_f64();
        Self {
            latitude: position.latitude,
            longitude: position.longitude,
            timestamp,
            image: None,
            device_id: device_id.to_owned(),
            injured_count: injured.max(0) as u32,
        }
    }

    pub fn with_image(mut self, image: &[u8]) -> Self {
        self.image = Some(base64(image));
        self
    }
}

/// Transport towards the remote collector. Success and failure are both
/// terminal for the attempt; the core never retries.
pub trait ReportClient {
    fn send(&mut self, report: &IncidentReport) -> Result<(), Error>;
}

/// Cooldown gate for report attempts.
#[derive(Debug)]
pub struct ReportGate {
    cooldown: Duration,
    last_attempt: Option<Instant>,
}

impl ReportGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_attempt: None,
        }
    }

    /// Admit an attempt if the cooldown has elapsed since the last accepted
    /// one. Admission records the attempt; the outcome of the send does not
    /// matter.
    pub fn try_admit(&mut self, now: Instant) -> bool {
        let admit = match self.last_attempt {
            Some(last) => now.duration_since(last) >= self.cooldown,
            None => true,
        };
        if admit {
            self.last_attempt = Some(now);
        }
        admit
    }

    /// Record an attempt made outside the gate (the mandatory initial
    /// report).
    pub fn record(&mut self, now: Instant) {
        self.last_attempt = Some(now);
    }
}

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Standard base64 with padding.
pub fn base64(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let b = [chunk[0], *chunk.get(1).unwrap_or(&0), *chunk.get(2).unwrap_or(&0)];
        let n = u32::from_be_bytes([0, b[0], b[1], b[2]]);
        let chars = [
            BASE64_ALPHABET[(n >> 18 & 0x3f) as usize],
            BASE64_ALPHABET[(n >> 12 & 0x3f) as usize],
            BASE64_ALPHABET[(n >> 6 & 0x3f) as usize],
            BASE64_ALPHABET[(n & 0x3f) as usize],
        ];
        let keep = chunk.len() + 1;
        for (i, c) in chars.into_iter().enumerate() {
            out.push(if i < keep { c as char } else { '=' });
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::{base64, IncidentReport, ReportGate};
    use crate::fix::PositionFix;
    use std::time::{Duration, Instant};

    #[test]
    fn gate_cooldown_sequence() {
        // Sends at t=0 (bypassing), t=3, t=9, t=11: only t=0 and t=11 pass.
        let mut gate = ReportGate::new(Duration::from_secs(10));
        let t0 = Instant::now();

        gate.record(t0);
        assert!(!gate.try_admit(t0 + Duration::from_secs(3)));
        assert!(!gate.try_admit(t0 + Duration::from_secs(9)));
        assert!(gate.try_admit(t0 + Duration::from_secs(11)));
    }

    #[test]
    fn gate_admits_first_attempt() {
        let mut gate = ReportGate::new(Duration::from_secs(10));
        assert!(gate.try_admit(Instant::now()));
    }

    #[test]
    fn denied_attempt_does_not_reset_cooldown() {
        let mut gate = ReportGate::new(Duration::from_secs(10));
        let t0 = Instant::now();
        gate.record(t0);
        // Repeated denied probes must not push the window out.
        for s in 1..10 {
            assert!(!gate.try_admit(t0 + Duration::from_secs(s)));
        }
        assert!(gate.try_admit(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn injured_count_clamped() {
        let report = IncidentReport::new(PositionFix::new(25.0, 121.5), "vehicle_001", -3);
        assert_eq!(report.injured_count, 0);
    }

    #[test]
    fn report_serializes_expected_fields() {
        let report = IncidentReport::new(PositionFix::new(25.0, 121.5), "vehicle_001", 2)
            .with_image(b"abc");
        let json = serde_json::to_value(&report).expect("report serializes");

        assert_eq!(json["latitude"], 25.0);
        assert_eq!(json["longitude"], 121.5);
        assert_eq!(json["device_id"], "vehicle_001");
        assert_eq!(json["injured_count"], 2);
        assert_eq!(json["image"], "YWJj");
    }

    #[test]
    fn image_field_omitted_without_snapshot() {
        let report = IncidentReport::new(PositionFix::new(25.0, 121.5), "vehicle_001", 0);
        let json = serde_json::to_string(&report).expect("report serializes");
        assert!(!json.contains("image"));
    }

    #[test]
    fn base64_vectors() {
        assert_eq!(base64(b""), "");
        assert_eq!(base64(b"f"), "Zg==");
        assert_eq!(base64(b"fo"), "Zm8=");
        assert_eq!(base64(b"foo"), "Zm9v");
        assert_eq!(base64(b"foob"), "Zm9vYg==");
        assert_eq!(base64(b"foobar"), "Zm9vYmFy");
    }
}
