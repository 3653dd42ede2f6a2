// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Sensor contracts.
//!
//! Sensors are pull-based: each call returns the latest available sample or
//! nothing, and must not block past the transport's own configured timeout.

use crate::fix::{self, PositionFix};
use crate::vision::Frame;
use log::debug;
use std::io::BufRead;
use std::time::{Duration, Instant};

/// The positioning receiver.
pub trait PositioningSensor {
    /// Establish the transport. Failure is non-fatal; the control loop has a
    /// documented fallback.
    fn connect(&mut self) -> bool;
    /// Latest valid fix, if one is available right now.
    fn try_read_fix(&mut self) -> Option<PositionFix>;
}

/// The camera.
pub trait VideoSource {
    /// Latest frame, if one is available right now.
    fn try_read_frame(&mut self) -> Option<Frame>;
    /// Release the capture handle.
    fn release(&mut self);
}

/// Positioning sensor over any line-oriented NMEA byte stream, typically a
/// serial device file.
#[derive(Debug)]
pub struct NmeaSensor<R: BufRead> {
    reader: R,
    line: String,
}

impl<R: BufRead> NmeaSensor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead> PositioningSensor for NmeaSensor<R> {
    fn connect(&mut self) -> bool {
        // The transport was opened by whoever constructed the reader.
        true
    }

    fn try_read_fix(&mut self) -> Option<PositionFix> {
        self.line.clear();
        match self.reader.read_line(&mut self.line) {
            Ok(0) => None,
            Ok(_) => fix::parse_sentence(&self.line),
            Err(e) => {
                debug!("positioning read failed: {e}");
                None
            }
        }
    }
}

/// Poll interval while waiting for the first fix.
const FIX_POLL: Duration = Duration::from_millis(200);

/// Wait for a fix, bounded by `timeout`. Used during Init; never blocks
/// indefinitely.
pub fn wait_for_fix(
    sensor: &mut (impl PositioningSensor + ?Sized),
    timeout: Duration,
) -> Option<PositionFix> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(fix) = sensor.try_read_fix() {
            return Some(fix);
        }
        if Instant::now() >= deadline {
            return None;
        }
        std::thread::sleep(FIX_POLL.min(timeout));
    }
}

#[cfg(test)]
mod test {
    use super::{wait_for_fix, NmeaSensor, PositioningSensor};
    use crate::fix::PositionFix;
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn nmea_sensor_skips_junk_lines() {
        let stream = "\
$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K\n\
garbage\n\
$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\n";
        let mut sensor = NmeaSensor::new(Cursor::new(stream));

        assert!(sensor.try_read_fix().is_none());
        assert!(sensor.try_read_fix().is_none());
        let fix = sensor.try_read_fix().expect("third line carries a fix");
        assert!((fix.latitude - 48.1173).abs() < 1e-4);
        // Stream exhausted.
        assert!(sensor.try_read_fix().is_none());
    }

    struct NeverFixes;

    impl PositioningSensor for NeverFixes {
        fn connect(&mut self) -> bool {
            false
        }
        fn try_read_fix(&mut self) -> Option<PositionFix> {
            None
        }
    }

    #[test]
    fn wait_for_fix_times_out() {
        let start = std::time::Instant::now();
        assert!(wait_for_fix(&mut NeverFixes, Duration::from_millis(20)).is_none());
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn wait_for_fix_returns_first_fix() {
        let mut sensor = NmeaSensor::new(Cursor::new(
            "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\n",
        ));
        assert!(wait_for_fix(&mut sensor, Duration::from_millis(20)).is_some());
    }
}
