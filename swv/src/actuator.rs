// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Actuator gateway.
//!
//! All physical motion and signaling goes through the [ActuatorGateway]
//! capability interface. Calls are fire-and-forget: the state machine never
//! depends on an acknowledgement, out-of-range numeric inputs are clamped,
//! and a failing capability is logged without aborting its siblings.

use log::warn;
use std::io::Write;

/// Travel direction for the drive train.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Travel {
    Forward,
    Backward,
    Stop,
}

/// Turning side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Discrete capability calls towards the vehicle hardware.
pub trait ActuatorGateway {
    /// Drive in `direction` at `speed` percent (clamped to 0..=100).
    fn set_travel(&mut self, direction: Travel, speed: u8);
    /// Turn towards `side` at `speed` percent (clamped to 0..=100).
    fn turn(&mut self, side: Side, speed: u8);
    fn raise_sign(&mut self);
    fn lower_sign(&mut self);
    /// Sound the alarm for at least one second.
    fn play_alarm(&mut self, duration_secs: u32);
    /// Warning light brightness, 0..=255.
    fn set_warning_light(&mut self, brightness: u8);
    /// Close the transport. Further calls are undefined but must not panic.
    fn close(&mut self);
}

/// Gateway speaking the controller board's one-line text protocol over any
/// byte sink (typically a serial device file):
///
/// - `M F 60` / `M B 40` / `M S 0` — travel forward/backward/stop at speed
/// - `M L 50` / `M R 50` — turn left/right at speed
/// - `S U` / `S D` — sign up / down
/// - `A P 3` — play alarm for 3 seconds
/// - `L S 255` — warning light brightness
#[derive(Debug)]
pub struct LineGateway<W: Write> {
    sink: W,
}

impl<W: Write> LineGateway<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    fn send(&mut self, command: &str) {
        let result = self
            .sink
            .write_all(command.as_bytes())
            .and_then(|()| self.sink.write_all(b"\n"))
            .and_then(|()| self.sink.flush());
        if let Err(e) = result {
            warn!("actuator command {command:?} failed: {e}");
        }
    }
}

impl<W: Write> ActuatorGateway for LineGateway<W> {
    fn set_travel(&mut self, direction: Travel, speed: u8) {
        let code = match direction {
            Travel::Forward => 'F',
            Travel::Backward => 'B',
            Travel::Stop => 'S',
        };
        self.send(&format!("M {code} {}", speed.min(100)));
    }

    fn turn(&mut self, side: Side, speed: u8) {
        let code = match side {
            Side::Left => 'L',
            Side::Right => 'R',
        };
        self.send(&format!("M {code} {}", speed.min(100)));
    }

    fn raise_sign(&mut self) {
        self.send("S U");
    }

    fn lower_sign(&mut self) {
        self.send("S D");
    }

    fn play_alarm(&mut self, duration_secs: u32) {
        self.send(&format!("A P {}", duration_secs.max(1)));
    }

    fn set_warning_light(&mut self, brightness: u8) {
        self.send(&format!("L S {brightness}"));
    }

    fn close(&mut self) {
        if let Err(e) = self.sink.flush() {
            warn!("actuator transport close failed: {e}");
        }
    }
}

#[cfg(test)]
mod test {
    use super::{ActuatorGateway, LineGateway, Side, Travel};

    fn lines(gateway: LineGateway<Vec<u8>>) -> Vec<String> {
        String::from_utf8(gateway.sink)
            .expect("protocol is ascii")
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn command_encoding() {
        let mut gateway = LineGateway::new(Vec::new());
        gateway.set_travel(Travel::Backward, 60);
        gateway.set_travel(Travel::Stop, 0);
        gateway.turn(Side::Left, 50);
        gateway.turn(Side::Right, 40);
        gateway.raise_sign();
        gateway.lower_sign();
        gateway.play_alarm(3);
        gateway.set_warning_light(255);

        assert_eq!(
            lines(gateway),
            ["M B 60", "M S 0", "M L 50", "M R 40", "S U", "S D", "A P 3", "L S 255"]
        );
    }

    struct BrokenPipe;

    impl std::io::Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn transport_failure_never_panics() {
        let mut gateway = LineGateway::new(BrokenPipe);
        gateway.set_travel(Travel::Stop, 0);
        gateway.raise_sign();
        gateway.play_alarm(3);
        gateway.close();
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let mut gateway = LineGateway::new(Vec::new());
        gateway.set_travel(Travel::Forward, 255);
        gateway.turn(Side::Left, 101);
        gateway.play_alarm(0);

        assert_eq!(lines(gateway), ["M F 100", "M L 100", "A P 1"]);
    }
}
