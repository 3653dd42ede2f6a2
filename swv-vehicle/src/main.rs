// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Safety warning vehicle application.
//!
//! Wires the control loop to the configured transports: an NMEA serial
//! device for positioning, a line-protocol serial device for the actuator
//! board, a PGM file for the camera and a JSON-lines file for incident
//! reports. Every transport left unconfigured is replaced by its emulated
//! counterpart so the binary also runs on a development host.

use anyhow::{Context, Error};
use argh::FromArgs;
use log::{info, warn, LevelFilter};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use swv::actuator::{ActuatorGateway, LineGateway};
use swv::config::VehicleConfig;
use swv::control::SafetyControlLoop;
use swv::report::{IncidentReport, ReportClient};
use swv::sensor::{NmeaSensor, PositioningSensor, VideoSource};
use swv::stream::{FrameSink, Streamer};
use swv::vision::{EdgeObstacleDetector, Frame, HogPersonDetector};
use swv_sim::{LoggingCollector, SimCamera, SimGateway, SimPositioning};

/// Frame period of the preview stream.
const PREVIEW_PERIOD: Duration = Duration::from_millis(200);

#[derive(FromArgs)]
#[argh(help_triggers("-h", "--help", "help"))]
/// Safety warning vehicle
struct Args {
    #[argh(description = "road speed limit in km/h, selects the retreat distance")]
    #[argh(option, short = 's')]
    speed_limit: Option<u32>,

    #[argh(description = "NMEA positioning device path (emulated when omitted)")]
    #[argh(option)]
    gps_device: Option<PathBuf>,

    #[argh(description = "actuator board device path (emulated when omitted)")]
    #[argh(option)]
    actuator_device: Option<PathBuf>,

    #[argh(description = "PGM file refreshed by the capture service (emulated when omitted)")]
    #[argh(option)]
    camera_path: Option<PathBuf>,

    #[argh(description = "append incident reports to this JSON-lines file (logged when omitted)")]
    #[argh(option)]
    report_path: Option<PathBuf>,

    #[argh(description = "write the latest annotated frame to this file for remote preview")]
    #[argh(option)]
    preview_path: Option<PathBuf>,

    #[argh(description = "log level")]
    #[argh(option, short = 'l')]
    log_level: Option<LevelFilter>,
}

fn main() -> Result<(), Error> {
    let args: Args = argh::from_env();
    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.unwrap_or(LevelFilter::Info))
        .init();

    let config = config_from_env();
    info!("starting safety warning vehicle {}", config.device_id);

    let gps = open_positioning(&args, &config)?;
    let video = open_video(&args);
    let gateway = open_gateway(&args)?;
    let reporter = open_reporter(&args)?;

    let mut control = SafetyControlLoop::new(
        config.clone(),
        gps,
        video,
        Box::new(EdgeObstacleDetector::new(&config)),
        Box::new(HogPersonDetector::new(&config)),
        gateway,
        reporter,
    );

    install_signal_handlers(control.running_flag());

    let streamer = args.preview_path.map(|path| {
        let streamer = Streamer::spawn(
            control.video_handle(),
            Arc::new(HogPersonDetector::new(&config)),
            PreviewSink { path },
            PREVIEW_PERIOD,
        );
        streamer.set_overlay(true);
        streamer
    });

    let result = control.run(args.speed_limit);
    if let Some(streamer) = streamer {
        streamer.stop();
    }
    result.context("control loop failed")?;
    Ok(())
}

fn open_positioning(
    args: &Args,
    config: &VehicleConfig,
) -> Result<Box<dyn PositioningSensor + Send>, Error> {
    let device = args
        .gps_device
        .clone()
        .or_else(|| std::env::var_os("GPS_SERIAL_PORT").map(PathBuf::from));
    match device {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("failed to open positioning device {}", path.display()))?;
            info!("positioning from {}", path.display());
            Ok(Box::new(NmeaSensor::new(BufReader::new(file))))
        }
        None => {
            info!("no positioning device configured, emulating");
            Ok(Box::new(SimPositioning::new(config.fallback_anchor)))
        }
    }
}

fn open_video(args: &Args) -> Arc<Mutex<dyn VideoSource + Send>> {
    match &args.camera_path {
        Some(path) => {
            info!("camera frames from {}", path.display());
            Arc::new(Mutex::new(PgmCamera { path: path.clone() }))
        }
        None => {
            info!("no camera configured, emulating");
            Arc::new(Mutex::new(SimCamera::new()))
        }
    }
}

fn open_gateway(args: &Args) -> Result<Box<dyn ActuatorGateway + Send>, Error> {
    let device = args
        .actuator_device
        .clone()
        .or_else(|| std::env::var_os("ACTUATOR_PORT").map(PathBuf::from));
    match &device {
        Some(path) => {
            let file = OpenOptions::new()
                .write(true)
                .open(path)
                .with_context(|| format!("failed to open actuator device {}", path.display()))?;
            info!("actuators on {}", path.display());
            Ok(Box::new(LineGateway::new(file)))
        }
        None => {
            info!("no actuator device configured, emulating");
            Ok(Box::new(SimGateway::new()))
        }
    }
}

fn open_reporter(args: &Args) -> Result<Box<dyn ReportClient + Send>, Error> {
    match &args.report_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open report file {}", path.display()))?;
            info!("incident reports appended to {}", path.display());
            Ok(Box::new(JsonLinesReporter {
                sink: BufWriter::new(file),
            }))
        }
        None => {
            info!("no report file configured, logging reports");
            Ok(Box::new(LoggingCollector))
        }
    }
}

/// Camera backed by a PGM file some capture service keeps refreshing. A
/// missing or half-written file is simply "no frame this tick".
struct PgmCamera {
    path: PathBuf,
}

impl VideoSource for PgmCamera {
    fn try_read_frame(&mut self) -> Option<Frame> {
        let bytes = std::fs::read(&self.path).ok()?;
        Frame::from_pgm(&bytes)
    }

    fn release(&mut self) {}
}

/// Appends each report as one JSON line.
struct JsonLinesReporter {
    sink: BufWriter<File>,
}

impl ReportClient for JsonLinesReporter {
    fn send(&mut self, report: &IncidentReport) -> Result<(), swv::error::Error> {
        let line = serde_json::to_string(report)
            .map_err(|e| swv::error::Error::Report(format!("report serialization failed: {e}")))?;
        self.sink
            .write_all(line.as_bytes())
            .and_then(|()| self.sink.write_all(b"\n"))
            .and_then(|()| self.sink.flush())
            .map_err(|e| swv::error::Error::Report(format!("report write failed: {e}")))
    }
}

/// Publishes the latest streamed frame by overwriting one file.
struct PreviewSink {
    path: PathBuf,
}

impl FrameSink for PreviewSink {
    fn push(&mut self, frame: &Frame) {
        if let Err(e) = std::fs::write(&self.path, frame.to_pgm()) {
            warn!("preview write failed: {e}");
        }
    }
}

/// Overrides from the deployment environment, on top of the shipped
/// defaults.
fn config_from_env() -> VehicleConfig {
    let mut config = VehicleConfig::default();
    if let Ok(id) = std::env::var("DEVICE_ID") {
        config.device_id = id;
    }
    if let Some(area) = parse_env("OBSTACLE_MIN_AREA") {
        config.obstacle_min_area = area;
    }
    if let Some(confidence) = parse_env("VISION_CONFIDENCE_THRESHOLD") {
        config.person_confidence = confidence;
    }
    if let Some(m) = parse_env("HIGHWAY_DISTANCE_M") {
        config.highway_distance_m = m;
    }
    if let Some(m) = parse_env("EXPRESSWAY_DISTANCE_M") {
        config.expressway_distance_m = m;
    }
    if let Some(m) = parse_env("CITY_ROAD_DISTANCE_M") {
        config.city_road_distance_m = m;
    }
    if let Some(m) = parse_env("LOCAL_ROAD_DISTANCE_M") {
        config.local_road_distance_m = m;
    }
    if let Some(speed) = parse_env("SPEED_NORMAL") {
        config.speed_normal = speed;
    }
    if let Some(speed) = parse_env("SPEED_AVOID") {
        config.speed_avoid = speed;
    }
    if let Some(secs) = parse_env::<u64>("REPORT_COOLDOWN_SECS") {
        config.report_cooldown = Duration::from_secs(secs);
    }
    config
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("ignoring unparsable {key}={value}");
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::{open_gateway, open_reporter, open_video, Args};
    use swv::sensor::VideoSource as _;

    fn no_device_args() -> Args {
        Args {
            speed_limit: None,
            gps_device: None,
            actuator_device: None,
            camera_path: None,
            report_path: None,
            preview_path: None,
            log_level: None,
        }
    }

    #[test]
    fn unconfigured_transports_fall_back_to_emulation() {
        let args = no_device_args();
        assert!(open_gateway(&args).is_ok());
        assert!(open_reporter(&args).is_ok());

        let video = open_video(&args);
        let frame = video.lock().expect("camera lock").try_read_frame();
        assert!(frame.is_some());
    }
}

static RUNNING: OnceLock<Arc<AtomicBool>> = OnceLock::new();

extern "C" fn handle_signal(_signal: libc::c_int) {
    if let Some(flag) = RUNNING.get() {
        flag.store(false, Ordering::SeqCst);
    }
}

fn install_signal_handlers(flag: Arc<AtomicBool>) {
    if RUNNING.set(flag).is_err() {
        return;
    }
    // SAFETY: handle_signal only touches an atomic and the initialized
    // OnceLock.
    unsafe {
        libc::signal(libc::SIGINT, handle_signal as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handle_signal as libc::sighandler_t);
    }
}
