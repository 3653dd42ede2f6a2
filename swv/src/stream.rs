// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Passive frame streaming for remote viewing.
//!
//! A second thread pulls "latest frame" from the same camera the control
//! loop uses. Both sides go through one `Mutex`, because concurrent reads
//! from a single capture handle are undefined; the mutex is the design-level
//! guarantee, not a convention. The streaming thread is read-only towards
//! the control loop: it only consumes frames and the detector it was handed
//! for the overlay toggle.

use crate::sensor::VideoSource;
use crate::vision::{overlay, Frame, PersonDetector};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Consumer of streamed frames (encoder, network server, recorder).
pub trait FrameSink: Send {
    fn push(&mut self, frame: &Frame);
}

/// Handle to the streaming thread.
pub struct Streamer {
    running: Arc<AtomicBool>,
    overlay: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Streamer {
    /// Spawn the streaming thread. `video` is the shared, mutex-guarded
    /// camera; `detector` is only consulted while the overlay is enabled.
    pub fn spawn(
        video: Arc<Mutex<dyn VideoSource + Send>>,
        detector: Arc<dyn PersonDetector + Send + Sync>,
        mut sink: impl FrameSink + 'static,
        period: Duration,
    ) -> Streamer {
        let running = Arc::new(AtomicBool::new(true));
        let overlay_on = Arc::new(AtomicBool::new(false));

        let thread_running = running.clone();
        let thread_overlay = overlay_on.clone();
        let handle = thread::Builder::new()
            .name("swv-stream".into())
            .spawn(move || {
                while thread_running.load(Ordering::Relaxed) {
                    let frame = match video.lock() {
                        Ok(mut video) => video.try_read_frame(),
                        Err(_) => {
                            warn!("video mutex poisoned, stopping stream");
                            break;
                        }
                    };

                    if let Some(frame) = frame {
                        if thread_overlay.load(Ordering::Relaxed) {
                            let persons = detector.detect(&frame);
                            sink.push(&overlay::draw_regions(&frame, &persons));
                        } else {
                            sink.push(&frame);
                        }
                    }
                    thread::sleep(period);
                }
                debug!("streaming thread stopped");
            })
            .expect("failed to spawn streaming thread");

        Streamer {
            running,
            overlay: overlay_on,
            handle: Some(handle),
        }
    }

    /// Toggle detection overlays on streamed frames.
    pub fn set_overlay(&self, enabled: bool) {
        self.overlay.store(enabled, Ordering::Relaxed);
    }

    /// Stop the thread and wait for it.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("streaming thread panicked");
            }
        }
    }
}

impl Drop for Streamer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod test {
    use super::{FrameSink, Streamer};
    use crate::sensor::VideoSource;
    use crate::vision::{Frame, PersonDetector, Region};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct StaticCamera;

    impl VideoSource for StaticCamera {
        fn try_read_frame(&mut self) -> Option<Frame> {
            Some(Frame::filled(32, 32, 100))
        }
        fn release(&mut self) {}
    }

    struct NoPersons;

    impl PersonDetector for NoPersons {
        fn detect(&self, _frame: &Frame) -> Vec<Region> {
            Vec::new()
        }
    }

    struct CountingSink(Arc<AtomicUsize>);

    impl FrameSink for CountingSink {
        fn push(&mut self, _frame: &Frame) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn streams_frames_until_stopped() {
        let pushed = Arc::new(AtomicUsize::new(0));
        let video: Arc<Mutex<dyn VideoSource + Send>> = Arc::new(Mutex::new(StaticCamera));

        let streamer = Streamer::spawn(
            video,
            Arc::new(NoPersons),
            CountingSink(pushed.clone()),
            Duration::from_millis(1),
        );
        while pushed.load(Ordering::SeqCst) < 3 {
            std::thread::sleep(Duration::from_millis(1));
        }
        streamer.stop();

        let after_stop = pushed.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(pushed.load(Ordering::SeqCst), after_stop);
    }
}
