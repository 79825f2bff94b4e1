// SPDX-License-Identifier: GPL-3.0-only
//! Paced delivery threads for synthetic capture sources
//!
//! Each loop runs on its own thread and calls its closure once per period,
//! scheduling against the loop's start time so a slow iteration does not
//! shift every later frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Action returned by the loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Controller for a delivery loop running in a separate thread
///
/// ```ignore
/// let controller = DeliveryLoopController::start("video", Duration::from_millis(33), |tick| {
///     sink.on_video_frame(render(tick));
///     LoopAction::Continue
/// });
///
/// // Later, stop the loop
/// controller.stop();
/// ```
pub struct DeliveryLoopController {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    /// Name for logging
    name: String,
}

impl DeliveryLoopController {
    /// Start calling `loop_fn` every `period` with the tick number
    ///
    /// Ticks that fall more than one period behind are skipped, like a
    /// camera dropping frames when its consumer stalls.
    pub fn start<F>(name: &str, period: Duration, mut loop_fn: F) -> Self
    where
        F: FnMut(u64) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, period_us = period.as_micros() as u64, "Starting delivery loop");

        let thread_handle = thread::spawn(move || {
            debug!(name = %name_clone, "Delivery loop thread started");
            let epoch = Instant::now();
            let mut tick: u64 = 0;

            loop {
                if stop_signal_clone.load(Ordering::SeqCst) {
                    debug!(name = %name_clone, "Stop signal received");
                    break;
                }

                if loop_fn(tick) == LoopAction::Stop {
                    debug!(name = %name_clone, "Loop requested stop");
                    break;
                }

                tick += 1;
                let due = epoch + period.saturating_mul(tick as u32);
                let now = Instant::now();
                if due > now {
                    thread::sleep(due - now);
                } else if !period.is_zero() && now - due > period {
                    let behind = ((now - due).as_nanos() / period.as_nanos()) as u64;
                    debug!(name = %name_clone, skipped = behind, "Delivery loop fell behind");
                    tick += behind;
                }
            }

            info!(name = %name_clone, ticks = tick, "Delivery loop thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop (non-blocking)
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting delivery loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Delivery loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Delivery loop thread finished");
            }
        }
    }
}

impl Drop for DeliveryLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "DeliveryLoopController dropped, stopping loop");
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn test_loop_stops_itself() {
        let counter = Arc::new(AtomicU64::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut controller =
            DeliveryLoopController::start("test-loop", Duration::from_millis(1), move |tick| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                if tick >= 10 {
                    LoopAction::Stop
                } else {
                    LoopAction::Continue
                }
            });

        controller.join();
        assert!(counter.load(Ordering::SeqCst) <= 11);
        assert!(!controller.is_running());
    }

    #[test]
    fn test_stop_signal() {
        let counter = Arc::new(AtomicU64::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut controller =
            DeliveryLoopController::start("test-loop", Duration::from_millis(5), move |_| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                LoopAction::Continue
            });

        thread::sleep(Duration::from_millis(50));
        controller.stop();
        let after_stop = counter.load(Ordering::SeqCst);
        assert!(after_stop > 0);

        thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_pacing() {
        let start = Instant::now();
        let mut controller =
            DeliveryLoopController::start("test-pacing", Duration::from_millis(10), |tick| {
                if tick >= 5 {
                    LoopAction::Stop
                } else {
                    LoopAction::Continue
                }
            });
        controller.join();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_drop_stops_loop() {
        let controller =
            DeliveryLoopController::start("test-running", Duration::from_millis(10), |_| {
                LoopAction::Continue
            });
        assert!(controller.is_running());
        drop(controller);
    }
}
