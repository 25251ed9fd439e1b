// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The hang watchdog: a dedicated monitoring thread that periodically
//! enqueues a trivial probe onto the monitored queue and measures how long
//! the probe takes to run.
//!
//! Per probe: `Idle -> ProbeScheduled`, then either the probe acknowledges
//! within the threshold (back to `Idle`), or the watchdog declares
//! `HangOpen`, captures a best-effort backtrace and notifies
//! [`HangDelegate::hang_started`]. An open hang either ends
//! (acknowledgement before the false-positive bound) or is cancelled
//! (acknowledgement at or past the bound, presumed caused by system
//! suspension rather than an application-level freeze). At most one probe
//! is outstanding at a time, so at most one hang is open at a time.

use anyhow::Context;
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::capabilities::{BacktraceCapture, Clock, MonitoredQueue};
use crate::hang_info::{BacktraceResult, Hang};
use crate::shared::constants;
use crate::shared::log::{LogCapability, LogEntry, LogLevel};

/// Receives the lifecycle of detected hangs. Callbacks are invoked from the
/// watchdog thread and are serialized by construction.
pub trait HangDelegate: Send + Sync {
    fn hang_started(&self, hang: &Hang);
    fn hang_cancelled(&self, hang: Hang);
    fn hang_ended(&self, hang: Hang, duration: Duration);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchdogConfig {
    threshold: Duration,
    false_positive_threshold: Option<Duration>,
    poll_interval: Duration,
}

impl WatchdogConfig {
    /// `threshold` is how long a probe may stay unacknowledged before a
    /// hang is declared. `false_positive_threshold`, when set, bounds the
    /// total stall duration past which the hang is reported as cancelled
    /// instead of ended; `None` means unbounded (never cancel).
    pub fn new(
        threshold: Duration,
        false_positive_threshold: Option<Duration>,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!threshold.is_zero(), "hang threshold must be positive");
        if let Some(bound) = false_positive_threshold {
            anyhow::ensure!(
                bound > threshold,
                "false-positive threshold ({bound:?}) must exceed the hang threshold ({threshold:?})"
            );
        }
        let poll_interval =
            (threshold / constants::POLL_DIVISOR).max(Duration::from_millis(1));
        Ok(Self {
            threshold,
            false_positive_threshold,
            poll_interval,
        })
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn false_positive_threshold(&self) -> Option<Duration> {
        self.false_positive_threshold
    }
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            threshold: constants::DEFAULT_HANG_THRESHOLD,
            false_positive_threshold: None,
            poll_interval: (constants::DEFAULT_HANG_THRESHOLD / constants::POLL_DIVISOR)
                .max(Duration::from_millis(1)),
        }
    }
}

struct RunningWatchdog {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Owns the monitoring thread. The delegate registered at [`start`] is
/// dropped again on [`stop`], so the watchdog never outlives its consumer.
///
/// [`start`]: HangWatchdog::start
/// [`stop`]: HangWatchdog::stop
pub struct HangWatchdog {
    config: WatchdogConfig,
    queue: Arc<dyn MonitoredQueue>,
    backtrace: Arc<dyn BacktraceCapture>,
    clock: Arc<dyn Clock>,
    log: Arc<dyn LogCapability>,
    running: Mutex<Option<RunningWatchdog>>,
}

impl HangWatchdog {
    pub fn new(
        config: WatchdogConfig,
        queue: Arc<dyn MonitoredQueue>,
        backtrace: Arc<dyn BacktraceCapture>,
        clock: Arc<dyn Clock>,
        log: Arc<dyn LogCapability>,
    ) -> Self {
        Self {
            config,
            queue,
            backtrace,
            clock,
            log,
            running: Mutex::new(None),
        }
    }

    /// Begins monitoring, reporting hangs to `delegate`. Errors if already
    /// started; restartable after [`stop`](HangWatchdog::stop).
    pub fn start(&self, delegate: Arc<dyn HangDelegate>) -> anyhow::Result<()> {
        let mut running = self.running.lock().expect("mutex poisoned");
        anyhow::ensure!(running.is_none(), "hang watchdog is already started");

        let cancel = Arc::new(AtomicBool::new(false));
        let monitor = Monitor {
            config: self.config.clone(),
            queue: Arc::clone(&self.queue),
            backtrace: Arc::clone(&self.backtrace),
            clock: Arc::clone(&self.clock),
            log: Arc::clone(&self.log),
            delegate,
            cancel: Arc::clone(&cancel),
        };
        let handle = std::thread::Builder::new()
            .name("dd-hang-watchdog".to_string())
            .spawn(move || monitor.run())
            .context("spawning hang watchdog thread")?;
        *running = Some(RunningWatchdog { cancel, handle });
        Ok(())
    }

    /// Halts monitoring and drops the registered delegate. No new probe is
    /// scheduled after this returns; a delegate callback already in flight
    /// completes before the monitoring thread is joined. Safe to call from
    /// any thread except a delegate callback, and a no-op when not started.
    pub fn stop(&self) {
        let running = self.running.lock().expect("mutex poisoned").take();
        if let Some(running) = running {
            running.cancel.store(true, Ordering::SeqCst);
            if running.handle.join().is_err() {
                self.log.log(LogEntry::new(
                    LogLevel::Error,
                    "hang watchdog thread panicked",
                ));
            }
        }
    }
}

impl Drop for HangWatchdog {
    fn drop(&mut self) {
        self.stop();
    }
}

enum ProbeOutcome {
    /// Probe acknowledged (with or without an intervening hang).
    Completed,
    /// Cancellation was requested while waiting.
    Stopped,
}

struct Monitor {
    config: WatchdogConfig,
    queue: Arc<dyn MonitoredQueue>,
    backtrace: Arc<dyn BacktraceCapture>,
    clock: Arc<dyn Clock>,
    log: Arc<dyn LogCapability>,
    delegate: Arc<dyn HangDelegate>,
    cancel: Arc<AtomicBool>,
}

impl Monitor {
    fn run(&self) {
        while !self.cancelled() {
            match self.observe_probe() {
                ProbeOutcome::Completed => self.pause(),
                ProbeOutcome::Stopped => return,
            }
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Sleep between probes, in slices so cancellation stays responsive.
    fn pause(&self) {
        let deadline = Instant::now() + self.config.poll_interval;
        while !self.cancelled() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return;
            }
            std::thread::sleep(remaining.min(Duration::from_millis(1)));
        }
    }

    /// Issues one probe and drives it through the full state machine.
    fn observe_probe(&self) -> ProbeOutcome {
        let (ack_tx, ack_rx) = bounded::<Instant>(1);
        // Held so the channel never disconnects if the queue drops the
        // probe without running it.
        let _ack_guard = ack_tx.clone();

        let start_date = self.clock.now();
        let scheduled_at = Instant::now();
        self.queue.enqueue(Box::new(move || {
            let _ = ack_tx.try_send(Instant::now());
        }));

        // ProbeScheduled: wait up to the threshold.
        let deadline = scheduled_at + self.config.threshold;
        loop {
            if self.cancelled() {
                return ProbeOutcome::Stopped;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match ack_rx.recv_timeout(remaining.min(self.config.poll_interval)) {
                Ok(_) => return ProbeOutcome::Completed,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => continue,
            }
        }

        // HangOpen: the queue missed the threshold.
        let backtrace =
            BacktraceResult::from_capture(self.backtrace.capture(self.queue.thread_id()));
        if let BacktraceResult::Unavailable { reason } = &backtrace {
            self.log.log(LogEntry::new(
                LogLevel::Debug,
                format!("hang backtrace unavailable ({reason:?}), reporting placeholder stack"),
            ));
        }
        let hang = Hang {
            start_date,
            backtrace,
        };
        self.delegate.hang_started(&hang);

        loop {
            if self.cancelled() {
                // Stop during an open hang: issue no verdict. If the
                // process dies here, the pending record persisted at
                // hang start is what survives.
                return ProbeOutcome::Stopped;
            }
            match ack_rx.recv_timeout(self.config.poll_interval) {
                Ok(acked_at) => {
                    let duration = acked_at.saturating_duration_since(scheduled_at);
                    match self.config.false_positive_threshold {
                        Some(bound) if duration >= bound => {
                            self.delegate.hang_cancelled(hang);
                        }
                        _ => self.delegate.hang_ended(hang, duration),
                    }
                    return ProbeOutcome::Completed;
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => continue,
            }
        }
    }
}
