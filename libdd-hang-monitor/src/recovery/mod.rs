// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The hang recovery controller: consumes watchdog signals, emits a
//! non-fatal hang observation for hangs that resolve in-process, and keeps
//! the single durable pending-fatal-hang slot up to date so that a hang
//! followed by process death can be reconciled on the next launch.

mod reconciliation;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reconciliation::{plan_reconciliation, ReconciliationPlan};

use crate::capabilities::{
    Clock, ConsentProvider, DurableKeyValueStore, EventSink, ProcessContext, ViewContextProvider,
};
use crate::hang_info::{Hang, HangObservation, PendingFatalHangRecord};
use crate::shared::constants;
use crate::shared::log::{LogCapability, LogEntry, LogLevel};
use crate::watchdog::{HangDelegate, HangWatchdog};

#[derive(Debug, Default)]
struct ControllerState {
    started: bool,
    reconciled: bool,
}

/// Owns the watchdog outright and is registered as its delegate for the
/// duration of [`start`]..[`stop`].
///
/// Per process lifetime the durable slot moves between "no pending hang"
/// and "pending hang recorded" on the delegate callbacks, plus a one-shot
/// reconciliation executed at most once per controller instance, before any
/// new hang can be observed in this process.
///
/// [`start`]: HangRecoveryController::start
/// [`stop`]: HangRecoveryController::stop
pub struct HangRecoveryController {
    watchdog: HangWatchdog,
    store: Arc<dyn DurableKeyValueStore>,
    views: Arc<dyn ViewContextProvider>,
    consent: Arc<dyn ConsentProvider>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    log: Arc<dyn LogCapability>,
    process: ProcessContext,
    state: Mutex<ControllerState>,
}

impl HangRecoveryController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        watchdog: HangWatchdog,
        store: Arc<dyn DurableKeyValueStore>,
        views: Arc<dyn ViewContextProvider>,
        consent: Arc<dyn ConsentProvider>,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        log: Arc<dyn LogCapability>,
        process: ProcessContext,
    ) -> Self {
        Self {
            watchdog,
            store,
            views,
            consent,
            sink,
            clock,
            log,
            process,
            state: Mutex::new(ControllerState::default()),
        }
    }

    /// Reconciles any record left behind by a previous process, then starts
    /// the watchdog with this controller as its delegate. Calling `start`
    /// again without `stop` is a no-op; reconciliation runs at most once
    /// per controller instance either way.
    pub fn start(self: Arc<Self>) -> anyhow::Result<()> {
        let reconcile_now = {
            let mut state = self.state.lock().expect("mutex poisoned");
            if state.started {
                return Ok(());
            }
            state.started = true;
            let first = !state.reconciled;
            state.reconciled = true;
            first
        };
        if reconcile_now {
            self.reconcile_pending_record();
        }
        let delegate: Arc<dyn HangDelegate> = self.clone();
        self.watchdog.start(delegate)
    }

    /// Stops the watchdog; no delegate callback arrives after this returns.
    pub fn stop(&self) {
        {
            let mut state = self.state.lock().expect("mutex poisoned");
            if !state.started {
                return;
            }
            state.started = false;
        }
        self.watchdog.stop();
    }

    fn delete_pending_record(&self, why: &str) {
        if let Err(error) = self.store.delete(constants::PENDING_HANG_RECORD_KEY) {
            self.log.log(LogEntry::new(
                LogLevel::Warn,
                format!("failed to delete pending hang record ({why}): {error:#}"),
            ));
        }
    }

    fn reconcile_pending_record(&self) {
        if self.process.previous_identity.as_ref() == Some(&self.process.identity) {
            // The restored state belongs to this very run; any record in
            // the slot is an open hang that may yet resolve in-process.
            self.log.log(LogEntry::new(
                LogLevel::Debug,
                "durable state belongs to the current process, skipping reconciliation",
            ));
            return;
        }

        let bytes = match self.store.get(constants::PENDING_HANG_RECORD_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return,
            Err(error) => {
                // A lost fatal-hang report is preferred over failing the
                // host SDK's startup.
                self.log.log(LogEntry::new(
                    LogLevel::Warn,
                    format!("failed to read pending hang record, treating as absent: {error:#}"),
                ));
                return;
            }
        };

        // Delete before emitting anything: a crash mid-reconciliation must
        // not replay the same incident on the launch after that.
        self.delete_pending_record("reconciling");

        let record = match PendingFatalHangRecord::from_bytes(&bytes) {
            Ok(record) => record,
            Err(error) => {
                self.log.log(LogEntry::new(
                    LogLevel::Warn,
                    format!("discarding malformed pending hang record: {error:#}"),
                ));
                return;
            }
        };

        let last_view = self.views.last_known_view();
        match plan_reconciliation(&record, last_view.as_ref(), self.clock.now()) {
            ReconciliationPlan::DiscardWithoutConsent => {
                self.log.log(LogEntry::new(
                    LogLevel::Debug,
                    "pending hang was recorded without granted consent, discarding",
                ));
            }
            ReconciliationPlan::EmitError(error) => {
                self.log.log(LogEntry::new(
                    LogLevel::Debug,
                    "pending hang is older than the fatal window, skipping the view update",
                ));
                self.sink.fatal_hang(error);
            }
            ReconciliationPlan::EmitErrorWithoutView(error) => {
                self.log.log(LogEntry::new(
                    LogLevel::Debug,
                    "no last known view at reconciliation, skipping the view update",
                ));
                self.sink.fatal_hang(error);
            }
            ReconciliationPlan::EmitErrorAndViewUpdate(error, update) => {
                self.sink.fatal_hang(error);
                self.sink.view_updated(update);
            }
        }
    }
}

impl HangDelegate for HangRecoveryController {
    fn hang_started(&self, hang: &Hang) {
        if self.views.current_view().is_none() {
            self.log.log(LogEntry::new(
                LogLevel::Debug,
                "hang started with no active view, it cannot be reconciled as fatal",
            ));
            return;
        }

        // Diagnostic only: a stale unreconciled record is expected to be
        // overwritten by a newer hang.
        match self.store.get(constants::PENDING_HANG_RECORD_KEY) {
            Ok(None) => self.log.log(LogEntry::new(
                LogLevel::Debug,
                "no pending hang found, persisting a new record",
            )),
            Ok(Some(_)) => self.log.log(LogEntry::new(
                LogLevel::Debug,
                "overwriting a stale pending hang record",
            )),
            Err(error) => self.log.log(LogEntry::new(
                LogLevel::Warn,
                format!("failed to inspect pending hang record: {error:#}"),
            )),
        }

        let record = PendingFatalHangRecord {
            start_date: hang.start_date,
            backtrace: hang.backtrace.clone(),
            tracking_consent_at_start: self.consent.current_consent(),
            server_time_offset_ms: self
                .process
                .server_time_offset
                .map(|offset| offset.num_milliseconds()),
            time_since_app_start_ms: Some(
                (hang.start_date - self.process.launch_date).num_milliseconds(),
            ),
        };
        let bytes = match record.to_bytes() {
            Ok(bytes) => bytes,
            Err(error) => {
                self.log.log(LogEntry::new(
                    LogLevel::Error,
                    format!("failed to encode pending hang record: {error:#}"),
                ));
                return;
            }
        };
        // Not retried on failure; the next hang, if any, will attempt to
        // persist again.
        if let Err(error) = self.store.set(constants::PENDING_HANG_RECORD_KEY, &bytes) {
            self.log.log(LogEntry::new(
                LogLevel::Warn,
                format!("failed to persist pending hang record: {error:#}"),
            ));
        }
    }

    fn hang_cancelled(&self, _hang: Hang) {
        self.delete_pending_record("hang cancelled as a false positive");
    }

    fn hang_ended(&self, hang: Hang, duration: Duration) {
        self.delete_pending_record("hang resolved in-process");
        self.sink
            .hang_resolved(HangObservation::from_resolved_hang(&hang, duration));
    }
}
