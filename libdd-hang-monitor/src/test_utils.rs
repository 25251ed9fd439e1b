// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Test doubles for the collaborator capabilities, shared by the watchdog
//! and recovery tests.

use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::capabilities::{
    BacktraceCapture, Clock, ConsentProvider, DurableKeyValueStore, EventSink, MonitoredQueue,
    ViewContextProvider,
};
use crate::hang_info::{
    BacktraceCaptureError, BacktraceReport, FatalErrorObservation, Hang, HangObservation,
    ThreadSnapshot, TrackingConsent, ViewRef, ViewSnapshot, ViewUpdateObservation,
};
use crate::watchdog::HangDelegate;

/// In-memory durable store with switchable read/write failure injection.
#[derive(Default)]
pub(crate) struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl DurableKeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        anyhow::ensure!(!self.fail_reads.load(Ordering::SeqCst), "injected read failure");
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.fail_writes.load(Ordering::SeqCst),
            "injected write failure"
        );
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.fail_writes.load(Ordering::SeqCst),
            "injected write failure"
        );
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// File-per-key store used to exercise a real filesystem round trip.
pub(crate) struct DirStore {
    dir: tempfile::TempDir,
}

impl DirStore {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }
}

impl DurableKeyValueStore for DirStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        match std::fs::read(self.dir.path().join(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        let path = self.dir.path().join(key);
        let tmp = tempfile::NamedTempFile::new_in(self.dir.path())?;
        std::fs::write(tmp.path(), value)?;
        tmp.persist(path)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        match std::fs::remove_file(self.dir.path().join(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Default)]
pub(crate) struct StubViews {
    current: Mutex<Option<ViewRef>>,
    last_known: Mutex<Option<ViewSnapshot>>,
}

impl StubViews {
    pub fn set_current_view(&self, view: ViewRef) {
        *self.current.lock().unwrap() = Some(view);
    }

    pub fn set_last_known_view(&self, view: ViewSnapshot) {
        *self.last_known.lock().unwrap() = Some(view);
    }

    pub fn sample_view_ref() -> ViewRef {
        ViewRef {
            id: "view-42".to_string(),
            name: "Home".to_string(),
        }
    }

    pub fn sample_view() -> ViewSnapshot {
        ViewSnapshot {
            id: "view-42".to_string(),
            name: "Home".to_string(),
            url: "app/home".to_string(),
            service: "shop-ios".to_string(),
            version: "1.2.0".to_string(),
            build: "77".to_string(),
            document_version: 3,
            error_count: 0,
            crash_count: 0,
            is_active: true,
            date: Utc.timestamp_millis_opt(1_699_999_000_000).unwrap(),
            context: serde_json::json!({"device": {"model": "test-device"}}),
        }
    }
}

impl ViewContextProvider for StubViews {
    fn current_view(&self) -> Option<ViewRef> {
        self.current.lock().unwrap().clone()
    }

    fn last_known_view(&self) -> Option<ViewSnapshot> {
        self.last_known.lock().unwrap().clone()
    }
}

pub(crate) struct StubConsent {
    consent: Mutex<TrackingConsent>,
}

impl StubConsent {
    pub fn new(consent: TrackingConsent) -> Self {
        Self {
            consent: Mutex::new(consent),
        }
    }

    pub fn set(&self, consent: TrackingConsent) {
        *self.consent.lock().unwrap() = consent;
    }
}

impl ConsentProvider for StubConsent {
    fn current_consent(&self) -> TrackingConsent {
        *self.consent.lock().unwrap()
    }
}

#[derive(Debug, Clone)]
pub(crate) enum RecordedEvent {
    HangResolved(HangObservation),
    FatalHang(FatalErrorObservation),
    ViewUpdate(ViewUpdateObservation),
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn hang_resolved(&self, observation: HangObservation) {
        self.events
            .lock()
            .unwrap()
            .push(RecordedEvent::HangResolved(observation));
    }

    fn fatal_hang(&self, error: FatalErrorObservation) {
        self.events
            .lock()
            .unwrap()
            .push(RecordedEvent::FatalHang(error));
    }

    fn view_updated(&self, view: ViewUpdateObservation) {
        self.events
            .lock()
            .unwrap()
            .push(RecordedEvent::ViewUpdate(view));
    }
}

enum StubBacktraceMode {
    Succeed,
    Fail,
    NotSupported,
}

pub(crate) struct StubBacktrace {
    mode: StubBacktraceMode,
}

impl StubBacktrace {
    pub fn succeeding() -> Self {
        Self {
            mode: StubBacktraceMode::Succeed,
        }
    }

    pub fn failing() -> Self {
        Self {
            mode: StubBacktraceMode::Fail,
        }
    }

    #[allow(dead_code)]
    pub fn not_supported() -> Self {
        Self {
            mode: StubBacktraceMode::NotSupported,
        }
    }
}

impl BacktraceCapture for StubBacktrace {
    fn capture(
        &self,
        _thread_id: Option<i64>,
    ) -> Result<BacktraceReport, BacktraceCaptureError> {
        match self.mode {
            StubBacktraceMode::Succeed => Ok(BacktraceReport {
                stack: "0: stub_frame_a\n1: stub_frame_b".to_string(),
                threads: vec![ThreadSnapshot {
                    name: "main".to_string(),
                    stack: "0: stub_frame_a".to_string(),
                    crashed: true,
                }],
                binary_images: vec![],
                truncated: false,
            }),
            StubBacktraceMode::Fail => Err(BacktraceCaptureError::GenerationFailed(
                anyhow::anyhow!("injected capture failure"),
            )),
            StubBacktraceMode::NotSupported => Err(BacktraceCaptureError::NotSupported),
        }
    }
}

/// A real cooperative queue: one worker thread executing enqueued closures
/// in order. Stalls are injected as closures that sleep.
pub(crate) struct WorkerQueue {
    tasks: crossbeam_channel::Sender<Box<dyn FnOnce() + Send>>,
}

impl WorkerQueue {
    pub fn spawn() -> Arc<Self> {
        let (tasks, rx) = crossbeam_channel::unbounded::<Box<dyn FnOnce() + Send>>();
        std::thread::spawn(move || {
            for task in rx {
                task();
            }
        });
        Arc::new(Self { tasks })
    }

    pub fn stall(&self, duration: Duration) {
        self.enqueue(Box::new(move || std::thread::sleep(duration)));
    }
}

impl MonitoredQueue for WorkerQueue {
    fn enqueue(&self, task: Box<dyn FnOnce() + Send>) {
        // A send error means the worker is gone; the probe is then simply
        // never acknowledged, which is exactly a hang.
        let _ = self.tasks.send(task);
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingDelegate {
    events: Mutex<Vec<DelegateEvent>>,
}

#[derive(Debug, Clone)]
pub(crate) enum DelegateEvent {
    Started(Hang),
    Cancelled(Hang),
    Ended(Hang, Duration),
}

impl RecordingDelegate {
    pub fn events(&self) -> Vec<DelegateEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl HangDelegate for RecordingDelegate {
    fn hang_started(&self, hang: &Hang) {
        self.events
            .lock()
            .unwrap()
            .push(DelegateEvent::Started(hang.clone()));
    }

    fn hang_cancelled(&self, hang: Hang) {
        self.events
            .lock()
            .unwrap()
            .push(DelegateEvent::Cancelled(hang));
    }

    fn hang_ended(&self, hang: Hang, duration: Duration) {
        self.events
            .lock()
            .unwrap()
            .push(DelegateEvent::Ended(hang, duration));
    }
}

pub(crate) struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    #[allow(dead_code)]
    pub fn advance_to(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hang_info::{BacktraceResult, PendingFatalHangRecord};
    use crate::shared::constants;

    #[test]
    fn dir_store_round_trips_a_pending_record() {
        let store = DirStore::new().unwrap();
        let record = PendingFatalHangRecord {
            start_date: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            backtrace: BacktraceResult::Unavailable {
                reason: crate::hang_info::BacktraceUnavailableReason::NotSupported,
            },
            tracking_consent_at_start: TrackingConsent::Granted,
            server_time_offset_ms: Some(1_500),
            time_since_app_start_ms: None,
        };

        assert_eq!(store.get(constants::PENDING_HANG_RECORD_KEY).unwrap(), None);
        store
            .set(
                constants::PENDING_HANG_RECORD_KEY,
                &record.to_bytes().unwrap(),
            )
            .unwrap();
        let bytes = store
            .get(constants::PENDING_HANG_RECORD_KEY)
            .unwrap()
            .expect("record should be on disk");
        assert_eq!(PendingFatalHangRecord::from_bytes(&bytes).unwrap(), record);

        store.delete(constants::PENDING_HANG_RECORD_KEY).unwrap();
        assert_eq!(store.get(constants::PENDING_HANG_RECORD_KEY).unwrap(), None);
        // Deleting an absent key is not an error.
        store.delete(constants::PENDING_HANG_RECORD_KEY).unwrap();
    }
}
