// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Collaborator capabilities consumed by the hang monitor. Production
//! implementations live in the host SDK; everything here is substitutable
//! at construction, which is also how the tests inject their doubles.

use chrono::{DateTime, Utc};

use crate::hang_info::{
    BacktraceCaptureError, BacktraceReport, FatalErrorObservation, HangObservation,
    ProcessIdentity, TrackingConsent, ViewRef, ViewSnapshot, ViewUpdateObservation,
};

/// Wall-clock time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Best-effort backtrace generation for a stalled thread.
///
/// `thread_id` is the OS identifier of the thread servicing the monitored
/// queue, when known. Implementations must distinguish "not supported on
/// this platform" from a capture that failed.
pub trait BacktraceCapture: Send + Sync {
    fn capture(&self, thread_id: Option<i64>)
        -> Result<BacktraceReport, BacktraceCaptureError>;
}

/// Key-value persistence surviving uncontrolled process death.
///
/// `set` must be durable (flushed, not merely buffered) before it returns:
/// a backgrounded app can be killed with no further notice.
pub trait DurableKeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()>;
    fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// Supplies UI view context: the view on screen right now (hang start) and
/// the last view restored from a previous session (reconciliation).
pub trait ViewContextProvider: Send + Sync {
    fn current_view(&self) -> Option<ViewRef>;
    fn last_known_view(&self) -> Option<ViewSnapshot>;
}

pub trait ConsentProvider: Send + Sync {
    fn current_consent(&self) -> TrackingConsent;
}

/// Identity and anchors of the current process, supplied by the host SDK.
#[derive(Debug, Clone)]
pub struct ProcessContext {
    pub identity: ProcessIdentity,
    /// Identity of the run that produced the restored durable state, when
    /// the host was able to restore one. A pending hang record is only
    /// reconciled when this differs from `identity`; the identities
    /// themselves are never persisted by this subsystem.
    pub previous_identity: Option<ProcessIdentity>,
    pub launch_date: DateTime<Utc>,
    pub server_time_offset: Option<chrono::Duration>,
}

/// Downstream consumer of the three observation kinds this subsystem
/// produces.
pub trait EventSink: Send + Sync {
    fn hang_resolved(&self, observation: HangObservation);
    fn fatal_hang(&self, error: FatalErrorObservation);
    fn view_updated(&self, view: ViewUpdateObservation);
}

/// The cooperatively-scheduled queue being watched, typically the
/// application's main queue. Probes enqueued here must run in order with
/// the application's own work.
pub trait MonitoredQueue: Send + Sync {
    fn enqueue(&self, task: Box<dyn FnOnce() + Send>);

    /// OS thread identifier of the thread servicing the queue, if known.
    /// Used only to target backtrace capture.
    fn thread_id(&self) -> Option<i64> {
        None
    }
}
