// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Data model for hang detection and fatal-hang recovery: the in-process
//! [`Hang`], its best-effort [`BacktraceResult`], the durable
//! [`PendingFatalHangRecord`], and the observation records handed to the
//! event sink.

mod backtrace;
mod observations;
mod pending_record;
mod view;

pub use backtrace::*;
pub use observations::*;
pub use pending_record::*;
pub use view::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A period during which the monitored queue failed to execute a trivial
/// probe within the configured threshold. At most one hang is open at a
/// time per watchdog instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hang {
    pub start_date: DateTime<Utc>,
    pub backtrace: BacktraceResult,
}

/// The user's recorded authorization level for data collection, captured at
/// hang start and re-checked (not re-evaluated) at reconciliation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingConsent {
    Granted,
    Pending,
    NotGranted,
}

/// Opaque value distinguishing "this run" from "the run that produced a
/// pending record". Compared for equality only, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity(pub String);
