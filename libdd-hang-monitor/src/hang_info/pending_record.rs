// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{BacktraceResult, TrackingConsent};

/// The durable, cross-process projection of a still-open hang.
///
/// Written (overwriting any previous value) when a hang starts while a view
/// is on screen, deleted when the hang resolves or is cancelled in the same
/// process, and otherwise consumed by startup reconciliation in the next
/// process. Exactly one record exists per SDK instance: a new hang
/// overwrites an unreconciled stale one.
///
/// The server-time offset and launch-relative offset are captured in the
/// *recording* process. Recomputing either in the reconciling process would
/// anchor them to the wrong process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingFatalHangRecord {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_date: DateTime<Utc>,
    pub backtrace: BacktraceResult,
    pub tracking_consent_at_start: TrackingConsent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_time_offset_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_since_app_start_ms: Option<i64>,
}

impl PendingFatalHangRecord {
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        serde_json::to_vec(self).context("serializing pending fatal hang record")
    }

    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        serde_json::from_slice(bytes).context("deserializing pending fatal hang record")
    }

    /// The hang start corrected by the recording process's server-time
    /// offset, falling back to the raw wall-clock date.
    pub fn corrected_start_date(&self) -> DateTime<Utc> {
        match self.server_time_offset_ms {
            Some(offset_ms) => self.start_date + Duration::milliseconds(offset_ms),
            None => self.start_date,
        }
    }
}
