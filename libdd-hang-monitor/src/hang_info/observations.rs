// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{BinaryImageSnapshot, Hang, PendingFatalHangRecord, ThreadSnapshot, ViewSnapshot};
use crate::shared::constants;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    AppHang,
}

/// One non-fatal hang, emitted as soon as the hang resolves in-process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HangObservation {
    pub time: DateTime<Utc>,
    pub hang_duration: Duration,
    pub message: String,
    pub error_type: String,
    pub stack: String,
    pub threads: Vec<ThreadSnapshot>,
    pub binary_images: Vec<BinaryImageSnapshot>,
    pub truncated: Option<bool>,
}

impl HangObservation {
    pub fn from_resolved_hang(hang: &Hang, duration: Duration) -> Self {
        Self {
            time: hang.start_date,
            hang_duration: duration,
            message: constants::APP_HANG_MESSAGE.to_string(),
            error_type: constants::APP_HANG_ERROR_TYPE.to_string(),
            stack: hang.backtrace.stack().to_string(),
            threads: hang.backtrace.threads().to_vec(),
            binary_images: hang.backtrace.binary_images().to_vec(),
            truncated: hang.backtrace.truncated(),
        }
    }
}

/// The error half of a reconciled fatal hang.
///
/// `date` is the uncorrected hang start; `time_since_app_start` is whatever
/// the recording process measured against its own launch anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatalErrorObservation {
    pub category: ErrorCategory,
    pub is_crash: bool,
    pub date: DateTime<Utc>,
    pub time_since_app_start: Option<Duration>,
    pub message: String,
    pub error_type: String,
    pub stack: String,
    pub threads: Vec<ThreadSnapshot>,
    pub binary_images: Vec<BinaryImageSnapshot>,
    pub truncated: Option<bool>,
}

impl FatalErrorObservation {
    pub fn from_pending_record(record: &PendingFatalHangRecord) -> Self {
        Self {
            category: ErrorCategory::AppHang,
            is_crash: true,
            date: record.start_date,
            time_since_app_start: record
                .time_since_app_start_ms
                .and_then(|ms| u64::try_from(ms).ok())
                .map(Duration::from_millis),
            message: constants::FATAL_APP_HANG_MESSAGE.to_string(),
            error_type: constants::APP_HANG_ERROR_TYPE.to_string(),
            stack: record.backtrace.stack().to_string(),
            threads: record.backtrace.threads().to_vec(),
            binary_images: record.backtrace.binary_images().to_vec(),
            truncated: record.backtrace.truncated(),
        }
    }
}

/// The synthetic view update closing out the crashed session's last view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewUpdateObservation {
    pub id: String,
    pub name: String,
    pub url: String,
    pub service: String,
    pub version: String,
    pub build: String,
    pub document_version: u64,
    pub error_count: u64,
    pub crash_count: u64,
    pub is_active: bool,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub context: serde_json::Value,
}

impl ViewUpdateObservation {
    /// Derives the final update for `view`: one more document version, one
    /// more error, one more crash, no longer active. Everything else is
    /// copied verbatim.
    pub fn closing_crashed_view(view: &ViewSnapshot, date: DateTime<Utc>) -> Self {
        Self {
            id: view.id.clone(),
            name: view.name.clone(),
            url: view.url.clone(),
            service: view.service.clone(),
            version: view.version.clone(),
            build: view.build.clone(),
            document_version: view.document_version + 1,
            error_count: view.error_count + 1,
            crash_count: view.crash_count + 1,
            is_active: false,
            date,
            context: view.context.clone(),
        }
    }
}
