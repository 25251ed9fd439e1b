// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A lightweight reference to the view currently on screen.
///
/// Its presence at hang start is what makes a hang eligible for the
/// fatal-hang path; the fields themselves are not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRef {
    pub id: String,
    pub name: String,
}

/// The last view observed in a (possibly previous) session, restored by an
/// external mechanism. Consumed read-only at reconciliation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
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
    /// Device, OS, connectivity and user attributes, carried verbatim.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub context: serde_json::Value,
}
