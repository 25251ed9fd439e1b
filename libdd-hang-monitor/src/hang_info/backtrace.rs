// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants;

/// A single thread observed while generating a backtrace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSnapshot {
    pub name: String,
    pub stack: String,
    /// Whether this is the thread the hang was attributed to.
    pub crashed: bool,
}

/// A binary image loaded in the process at backtrace time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryImageSnapshot {
    pub library_name: String,
    pub uuid: String,
    pub architecture: String,
    pub is_system: bool,
    pub load_address: String,
    pub max_address: String,
}

/// The payload of a successful backtrace generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktraceReport {
    pub stack: String,
    pub threads: Vec<ThreadSnapshot>,
    pub binary_images: Vec<BinaryImageSnapshot>,
    pub truncated: bool,
}

/// Why no backtrace could be generated for a hang.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktraceUnavailableReason {
    /// The capture capability does not work on this platform.
    NotSupported,
    /// The capture capability exists but returned an error.
    GenerationFailed,
}

/// Error surface of the backtrace-capture capability.
///
/// "not supported" is distinct from "failed": the former is permanent for
/// the lifetime of the process, the latter may succeed on the next hang.
#[derive(Debug, Error)]
pub enum BacktraceCaptureError {
    #[error("backtrace generation is not supported on this platform")]
    NotSupported,
    #[error("backtrace generation failed: {0}")]
    GenerationFailed(#[source] anyhow::Error),
}

/// Outcome of a best-effort backtrace capture attached to a [`crate::Hang`].
///
/// `Unavailable` still exposes a deterministic placeholder stack string per
/// reason, so downstream consumers never see an empty stack field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BacktraceResult {
    Succeeded(BacktraceReport),
    Unavailable { reason: BacktraceUnavailableReason },
}

impl BacktraceResult {
    pub fn from_capture(result: Result<BacktraceReport, BacktraceCaptureError>) -> Self {
        match result {
            Ok(report) => BacktraceResult::Succeeded(report),
            Err(BacktraceCaptureError::NotSupported) => BacktraceResult::Unavailable {
                reason: BacktraceUnavailableReason::NotSupported,
            },
            Err(BacktraceCaptureError::GenerationFailed(_)) => BacktraceResult::Unavailable {
                reason: BacktraceUnavailableReason::GenerationFailed,
            },
        }
    }

    /// The stack string to report. Never empty.
    pub fn stack(&self) -> &str {
        match self {
            BacktraceResult::Succeeded(report) => &report.stack,
            BacktraceResult::Unavailable {
                reason: BacktraceUnavailableReason::NotSupported,
            } => constants::BACKTRACE_NOT_SUPPORTED_STACK,
            BacktraceResult::Unavailable {
                reason: BacktraceUnavailableReason::GenerationFailed,
            } => constants::BACKTRACE_GENERATION_FAILED_STACK,
        }
    }

    pub fn threads(&self) -> &[ThreadSnapshot] {
        match self {
            BacktraceResult::Succeeded(report) => &report.threads,
            BacktraceResult::Unavailable { .. } => &[],
        }
    }

    pub fn binary_images(&self) -> &[BinaryImageSnapshot] {
        match self {
            BacktraceResult::Succeeded(report) => &report.binary_images,
            BacktraceResult::Unavailable { .. } => &[],
        }
    }

    /// `None` when no backtrace was generated at all.
    pub fn truncated(&self) -> Option<bool> {
        match self {
            BacktraceResult::Succeeded(report) => Some(report.truncated),
            BacktraceResult::Unavailable { .. } => None,
        }
    }
}
