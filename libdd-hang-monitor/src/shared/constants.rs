// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Well-known durable-store key for the single pending-fatal-hang slot.
/// No other component may write this key.
pub const PENDING_HANG_RECORD_KEY: &str = "pending-fatal-hang";

/// A pending record older than this at reconciliation time is still
/// reported as a fatal error, but the previous session's view state is
/// considered too stale to update.
pub const FATAL_HANG_WINDOW: Duration = Duration::from_secs(4 * 60 * 60);

pub const APP_HANG_MESSAGE: &str = "App Hang";
pub const FATAL_APP_HANG_MESSAGE: &str = "Fatal App Hang";
pub const APP_HANG_ERROR_TYPE: &str = "AppHang";

pub const BACKTRACE_NOT_SUPPORTED_STACK: &str =
    "Backtrace generation is not supported on this platform.";
pub const BACKTRACE_GENERATION_FAILED_STACK: &str = "Backtrace generation failed for this hang.";

/// Default stall threshold before a probe miss is declared a hang.
pub const DEFAULT_HANG_THRESHOLD: Duration = Duration::from_millis(100);

/// The watchdog sleeps and waits in slices of `threshold / POLL_DIVISOR`,
/// keeping detection and cancellation latency well below the threshold.
pub const POLL_DIVISOR: u32 = 5;
