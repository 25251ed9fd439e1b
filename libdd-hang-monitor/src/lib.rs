// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Hang detection and fatal-hang recovery.
//!
//! Architecturally, it consists of two parts:
//! 1. A [`HangWatchdog`], which owns a monitoring thread independent of the
//!    monitored queue. It periodically enqueues a lightweight probe onto
//!    the queue and measures how long the probe takes to run. A probe that
//!    misses the threshold opens a hang; hang lifecycle signals (started /
//!    ended / cancelled) go to a registered delegate.
//! 2. A [`HangRecoveryController`], which consumes those signals. Hangs
//!    that resolve in-process are emitted immediately as non-fatal hang
//!    observations. A hang that is still open while a view is on screen is
//!    projected into a durable pending-fatal-hang record, because a fatal
//!    stall is typically followed by the process being killed before the
//!    hang can resolve. On the next launch the controller reconciles any
//!    record left behind by the previous process: depending on recorded
//!    consent and elapsed wall-clock time it emits a fatal error
//!    observation, and within a 4-hour window also a synthetic update
//!    closing the crashed session's last view. The record is deleted
//!    before events are emitted, so an incident is delivered at most once.
//!
//! Everything this subsystem consumes (clock, backtrace capture, durable
//! key-value store, view context, consent, event sink, and the monitored
//! queue itself) is injected as a capability, see [`capabilities`].

pub mod capabilities;
pub mod hang_info;
mod recovery;
pub mod shared;
mod watchdog;

pub use hang_info::*;
pub use recovery::HangRecoveryController;
pub use watchdog::{HangDelegate, HangWatchdog, WatchdogConfig};

#[cfg(test)]
pub(crate) mod test_utils;
