// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::hang_info::{
    FatalErrorObservation, PendingFatalHangRecord, TrackingConsent, ViewSnapshot,
    ViewUpdateObservation,
};
use crate::shared::constants;

/// What startup reconciliation decided to do with a pending record.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ReconciliationPlan {
    /// The record was written under pending or not-granted consent; it can
    /// never be reported, regardless of current consent.
    DiscardWithoutConsent,
    /// The hang is older than the fatal window; the previous session's
    /// view state is too stale to update.
    EmitError(FatalErrorObservation),
    /// The hang falls inside the fatal window but no last view is
    /// available to synthesize an update from.
    EmitErrorWithoutView(FatalErrorObservation),
    EmitErrorAndViewUpdate(FatalErrorObservation, ViewUpdateObservation),
}

/// Pure decision step of startup reconciliation: no I/O, no side effects.
/// Deleting the record and emitting the planned events is the caller's job.
pub(crate) fn plan_reconciliation(
    record: &PendingFatalHangRecord,
    last_view: Option<&ViewSnapshot>,
    now: DateTime<Utc>,
) -> ReconciliationPlan {
    if record.tracking_consent_at_start != TrackingConsent::Granted {
        return ReconciliationPlan::DiscardWithoutConsent;
    }

    let error = FatalErrorObservation::from_pending_record(record);
    let corrected_start = record.corrected_start_date();
    let elapsed = now - corrected_start;
    let fatal_window = ChronoDuration::from_std(constants::FATAL_HANG_WINDOW)
        .unwrap_or(ChronoDuration::MAX);
    if elapsed >= fatal_window {
        return ReconciliationPlan::EmitError(error);
    }

    match last_view {
        Some(view) => {
            let update = ViewUpdateObservation::closing_crashed_view(
                view,
                corrected_start - ChronoDuration::milliseconds(1),
            );
            ReconciliationPlan::EmitErrorAndViewUpdate(error, update)
        }
        None => ReconciliationPlan::EmitErrorWithoutView(error),
    }
}
