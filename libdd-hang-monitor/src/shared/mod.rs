// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Constants and the injected log capability shared between the watchdog
//! and the recovery controller.

pub mod constants;
pub mod log;
