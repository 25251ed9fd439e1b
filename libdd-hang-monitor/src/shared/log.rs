// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Structured diagnostic entry produced by the hang monitor.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Injected logging capability; passed at construction instead of reaching
/// for a process-wide logger.
pub trait LogCapability: Send + Sync {
    fn log(&self, entry: LogEntry);

    fn debug(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.log(LogEntry::new(LogLevel::Debug, message));
    }

    fn warn(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.log(LogEntry::new(LogLevel::Warn, message));
    }

    fn error(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.log(LogEntry::new(LogLevel::Error, message));
    }
}

impl LogCapability for std::sync::Arc<dyn LogCapability> {
    fn log(&self, entry: LogEntry) {
        (**self).log(entry)
    }
}

/// Default implementation forwarding to the `tracing` macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl LogCapability for TracingLog {
    fn log(&self, entry: LogEntry) {
        match entry.level {
            LogLevel::Debug => tracing::debug!(target: "hang_monitor", "{}", entry.message),
            LogLevel::Warn => tracing::warn!(target: "hang_monitor", "{}", entry.message),
            LogLevel::Error => tracing::error!(target: "hang_monitor", "{}", entry.message),
        }
    }
}
