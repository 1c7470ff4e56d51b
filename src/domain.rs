//! Pure functional core with dependency injection (Functional Core, Imperative Shell)

use crate::types::{HostSeverity, LogFilePath, LogLevel, LogTag};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{OnceLock, Weak};

/// Bridge configuration (validated at postconfiguration time)
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub threshold: LogLevel,
    pub tag: LogTag,
    pub log_file: Option<LogFilePath>,
    pub file_threshold: LogLevel,
}

/// Logging contract the storage engine calls into
pub trait EngineLogger: Send + Sync {
    fn log(&self, level: LogLevel, args: fmt::Arguments<'_>);

    /// Log without an explicit severity; equivalent to `Info`
    fn log_default(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    fn threshold(&self) -> LogLevel;

    fn set_threshold(&self, level: LogLevel);
}

/// Host error-print facility (dependency injection)
pub trait HostSink: Send + Sync {
    fn print(&self, severity: HostSeverity, message: fmt::Arguments<'_>);
}

/// Routes engine log calls to a host sink, filtered by a threshold.
///
/// Every call is also handed to the delegate logger, if one is attached,
/// before any filtering takes place. The delegate is held through a `Weak`
/// reference and is never owned by the adapter.
pub struct HostLogAdapter<S> {
    sink: S,
    tag: LogTag,
    threshold: AtomicU8,
    delegate: OnceLock<Weak<dyn EngineLogger>>,
}

impl<S: HostSink> HostLogAdapter<S> {
    pub fn new(sink: S, tag: LogTag, threshold: LogLevel) -> Self {
        HostLogAdapter {
            sink,
            tag,
            threshold: AtomicU8::new(threshold.as_u8()),
            delegate: OnceLock::new(),
        }
    }

    /// Attach the delegate logger. Only the first attach succeeds.
    pub fn set_delegate(&self, delegate: Weak<dyn EngineLogger>) -> Result<(), String> {
        self.delegate
            .set(delegate)
            .map_err(|_| "delegate logger already attached".to_string())
    }

    /// Current threshold of the attached delegate, if it is still alive
    pub fn delegate_threshold(&self) -> Option<LogLevel> {
        self.delegate().map(|d| d.threshold())
    }

    pub fn tag(&self) -> &LogTag {
        &self.tag
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn delegate(&self) -> Option<std::sync::Arc<dyn EngineLogger>> {
        self.delegate.get().and_then(Weak::upgrade)
    }
}

impl<S: HostSink> EngineLogger for HostLogAdapter<S> {
    fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if let Some(delegate) = self.delegate() {
            delegate.log(level, args);
        }

        if level < self.threshold() {
            return;
        }

        let severity = HostSeverity::from_level(level);
        self.sink
            .print(severity, format_args!("{}{}", self.tag.as_str(), args));
    }

    fn threshold(&self) -> LogLevel {
        LogLevel::from_u8(self.threshold.load(Ordering::Relaxed))
    }

    fn set_threshold(&self, level: LogLevel) {
        // The delegate filters first, so it must never be stricter than us
        if let Some(delegate) = self.delegate() {
            delegate.set_threshold(level.min(delegate.threshold()));
        }
        self.threshold.store(level.as_u8(), Ordering::Relaxed);
    }
}
