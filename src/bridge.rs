//! Process-wide wiring of the log adapter (imperative shell)

use crate::domain::{EngineLogger, HostLogAdapter, HostSink, ValidatedConfig};
use crate::file_logger::FileLogger;
use crate::logging::NginxErrorLog;
use crate::sqlite_log;
use crate::types::LogLevel;
use serde::Serialize;
use std::os::raw::c_int;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

/// Adapter plus the delegate it points at.
///
/// The bridge owns the file logger; the adapter only holds a `Weak` to it.
pub struct Bridge<S> {
    adapter: OnceLock<HostLogAdapter<S>>,
    file_logger: OnceLock<Arc<FileLogger>>,
}

/// Result of an install pass
#[derive(Debug, Default)]
pub struct InstallReport {
    pub delegate_path: Option<String>,
    pub warnings: Vec<String>,
}

/// Snapshot served by the status handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeStatus {
    pub tag: String,
    pub threshold: LogLevel,
    pub delegate: Option<DelegateStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegateStatus {
    pub path: String,
    pub threshold: LogLevel,
}

impl<S: HostSink> Bridge<S> {
    pub const fn new() -> Self {
        Bridge {
            adapter: OnceLock::new(),
            file_logger: OnceLock::new(),
        }
    }

    /// Apply a configuration. Safe to call again on reload: the tag and
    /// delegate stay as first installed, thresholds are re-applied.
    pub fn install(
        &self,
        config: &ValidatedConfig,
        sink: impl FnOnce() -> S,
    ) -> Result<InstallReport, String> {
        let mut report = InstallReport::default();

        let adapter = self
            .adapter
            .get_or_init(|| HostLogAdapter::new(sink(), config.tag.clone(), config.threshold));

        if adapter.tag() != &config.tag {
            report.warnings.push(format!(
                "sqlite_log_tag change to '{}' needs a restart, keeping '{}'",
                config.tag.as_str(),
                adapter.tag().as_str()
            ));
        }

        if let Some(path) = &config.log_file {
            let file_logger = match self.file_logger.get() {
                Some(existing) => existing,
                None => {
                    let opened = Arc::new(FileLogger::open(path, config.file_threshold)?);
                    self.file_logger.get_or_init(|| opened)
                }
            };

            if file_logger.path() != path {
                report.warnings.push(format!(
                    "sqlite_log_file change to '{}' needs a restart, keeping '{}'",
                    path.as_str(),
                    file_logger.path().as_str()
                ));
            }

            file_logger.set_threshold(config.file_threshold);

            let weak: Weak<dyn EngineLogger> = Arc::downgrade(file_logger) as Weak<dyn EngineLogger>;
            // Already attached on reload; the same logger stays in place
            let _ = adapter.set_delegate(weak);

            report.delegate_path = Some(file_logger.path().as_str().to_string());
        } else if let Some(file_logger) = self.file_logger.get() {
            report.warnings.push(format!(
                "sqlite_log_file removal needs a restart, keeping '{}'",
                file_logger.path().as_str()
            ));
            report.delegate_path = Some(file_logger.path().as_str().to_string());
        }

        adapter.set_threshold(config.threshold);

        Ok(report)
    }

    #[cfg(test)]
    pub fn adapter(&self) -> Option<&HostLogAdapter<S>> {
        self.adapter.get()
    }

    /// Forward one SQLite log record through the adapter, if installed
    pub fn forward(&self, code: c_int, message: &str) {
        if let Some(adapter) = self.adapter.get() {
            adapter.log(
                sqlite_log::level_for_code(code),
                format_args!("({}) {}", code, message),
            );
        }
    }

    pub fn status(&self) -> Option<BridgeStatus> {
        let adapter = self.adapter.get()?;

        let delegate = match (self.file_logger.get(), adapter.delegate_threshold()) {
            (Some(file_logger), Some(threshold)) => Some(DelegateStatus {
                path: file_logger.path().as_str().to_string(),
                threshold,
            }),
            _ => None,
        };

        Some(BridgeStatus {
            tag: adapter.tag().as_str().to_string(),
            threshold: adapter.threshold(),
            delegate,
        })
    }
}

impl<S: HostSink> Default for Bridge<S> {
    fn default() -> Self {
        Self::new()
    }
}

static BRIDGE: Bridge<NginxErrorLog> = Bridge::new();
static HOOK_REGISTERED: AtomicBool = AtomicBool::new(false);

fn forward_sqlite_log(code: c_int, message: &str) {
    BRIDGE.forward(code, message);
}

/// Install the process-wide bridge and hook it into SQLite's error log
pub fn install(config: &ValidatedConfig) -> Result<InstallReport, String> {
    let report = BRIDGE.install(config, || NginxErrorLog)?;

    if !HOOK_REGISTERED.swap(true, Ordering::AcqRel) {
        if let Err(e) = sqlite_log::register(forward_sqlite_log) {
            HOOK_REGISTERED.store(false, Ordering::Release);
            return Err(e);
        }
    }

    Ok(report)
}

/// Status of the process-wide bridge
pub fn status() -> Option<BridgeStatus> {
    BRIDGE.status()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HostSeverity, LogFilePath, LogTag};
    use rusqlite::ffi;
    use std::fmt;
    use std::fs;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        printed: Mutex<Vec<(HostSeverity, String)>>,
    }

    impl HostSink for RecordingSink {
        fn print(&self, severity: HostSeverity, message: fmt::Arguments<'_>) {
            self.printed
                .lock()
                .unwrap()
                .push((severity, message.to_string()));
        }
    }

    fn printed(bridge: &Bridge<RecordingSink>) -> Vec<(HostSeverity, String)> {
        bridge.adapter().unwrap().sink().printed.lock().unwrap().clone()
    }

    fn config(threshold: LogLevel, log_file: Option<&str>, file_threshold: LogLevel) -> ValidatedConfig {
        ValidatedConfig {
            threshold,
            tag: LogTag::default(),
            log_file: log_file.map(|p| LogFilePath::parse(p).unwrap()),
            file_threshold,
        }
    }

    #[test]
    fn test_forward_before_install_is_noop() {
        let bridge: Bridge<RecordingSink> = Bridge::new();
        bridge.forward(ffi::SQLITE_ERROR, "ignored");
        assert!(bridge.adapter().is_none());
        assert!(bridge.status().is_none());
    }

    #[test]
    fn test_install_without_file() {
        let bridge = Bridge::new();
        let report = bridge
            .install(&config(LogLevel::Warn, None, LogLevel::Info), RecordingSink::default)
            .unwrap();

        assert!(report.delegate_path.is_none());
        assert!(report.warnings.is_empty());

        bridge.forward(ffi::SQLITE_NOTICE, "recovered frames");
        bridge.forward(ffi::SQLITE_WARNING_AUTOINDEX, "automatic index");
        bridge.forward(ffi::SQLITE_CORRUPT, "database corruption");

        assert_eq!(
            printed(&bridge),
            vec![
                (
                    HostSeverity::Warning,
                    "LibSQLite:(284) automatic index".to_string()
                ),
                (
                    HostSeverity::Error,
                    "LibSQLite:(11) database corruption".to_string()
                ),
            ]
        );

        let status = bridge.status().unwrap();
        assert_eq!(status.threshold, LogLevel::Warn);
        assert!(status.delegate.is_none());
    }

    #[test]
    fn test_install_with_file_delegate() {
        let temp_path = "/tmp/test_sqlite_errlog_bridge.log";
        let _ = fs::remove_file(temp_path);

        let bridge = Bridge::new();
        let report = bridge
            .install(
                &config(LogLevel::Warn, Some(temp_path), LogLevel::Error),
                RecordingSink::default,
            )
            .unwrap();
        assert_eq!(report.delegate_path.as_deref(), Some(temp_path));

        // Delegate threshold lowered to the adapter's
        let status = bridge.status().unwrap();
        assert_eq!(
            status.delegate,
            Some(DelegateStatus {
                path: temp_path.to_string(),
                threshold: LogLevel::Warn,
            })
        );

        bridge.forward(ffi::SQLITE_NOTICE, "notice");
        bridge.forward(ffi::SQLITE_WARNING, "warning");

        let contents = fs::read_to_string(temp_path).unwrap();
        assert_eq!(contents, "[warn] (28) warning\n");
        assert_eq!(printed(&bridge).len(), 1);

        let _ = fs::remove_file(temp_path);
    }

    #[test]
    fn test_reinstall_updates_thresholds() {
        let temp_path = "/tmp/test_sqlite_errlog_bridge_reload.log";
        let _ = fs::remove_file(temp_path);

        let bridge = Bridge::new();
        bridge
            .install(
                &config(LogLevel::Warn, Some(temp_path), LogLevel::Info),
                RecordingSink::default,
            )
            .unwrap();

        let report = bridge
            .install(
                &config(LogLevel::Error, Some(temp_path), LogLevel::Fatal),
                RecordingSink::default,
            )
            .unwrap();
        assert!(report.warnings.is_empty());

        let status = bridge.status().unwrap();
        assert_eq!(status.threshold, LogLevel::Error);
        assert_eq!(status.delegate.unwrap().threshold, LogLevel::Error);

        let _ = fs::remove_file(temp_path);
    }

    #[test]
    fn test_reinstall_warns_on_tag_change() {
        let bridge = Bridge::new();
        bridge
            .install(&config(LogLevel::Error, None, LogLevel::Info), RecordingSink::default)
            .unwrap();

        let mut changed = config(LogLevel::Error, None, LogLevel::Info);
        changed.tag = LogTag::parse("Other:").unwrap();
        let report = bridge.install(&changed, RecordingSink::default).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Other:"));
        assert_eq!(bridge.status().unwrap().tag, "LibSQLite:");
    }

    #[test]
    fn test_reinstall_warns_on_file_change() {
        let first_path = "/tmp/test_sqlite_errlog_bridge_first.log";
        let second_path = "/tmp/test_sqlite_errlog_bridge_second.log";
        let _ = fs::remove_file(first_path);
        let _ = fs::remove_file(second_path);

        let bridge = Bridge::new();
        bridge
            .install(
                &config(LogLevel::Error, Some(first_path), LogLevel::Info),
                RecordingSink::default,
            )
            .unwrap();

        let report = bridge
            .install(
                &config(LogLevel::Error, Some(second_path), LogLevel::Info),
                RecordingSink::default,
            )
            .unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains(second_path));
        assert!(report.warnings[0].contains(first_path));
        assert_eq!(report.delegate_path.as_deref(), Some(first_path));
        assert_eq!(bridge.status().unwrap().delegate.unwrap().path, first_path);

        let _ = fs::remove_file(first_path);
        let _ = fs::remove_file(second_path);
    }

    #[test]
    fn test_reinstall_without_file_keeps_delegate() {
        let temp_path = "/tmp/test_sqlite_errlog_bridge_dropped.log";
        let _ = fs::remove_file(temp_path);

        let bridge = Bridge::new();
        bridge
            .install(
                &config(LogLevel::Error, Some(temp_path), LogLevel::Info),
                RecordingSink::default,
            )
            .unwrap();

        let report = bridge
            .install(&config(LogLevel::Error, None, LogLevel::Info), RecordingSink::default)
            .unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("needs a restart"));
        assert!(report.warnings[0].contains(temp_path));
        assert_eq!(report.delegate_path.as_deref(), Some(temp_path));

        // Report and status agree on the delegate still in use
        let status = bridge.status().unwrap();
        assert_eq!(status.delegate.unwrap().path, temp_path);

        bridge.forward(ffi::SQLITE_ERROR, "after reload");
        let contents = fs::read_to_string(temp_path).unwrap();
        assert_eq!(contents, "[error] (1) after reload\n");

        let _ = fs::remove_file(temp_path);
    }

    #[test]
    fn test_install_fails_for_unwritable_file() {
        let bridge = Bridge::new();
        let result = bridge.install(
            &config(LogLevel::Error, Some("/nonexistent/dir/sqlite.log"), LogLevel::Info),
            RecordingSink::default,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_status_serializes_to_json() {
        let status = BridgeStatus {
            tag: "LibSQLite:".to_string(),
            threshold: LogLevel::Warn,
            delegate: Some(DelegateStatus {
                path: "/var/log/sqlite.log".to_string(),
                threshold: LogLevel::Info,
            }),
        };

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "tag": "LibSQLite:",
                "threshold": "warn",
                "delegate": {"path": "/var/log/sqlite.log", "threshold": "info"}
            })
        );
    }
}
