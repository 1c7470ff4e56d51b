//! Engine-side file logger, attached to the adapter as its delegate

use crate::domain::EngineLogger;
use crate::types::{LogFilePath, LogLevel};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};

/// Appends `[level] message` lines to a file, filtered by its own threshold
pub struct FileLogger {
    path: LogFilePath,
    file: Mutex<File>,
    threshold: AtomicU8,
}

impl FileLogger {
    pub fn open(path: &LogFilePath, threshold: LogLevel) -> Result<Self, String> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_path())
            .map_err(|e| format!("failed to open log file '{}': {}", path.as_str(), e))?;

        Ok(FileLogger {
            path: path.clone(),
            file: Mutex::new(file),
            threshold: AtomicU8::new(threshold.as_u8()),
        })
    }

    pub fn path(&self) -> &LogFilePath {
        &self.path
    }
}

impl EngineLogger for FileLogger {
    fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if level < self.threshold() {
            return;
        }

        // A poisoned lock or a failed write only loses this line
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "[{}] {}", level, args);
        }
    }

    fn threshold(&self) -> LogLevel {
        LogLevel::from_u8(self.threshold.load(Ordering::Relaxed))
    }

    fn set_threshold(&self, level: LogLevel) {
        self.threshold.store(level.as_u8(), Ordering::Relaxed);
    }
}
