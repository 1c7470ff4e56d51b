//! Type-safe wrappers for log levels, tags and paths (Parse, Don't Validate)

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Storage engine severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

impl LogLevel {
    /// Parse a directive value such as `warn` (case-insensitive)
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" => Ok(LogLevel::Fatal),
            "" => Err("log level cannot be empty".to_string()),
            other => Err(format!(
                "unknown log level '{}' (expected debug, info, warn, error or fatal)",
                other
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    /// Inverse of `as_u8`; out-of-range values saturate to `Fatal`
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            _ => LogLevel::Fatal,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The host's three-tier severity scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostSeverity {
    Error,
    Warning,
    Information,
}

impl HostSeverity {
    /// Collapse an engine level onto the host scale
    pub fn from_level(level: LogLevel) -> Self {
        if level >= LogLevel::Error {
            HostSeverity::Error
        } else if level >= LogLevel::Warn {
            HostSeverity::Warning
        } else {
            HostSeverity::Information
        }
    }
}

/// Prefix prepended to every message sent to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTag(String);

impl LogTag {
    pub const DEFAULT: &'static str = "LibSQLite:";

    pub fn parse(tag: impl Into<String>) -> Result<Self, String> {
        let tag = tag.into();

        if tag.is_empty() {
            return Err("log tag cannot be empty".to_string());
        }

        if tag.chars().any(|c| c.is_control()) {
            return Err(format!("log tag must not contain control characters: {:?}", tag));
        }

        Ok(LogTag(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LogTag {
    fn default() -> Self {
        LogTag(Self::DEFAULT.to_string())
    }
}

/// Path of the delegate log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilePath(PathBuf);

impl LogFilePath {
    pub fn parse(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();

        if path.as_os_str().is_empty() {
            return Err("log file path cannot be empty".to_string());
        }

        if path.is_dir() {
            return Err(format!("log file path is a directory: {}", path.display()));
        }

        Ok(LogFilePath(path.to_path_buf()))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.to_str().unwrap_or("")
    }
}
