//! SQLite error-log hook: result codes to engine levels

use crate::types::LogLevel;
use rusqlite::ffi;
use std::os::raw::c_int;

/// Engine level for a code passed to SQLite's log callback.
///
/// Only the primary result code (low byte) is considered, so extended
/// codes such as `SQLITE_NOTICE_RECOVER_WAL` map like their primary code.
pub fn level_for_code(code: c_int) -> LogLevel {
    match code & 0xff {
        ffi::SQLITE_OK | ffi::SQLITE_NOTICE => LogLevel::Info,
        ffi::SQLITE_WARNING => LogLevel::Warn,
        _ => LogLevel::Error,
    }
}

/// Register `callback` as SQLite's process-wide log callback.
///
/// Must happen before SQLite initializes; afterwards SQLite rejects it.
pub fn register(callback: fn(c_int, &str)) -> Result<(), String> {
    unsafe { rusqlite::trace::config_log(Some(callback)) }
        .map_err(|e| format!("failed to register SQLite log callback: {}", e))
}
