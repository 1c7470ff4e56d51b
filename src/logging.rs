//! nginx error-log sink and structured logging utilities for sqlite-errlog

use crate::domain::HostSink;
use crate::types::HostSeverity;
use ngx::ffi::{
    NGX_LOG_EMERG, NGX_LOG_ERR, NGX_LOG_INFO, NGX_LOG_NOTICE, NGX_LOG_WARN, ngx_conf_t,
    ngx_log_t, ngx_uint_t,
};
use ngx::http::Request;
use ngx::ngx_log_error;
use std::fmt;

/// nginx log level for a host severity
pub fn ngx_level(severity: HostSeverity) -> ngx_uint_t {
    match severity {
        HostSeverity::Error => NGX_LOG_ERR as ngx_uint_t,
        HostSeverity::Warning => NGX_LOG_WARN as ngx_uint_t,
        HostSeverity::Information => NGX_LOG_INFO as ngx_uint_t,
    }
}

/// Host sink writing to the error log of the running cycle
#[derive(Debug, Default, Clone, Copy)]
pub struct NginxErrorLog;

impl HostSink for NginxErrorLog {
    fn print(&self, severity: HostSeverity, message: fmt::Arguments<'_>) {
        write_to_log(cycle_log(), severity, message);
    }
}

/// Write one message to `log`; returns false when there is no log to write to
fn write_to_log(log: *mut ngx_log_t, severity: HostSeverity, message: fmt::Arguments<'_>) -> bool {
    if log.is_null() {
        return false;
    }

    let level = ngx_level(severity);
    unsafe {
        ngx_log_error!(level, log, "{}", message);
    }
    true
}

/// Log of the running cycle.
///
/// Null before nginx has created its first cycle (early startup); messages
/// printed then are dropped.
fn cycle_log() -> *mut ngx_log_t {
    unsafe {
        let cycle = ngx::ffi::ngx_cycle;
        if cycle.is_null() {
            return std::ptr::null_mut();
        }
        (*cycle).log
    }
}

/// Log a request-scoped message with context using nginx's native logging
pub fn log(request: &mut Request, severity: HostSeverity, module: &str, message: &str) {
    let level = ngx_level(severity);

    let r: *mut ngx::ffi::ngx_http_request_t = request.into();
    unsafe {
        let connection = (*r).connection;
        if !connection.is_null() {
            let log = (*connection).log;
            if !log.is_null() {
                ngx_log_error!(level, log, "[sqlite-errlog:{}] {}", module, message);
            }
        }
    }
}

/// Log against the configuration being parsed
fn log_conf(cf: *mut ngx_conf_t, level: ngx_uint_t, module: &str, message: &str) {
    unsafe {
        if cf.is_null() {
            return;
        }
        let log = (*cf).log;
        if !log.is_null() {
            ngx_log_error!(level, log, "[sqlite-errlog:{}] {}", module, message);
        }
    }
}

/// Log configuration validation error (fatal for startup)
pub fn log_config_error(cf: *mut ngx_conf_t, error: &str) {
    log_conf(
        cf,
        NGX_LOG_EMERG as ngx_uint_t,
        "config",
        &format!("Invalid configuration: {}", error),
    );
}

/// Log a non-fatal installation problem
pub fn log_install_warning(cf: *mut ngx_conf_t, error: &str) {
    log_conf(cf, NGX_LOG_WARN as ngx_uint_t, "install", error);
}

/// Log successful bridge installation
pub fn log_installed(cf: *mut ngx_conf_t, threshold: &str, delegate: Option<&str>) {
    log_conf(
        cf,
        NGX_LOG_NOTICE as ngx_uint_t,
        "install",
        &format!(
            "SQLite log routed to error log: threshold={} delegate={}",
            threshold,
            delegate.unwrap_or("none")
        ),
    );
}
