//! Parse raw configuration strings into validated domain types

use crate::config::MainConfig;
use crate::domain::ValidatedConfig;
use crate::types::{LogFilePath, LogLevel, LogTag};

const DEFAULT_THRESHOLD: LogLevel = LogLevel::Error;
const DEFAULT_FILE_THRESHOLD: LogLevel = LogLevel::Info;

/// Parse raw configuration into validated domain configuration
pub fn parse_config(config: &MainConfig) -> Result<ValidatedConfig, String> {
    let threshold = parse_level_or(&config.log_level, DEFAULT_THRESHOLD)
        .map_err(|e| format!("invalid sqlite_log_level: {}", e))?;

    let tag = if config.log_tag.is_empty() {
        LogTag::default()
    } else {
        LogTag::parse(&config.log_tag).map_err(|e| format!("invalid sqlite_log_tag: {}", e))?
    };

    let log_file = if config.log_file.is_empty() {
        None
    } else {
        Some(
            LogFilePath::parse(&config.log_file)
                .map_err(|e| format!("invalid sqlite_log_file: {}", e))?,
        )
    };

    if log_file.is_none() && !config.log_file_level.is_empty() {
        return Err("sqlite_log_file_level requires sqlite_log_file".to_string());
    }

    let file_threshold = parse_level_or(&config.log_file_level, DEFAULT_FILE_THRESHOLD)
        .map_err(|e| format!("invalid sqlite_log_file_level: {}", e))?;

    Ok(ValidatedConfig {
        threshold,
        tag,
        log_file,
        file_threshold,
    })
}

/// Unset directives fall back to `default`
fn parse_level_or(value: &str, default: LogLevel) -> Result<LogLevel, String> {
    if value.is_empty() {
        Ok(default)
    } else {
        LogLevel::parse(value)
    }
}
