//! Configuration structures for the sqlite-errlog module

/// Global (HTTP main) configuration, as written in nginx.conf
///
/// Values are kept raw here and validated in `parsing`.
#[derive(Debug, Default, Clone)]
pub struct MainConfig {
    pub log_level: String,
    pub log_tag: String,
    pub log_file: String,
    pub log_file_level: String,
}
