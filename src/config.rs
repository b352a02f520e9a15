use clap::ValueEnum;
use simplelog::LevelFilter;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Runtime settings shared by every command.
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: LevelFilter,
    /// Pause between consecutive saves when downloading every split.
    pub download_delay: Duration,
}

impl Settings {
    pub fn new(log_level: LogLevel, download_delay_ms: u64) -> Self {
        Settings {
            log_level: log_level.into(),
            download_delay: Duration::from_millis(download_delay_ms),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::new(LogLevel::Warn, 300)
    }
}
