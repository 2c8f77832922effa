// RUNTIME PREFERENCES (User Experience)

use crate::logging::LogLevel;
use std::env;

/// Output format of the logging service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `[LEVEL] CODE - message` lines
    Text,
    /// One JSON object per event
    Json,
    /// Hand events to the `log` crate
    Facade,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "console" => Some(LogFormat::Text),
            "json" | "structured" => Some(LogFormat::Json),
            "facade" | "log" => Some(LogFormat::Facade),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingPreferences {
    /// User preferred minimum log level
    pub min_log_level: LogLevel,

    /// Where and how events are written
    pub format: LogFormat,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| LogLevel::parse(&v))
                .unwrap_or(LogLevel::Info),
            format: env::var(env_vars::LOGGING_FORMAT)
                .ok()
                .and_then(|v| LogFormat::parse(&v))
                .unwrap_or(LogFormat::Facade),
        }
    }
}

impl LoggingPreferences {
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_log_level = level;
        self
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    pub const LOGGING_MIN_LEVEL: &str = "C2P_LOGGING_MIN_LEVEL";
    pub const LOGGING_FORMAT: &str = "C2P_LOGGING_FORMAT";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("TEXT"), Some(LogFormat::Text));
        assert_eq!(LogFormat::parse("facade"), Some(LogFormat::Facade));
        assert_eq!(LogFormat::parse("xml"), None);
    }

    #[test]
    fn test_with_min_level_overrides() {
        let preferences = LoggingPreferences::default().with_min_level(LogLevel::Debug);
        assert_eq!(preferences.min_log_level, LogLevel::Debug);
    }

    #[test]
    fn test_env_var_names_exist() {
        assert!(!env_vars::LOGGING_MIN_LEVEL.is_empty());
        assert!(!env_vars::LOGGING_FORMAT.is_empty());
    }
}
