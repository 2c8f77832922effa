//! Logging module for the mapping engine
//!
//! Every component takes a [`LoggingService`] handle. There is no global
//! logger, so tests can hand a [`MemoryLogger`] to the component under test
//! and assert on what it reported.

pub mod codes;
pub mod events;
pub mod service;

// Re-export main types
pub use codes::Code;
pub use events::{LogEvent, LogLevel};
#[cfg(feature = "log-facade")]
pub use service::LogFacadeLogger;
pub use service::{
    create_test_logger, ConsoleLogger, Logger, LoggingService, MemoryLogger, MultiLogger,
    NullLogger, StructuredLogger,
};

use crate::config::runtime::{LogFormat, LoggingPreferences};
use std::sync::Arc;

/// Build a service from runtime preferences
pub fn create_logging_service(preferences: &LoggingPreferences) -> LoggingService {
    let min_level = preferences.min_log_level;
    match preferences.format {
        LogFormat::Text => LoggingService::console(min_level),
        LogFormat::Json => LoggingService::structured(min_level),
        #[cfg(feature = "log-facade")]
        LogFormat::Facade => LoggingService::new(Arc::new(LogFacadeLogger), min_level),
        #[cfg(not(feature = "log-facade"))]
        LogFormat::Facade => {
            LoggingService::new(Arc::new(ConsoleLogger::new(min_level)), min_level)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_from_preferences() {
        let preferences = LoggingPreferences {
            min_log_level: LogLevel::Warning,
            format: LogFormat::Json,
        };
        let service = create_logging_service(&preferences);
        assert_eq!(service.min_level(), LogLevel::Warning);
        assert!(!service.should_log(LogLevel::Info));
    }
}
