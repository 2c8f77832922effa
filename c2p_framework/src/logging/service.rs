//! Logging service and logger implementations
//!
//! The service is an injected handle. Components receive a `LoggingService`
//! at construction time instead of reaching for a process-wide logger.

use super::codes::Code;
use super::events::{uncoded, LogEvent, LogLevel};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Sink for log events
pub trait Logger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

/// Logging handle passed into every component that reports soft drops
#[derive(Clone)]
pub struct LoggingService {
    logger: Arc<dyn Logger>,
    min_level: LogLevel,
}

impl std::fmt::Debug for LoggingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingService")
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

impl LoggingService {
    pub fn new(logger: Arc<dyn Logger>, min_level: LogLevel) -> Self {
        Self { logger, min_level }
    }

    /// Human-readable lines on stderr
    pub fn console(min_level: LogLevel) -> Self {
        Self::new(Arc::new(ConsoleLogger::new(min_level)), min_level)
    }

    /// One JSON object per line on stderr
    pub fn structured(min_level: LogLevel) -> Self {
        Self::new(Arc::new(StructuredLogger::new(min_level)), min_level)
    }

    /// Service that discards every event
    pub fn disabled() -> Self {
        Self::new(Arc::new(NullLogger), LogLevel::Error)
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn set_min_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        level <= self.min_level
    }

    pub fn log_event(&self, event: LogEvent) {
        if self.should_log(event.level) {
            self.logger.log(&event);
        }
    }

    /// Build and log an event unless the level is filtered out
    fn emit(&self, level: LogLevel, code: Code, message: &str, context: &[(&str, &str)]) {
        if !self.should_log(level) {
            return;
        }
        let event = context
            .iter()
            .fold(LogEvent::new(level, code, message), |event, (key, value)| {
                event.with_context(key, value)
            });
        self.logger.log(&event);
    }

    pub fn log_error(&self, code: Code, message: &str) {
        self.emit(LogLevel::Error, code, message, &[]);
    }

    pub fn log_error_with_context(&self, code: Code, message: &str, context: Vec<(&str, &str)>) {
        self.emit(LogLevel::Error, code, message, &context);
    }

    /// Soft drops and other recoverable conditions
    pub fn log_warning_with_code(&self, code: Code, message: &str) {
        self.emit(LogLevel::Warning, code, message, &[]);
    }

    pub fn log_warning_with_context(&self, code: Code, message: &str, context: Vec<(&str, &str)>) {
        self.emit(LogLevel::Warning, code, message, &context);
    }

    pub fn log_warning(&self, message: &str) {
        self.emit(LogLevel::Warning, uncoded::WARNING, message, &[]);
    }

    /// Completed steps are logged at info level with an `S` code
    pub fn log_success(&self, code: Code, message: &str) {
        self.emit(LogLevel::Info, code, message, &[]);
    }

    pub fn log_success_with_context(&self, code: Code, message: &str, context: Vec<(&str, &str)>) {
        self.emit(LogLevel::Info, code, message, &context);
    }

    pub fn log_info(&self, message: &str) {
        self.emit(LogLevel::Info, uncoded::INFO, message, &[]);
    }

    pub fn log_debug(&self, message: &str) {
        self.emit(LogLevel::Debug, uncoded::DEBUG, message, &[]);
    }

    /// Expected drops that are only worth seeing when tracing a run
    pub fn log_debug_with_context(&self, code: Code, message: &str, context: Vec<(&str, &str)>) {
        self.emit(LogLevel::Debug, code, message, &context);
    }
}

/// Text lines on stderr
pub struct ConsoleLogger {
    min_level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, event: &LogEvent) {
        // stdout is reserved for generated documents
        if event.level <= self.min_level {
            eprintln!("{}", event.format());
        }
    }
}

/// JSON lines on stderr
pub struct StructuredLogger {
    min_level: LogLevel,
}

impl StructuredLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }
}

impl Logger for StructuredLogger {
    fn log(&self, event: &LogEvent) {
        if event.level <= self.min_level {
            match event.format_json() {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}", event.format()),
            }
        }
    }
}

/// Logger that drops everything
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _event: &LogEvent) {}
}

/// Forwards events to the `log` facade under the `c2p` target
#[cfg(feature = "log-facade")]
pub struct LogFacadeLogger;

#[cfg(feature = "log-facade")]
impl Logger for LogFacadeLogger {
    fn log(&self, event: &LogEvent) {
        let level = match event.level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        };
        log::log!(target: "c2p", level, "{} - {}", event.code, event.message);
        if !event.context.is_empty() {
            log::log!(target: "c2p", log::Level::Trace, "context: {:?}", event.context);
        }
    }
}

/// Records events in memory so tests can assert on them
pub struct MemoryLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_events(&self) -> Vec<LogEvent> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn event_count(&self) -> usize {
        self.lock().len()
    }

    pub fn get_errors(&self) -> Vec<LogEvent> {
        self.lock().iter().filter(|e| e.is_error()).cloned().collect()
    }

    pub fn get_warnings(&self) -> Vec<LogEvent> {
        self.lock().iter().filter(|e| e.is_warning()).cloned().collect()
    }

    pub fn get_events_with_code(&self, code: Code) -> Vec<LogEvent> {
        self.lock()
            .iter()
            .filter(|e| e.code == code)
            .cloned()
            .collect()
    }

    pub fn has_warning_with_code(&self, code: Code) -> bool {
        self.lock().iter().any(|e| e.is_warning() && e.code == code)
    }

    pub fn has_success_with_code(&self, code: Code) -> bool {
        self.lock()
            .iter()
            .any(|e| e.level == LogLevel::Info && e.code == code)
    }
}

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, event: &LogEvent) {
        self.lock().push(event.clone());
    }
}

/// Fans each event out to several loggers
pub struct MultiLogger {
    loggers: Vec<Arc<dyn Logger>>,
}

impl MultiLogger {
    pub fn new(loggers: Vec<Arc<dyn Logger>>) -> Self {
        Self { loggers }
    }
}

impl Logger for MultiLogger {
    fn log(&self, event: &LogEvent) {
        for logger in &self.loggers {
            logger.log(event);
        }
    }
}

/// Create a debug-level service backed by a memory logger for tests
pub fn create_test_logger() -> (LoggingService, Arc<MemoryLogger>) {
    let memory = Arc::new(MemoryLogger::new());
    let service = LoggingService::new(memory.clone(), LogLevel::Debug);
    (service, memory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    #[test]
    fn test_service_filters_by_level() {
        let memory = Arc::new(MemoryLogger::new());
        let service = LoggingService::new(memory.clone(), LogLevel::Warning);

        service.log_debug("hidden");
        service.log_info("hidden");
        service.log_warning_with_code(codes::extraction::ROW_DROPPED, "row dropped");
        service.log_error(codes::system::INTERNAL_ERROR, "boom");

        assert_eq!(memory.event_count(), 2);
        assert!(memory.has_warning_with_code(codes::extraction::ROW_DROPPED));
        assert_eq!(memory.get_errors().len(), 1);
    }

    #[test]
    fn test_cloned_service_shares_logger() {
        let (service, memory) = create_test_logger();
        let clone = service.clone();

        service.log_info("first");
        clone.log_success(codes::success::DOCUMENT_LOADED, "second");

        assert_eq!(memory.event_count(), 2);
        assert!(memory.has_success_with_code(codes::success::DOCUMENT_LOADED));
    }

    #[test]
    fn test_context_is_recorded() {
        let (service, memory) = create_test_logger();
        service.log_warning_with_context(
            codes::projection::OBSERVATION_DROPPED,
            "no rule set",
            vec![("check_id", "C1")],
        );

        let events = memory.get_events_with_code(codes::projection::OBSERVATION_DROPPED);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].context.get("check_id").map(String::as_str), Some("C1"));
    }

    #[test]
    fn test_multi_logger_fans_out() {
        let first = Arc::new(MemoryLogger::new());
        let second = Arc::new(MemoryLogger::new());
        let multi = MultiLogger::new(vec![first.clone(), second.clone()]);
        let service = LoggingService::new(Arc::new(multi), LogLevel::Info);

        service.log_info("both");

        assert_eq!(first.event_count(), 1);
        assert_eq!(second.event_count(), 1);
    }

    #[test]
    fn test_disabled_service_drops_events() {
        let service = LoggingService::disabled();
        assert!(!service.should_log(LogLevel::Warning));
        service.log_warning("nobody listens");
    }
}
