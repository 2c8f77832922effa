//! Log events emitted by the mapping engine

use super::codes::Code;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Codes for events logged without a dedicated code
pub mod uncoded {
    use super::Code;

    pub const WARNING: Code = Code::new("W000");
    pub const INFO: Code = Code::new("I000");
    pub const DEBUG: Code = Code::new("D000");
}

/// Severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Parse a level name as used in environment variables and CLI flags
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warning),
            "info" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One logged occurrence
///
/// Context keys are kept sorted so text and JSON output are stable.
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub code: Code,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl LogEvent {
    pub fn new(level: LogLevel, code: Code, message: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            code,
            message: message.to_string(),
            context: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }

    pub fn is_warning(&self) -> bool {
        self.level == LogLevel::Warning
    }

    /// `[LEVEL] CODE - message (k=v, ...)`
    pub fn format(&self) -> String {
        let line = format!("[{}] {} - {}", self.level.as_str(), self.code, self.message);
        if self.context.is_empty() {
            return line;
        }

        let pairs: Vec<String> = self
            .context
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{} ({})", line, pairs.join(", "))
    }

    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
