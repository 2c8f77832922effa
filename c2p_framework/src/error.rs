//! Domain errors for loading, parsing and writing documents

use crate::logging::{codes, Code};

/// Errors raised while loading configuration or OSCAL documents
///
/// All of these are fatal to the invocation that raised them.
#[derive(Debug, thiserror::Error)]
pub enum C2PError {
    #[error("Failed to load '{path}': {reason}")]
    Load { path: String, reason: String },

    #[error("Failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Failed to serialize {what}: {reason}")]
    Serialize { what: String, reason: String },

    #[error("I/O error at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl C2PError {
    pub fn load(path: impl AsRef<std::path::Path>, reason: impl std::fmt::Display) -> Self {
        Self::Load {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(what: &str, reason: impl std::fmt::Display) -> Self {
        Self::Parse {
            what: what.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn config(message: &str) -> Self {
        Self::Config {
            message: message.to_string(),
        }
    }

    pub fn serialize(what: &str, reason: impl std::fmt::Display) -> Self {
        Self::Serialize {
            what: what.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Get the appropriate log code for this error type
    pub fn error_code(&self) -> Code {
        match self {
            C2PError::Load { .. } => codes::loading::DOCUMENT_LOAD_FAILURE,
            C2PError::Parse { .. } => codes::loading::DOCUMENT_PARSE_FAILURE,
            C2PError::Config { .. } => codes::loading::CONFIG_ERROR,
            C2PError::Serialize { .. } => codes::loading::SERIALIZATION_FAILURE,
            C2PError::Io { .. } => codes::loading::IO_ERROR,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            C2PError::Load { path, reason } => {
                format!("Could not load '{}'. {}", path, reason)
            }
            C2PError::Config { message } => {
                format!("Configuration problem: {}", message)
            }
            _ => self.to_string(),
        }
    }
}
