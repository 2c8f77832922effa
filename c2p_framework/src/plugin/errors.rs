//! Error types for plugins and the plugin registry

use crate::error::C2PError;
use crate::logging::{codes, Code};

/// Failures raised by a plugin while transforming results or writing deliverables
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Parameter '{parameter_id}' targets a value of unsupported type")]
    UnsupportedParameterValue { parameter_id: String },

    #[error("Parameter '{parameter_id}' has invalid value: {reason}")]
    InvalidParameterValue { parameter_id: String, reason: String },

    #[error("Path '{path}' exists but is not a directory")]
    NotADirectory { path: String },

    #[error("Template directory not found: {path}")]
    TemplateNotFound { path: String },

    #[error("Filesystem error at '{path}': {source}")]
    Filesystem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid template '{path}': {reason}")]
    InvalidTemplate { path: String, reason: String },

    #[error("Invalid raw result: {reason}")]
    InvalidRawResult { reason: String },

    #[error("Plugin '{plugin}' requires configuration for this operation")]
    MissingConfig { plugin: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Core(#[from] C2PError),
}

impl PluginError {
    pub fn filesystem(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn invalid_template(path: impl AsRef<std::path::Path>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidTemplate {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_raw_result(reason: impl std::fmt::Display) -> Self {
        Self::InvalidRawResult {
            reason: reason.to_string(),
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            PluginError::UnsupportedParameterValue { .. } => codes::plugin::UNSUPPORTED_PARAMETER_VALUE,
            PluginError::InvalidParameterValue { .. } => codes::plugin::INVALID_PARAMETER_VALUE,
            PluginError::NotADirectory { .. } => codes::plugin::NOT_A_DIRECTORY,
            PluginError::TemplateNotFound { .. } => codes::plugin::TEMPLATE_NOT_FOUND,
            PluginError::Filesystem { .. } => codes::plugin::FILESYSTEM_ERROR,
            PluginError::InvalidTemplate { .. } => codes::plugin::INVALID_TEMPLATE,
            PluginError::InvalidRawResult { .. } => codes::plugin::INVALID_RAW_RESULT,
            PluginError::MissingConfig { .. } => codes::plugin::MISSING_CONFIG,
            PluginError::Registry(e) => e.error_code(),
            PluginError::Core(e) => e.error_code(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            PluginError::UnsupportedParameterValue { parameter_id } => format!(
                "Parameter '{}' can only replace a list, string, integer or float value",
                parameter_id
            ),
            PluginError::MissingConfig { plugin } => format!(
                "Add a [plugins.{}] table to the configuration file",
                plugin
            ),
            PluginError::Registry(e) => e.user_message(),
            PluginError::Core(e) => e.user_message(),
            _ => self.to_string(),
        }
    }
}

/// Plugin registration and lookup errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Plugin '{name}' is already registered")]
    DuplicatePlugin { name: String },

    #[error("Plugin not found: {name}")]
    PluginNotFound { name: String, available: Vec<String> },
}

impl RegistryError {
    pub fn error_code(&self) -> Code {
        match self {
            RegistryError::DuplicatePlugin { .. } => codes::plugin::DUPLICATE_PLUGIN,
            RegistryError::PluginNotFound { .. } => codes::plugin::PLUGIN_NOT_FOUND,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            RegistryError::PluginNotFound { name, available } => format!(
                "Unknown plugin '{}'. Available plugins: {}",
                name,
                available.join(", ")
            ),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_error_codes() {
        let err = PluginError::UnsupportedParameterValue {
            parameter_id: "a.b".to_string(),
        };
        assert_eq!(err.error_code(), codes::plugin::UNSUPPORTED_PARAMETER_VALUE);
        assert!(err.user_message().contains("a.b"));

        let wrapped: PluginError = C2PError::config("bad").into();
        assert_eq!(wrapped.error_code(), codes::loading::CONFIG_ERROR);
    }

    #[test]
    fn test_registry_error_lists_available() {
        let err = RegistryError::PluginNotFound {
            name: "nope".to_string(),
            available: vec!["auditree".to_string(), "ocm".to_string()],
        };
        assert_eq!(err.error_code(), codes::plugin::PLUGIN_NOT_FOUND);
        assert!(err.user_message().contains("auditree, ocm"));
    }
}
