//! Raw tool output handed to plugins

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResultMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
}

/// Tool-native data already decoded from its wire format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub metadata: RawResultMetadata,
    pub data: Value,
    /// Plugin-specific knobs such as an evidence locker URL
    #[serde(default)]
    pub additional_props: Map<String, Value>,
}

impl RawResult {
    pub fn new(data: Value) -> Self {
        Self {
            metadata: RawResultMetadata::default(),
            data,
            additional_props: Map::new(),
        }
    }

    pub fn with_filepath(mut self, filepath: &str) -> Self {
        self.metadata.filepath = Some(filepath.to_string());
        self
    }

    pub fn with_additional_prop(mut self, key: &str, value: Value) -> Self {
        self.additional_props.insert(key.to_string(), value);
        self
    }

    /// String-valued additional property
    pub fn additional_str(&self, key: &str) -> Option<&str> {
        self.additional_props.get(key).and_then(Value::as_str)
    }
}
