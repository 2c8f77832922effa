//! Profile model

use super::common::Metadata;
use serde::{Deserialize, Serialize};

/// Document wrapper carrying the `profile` root key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRoot {
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Profile {
    pub uuid: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<serde_json::Value>,
}

impl Profile {
    /// Control ids explicitly included by the imports, in document order
    pub fn selected_control_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for import in &self.imports {
            for selection in &import.include_controls {
                for id in &selection.with_ids {
                    if !ids.contains(&id.as_str()) {
                        ids.push(id);
                    }
                }
            }
        }
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Import {
    pub href: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_controls: Vec<SelectControls>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelectControls {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub with_ids: Vec<String>,
}
