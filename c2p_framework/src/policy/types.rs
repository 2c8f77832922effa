//! Policy value objects: rule sets and parameters

use super::grouping::PropertyRow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A rule of a PVP paired with the check that evaluates it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Effective rule id, read through the configured rule-id column
    pub rule_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_description: Option<String>,
    /// Effective check id, read through the configured check-id column
    pub check_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_description: Option<String>,
    /// The full source row for plugin-specific columns
    pub raw: PropertyRow,
}

/// A parameter consumed by a target component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Always text here; plugins coerce it to the type they need
    pub value: String,
}

impl Parameter {
    pub fn new(id: &str, value: &str) -> Self {
        Self {
            id: id.to_string(),
            description: None,
            value: value.to_string(),
        }
    }
}

/// Rules and parameters extracted from one component-definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub rule_sets: Vec<RuleSet>,
    pub parameters: Vec<Parameter>,
}

impl Policy {
    pub fn new(rule_sets: Vec<RuleSet>, parameters: Vec<Parameter>) -> Self {
        Self {
            rule_sets,
            parameters,
        }
    }

    /// Parameter id to value, as used for placeholder rendering
    pub fn parameter_values(&self) -> HashMap<String, String> {
        self.parameters
            .iter()
            .map(|p| (p.id.clone(), p.value.clone()))
            .collect()
    }

    /// First rule set whose effective check id equals `check_id`
    pub fn find_rule_set(&self, check_id: &str) -> Option<&RuleSet> {
        self.rule_sets.iter().find(|r| r.check_id == check_id)
    }
}
