//! Unified observation model produced by every plugin

use crate::error::C2PError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outcome of evaluating one subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultEnum {
    Pass,
    Failure,
    Error,
}

impl ResultEnum {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultEnum::Pass => "pass",
            ResultEnum::Failure => "failure",
            ResultEnum::Error => "error",
        }
    }
}

impl std::fmt::Display for ResultEnum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Reference to evidence or another resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub description: String,
    pub href: String,
}

impl Link {
    pub fn new(description: &str, href: &str) -> Self {
        Self {
            description: description.to_string(),
            href: href.to_string(),
        }
    }
}

/// An evaluated entity (resource, cluster, inventory item)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub title: String,
    #[serde(rename = "type")]
    pub subject_type: String,
    pub resource_id: String,
    pub result: ResultEnum,
    /// Falls back to the observation's `collected` time when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluated_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<Property>>,
}

impl Subject {
    pub fn new(title: &str, subject_type: &str, resource_id: &str, result: ResultEnum) -> Self {
        Self {
            title: title.to_string(),
            subject_type: subject_type.to_string(),
            resource_id: resource_id.to_string(),
            result,
            evaluated_on: None,
            reason: None,
            props: None,
        }
    }

    pub fn with_evaluated_on(mut self, evaluated_on: DateTime<Utc>) -> Self {
        self.evaluated_on = Some(evaluated_on);
        self
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }
}

/// All subjects evaluated by one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationByCheck {
    /// Defaults to `check_id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Defaults to `check_id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub check_id: String,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    pub collected: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_evidences: Option<Vec<Link>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<Property>>,
}

impl ObservationByCheck {
    pub fn new(check_id: &str, methods: Vec<String>, collected: DateTime<Utc>) -> Self {
        Self {
            title: None,
            description: None,
            check_id: check_id.to_string(),
            methods,
            subjects: Vec::new(),
            collected,
            relevant_evidences: None,
            props: None,
        }
    }

    pub fn with_subjects(mut self, subjects: Vec<Subject>) -> Self {
        self.subjects = subjects;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PVPResult {
    #[serde(default)]
    pub observations_by_check: Vec<ObservationByCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
}

impl PVPResult {
    pub fn new(observations_by_check: Vec<ObservationByCheck>) -> Self {
        Self {
            observations_by_check,
            links: None,
        }
    }

    /// Read a unified-result JSON document
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, C2PError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| C2PError::load(path, e))?;
        serde_json::from_str(&content).map_err(|e| C2PError::load(path, e))
    }

    pub fn to_json_pretty(&self) -> Result<String, C2PError> {
        serde_json::to_string_pretty(self).map_err(|e| C2PError::serialize("PVP result", e))
    }
}
