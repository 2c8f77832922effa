//! Types shared by every OSCAL document kind

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document metadata block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    pub last_modified: DateTime<Utc>,
    pub version: String,
    pub oscal_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl Metadata {
    pub fn new(title: &str, version: &str, oscal_version: &str, last_modified: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            published: None,
            last_modified,
            version: version.to_string(),
            oscal_version: oscal_version.to_string(),
            remarks: None,
        }
    }
}

/// Namespace-qualified name/value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Property {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl Property {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            uuid: None,
            ns: None,
            class: None,
            remarks: None,
        }
    }

    pub fn with_remarks(mut self, remarks: &str) -> Self {
        self.remarks = Some(remarks.to_string());
        self
    }

    /// Property with OSCAL-safe text: `/` in the name becomes `_` and
    /// new-lines in the value become spaces
    pub fn sanitized(name: &str, value: &str) -> Self {
        Self::new(&name.replace('/', "_"), &value.replace('\n', " "))
    }
}

/// Reference to a local or remote resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Link {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_fragment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Link {
    pub fn new(href: &str, text: Option<&str>) -> Self {
        Self {
            href: href.to_string(),
            rel: None,
            media_type: None,
            resource_fragment: None,
            text: text.map(str::to_string),
        }
    }
}

/// Value of the first property called `name`
pub fn find_prop_value<'a>(props: &'a [Property], name: &str) -> Option<&'a str> {
    props
        .iter()
        .find(|p| p.name == name)
        .map(|p| p.value.as_str())
}

/// Fresh random (v4) UUID as text
pub fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}
