//! Reading and writing OSCAL documents
//!
//! Documents are read as JSON, or as YAML when the file extension is
//! `.yaml`/`.yml`. Output is always pretty-printed JSON.

use super::assessment_results::{AssessmentResults, AssessmentResultsRoot};
use super::catalog::{Catalog, CatalogRoot};
use super::component::{ComponentDefinition, ComponentDefinitionRoot};
use super::profile::{Profile, ProfileRoot};
use crate::error::C2PError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Parse a JSON or YAML document from text
pub fn parse_document<T: DeserializeOwned>(content: &str, yaml: bool) -> Result<T, String> {
    if yaml {
        serde_saphyr::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }
}

/// Read and decode a document, choosing the format by extension
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, C2PError> {
    let content = std::fs::read_to_string(path).map_err(|e| C2PError::load(path, e))?;
    parse_document(&content, is_yaml(path)).map_err(|reason| C2PError::load(path, reason))
}

pub fn load_component_definition<P: AsRef<Path>>(path: P) -> Result<ComponentDefinition, C2PError> {
    load_document::<ComponentDefinitionRoot>(path.as_ref()).map(|r| r.component_definition)
}

pub fn load_assessment_results<P: AsRef<Path>>(path: P) -> Result<AssessmentResults, C2PError> {
    load_document::<AssessmentResultsRoot>(path.as_ref()).map(|r| r.assessment_results)
}

pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog, C2PError> {
    load_document::<CatalogRoot>(path.as_ref()).map(|r| r.catalog)
}

pub fn load_profile<P: AsRef<Path>>(path: P) -> Result<Profile, C2PError> {
    load_document::<ProfileRoot>(path.as_ref()).map(|r| r.profile)
}

/// Pretty JSON text of assessment results under their root key
pub fn assessment_results_to_json(ar: &AssessmentResults) -> Result<String, C2PError> {
    to_pretty_json(&AssessmentResultsRoot {
        assessment_results: ar.clone(),
    })
}

/// Pretty JSON text of any serializable value
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, C2PError> {
    serde_json::to_string_pretty(value).map_err(|e| C2PError::serialize("document", e))
}

/// Write pretty JSON to `path`, replacing any existing file
pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<(), C2PError> {
    let path = path.as_ref();
    let json = to_pretty_json(value)?;
    std::fs::write(path, json).map_err(|e| C2PError::io(path, e))
}
