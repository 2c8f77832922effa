//! Conversion configuration
//!
//! A `C2PConfig` names the compliance source (an OSCAL component-definition,
//! optionally with its catalog and profile), the PVP whose rules are extracted,
//! and the metadata stamped onto generated assessment results. Plugin settings
//! live under `[plugins.<name>]` and are decoded by each plugin.

use crate::config::constants::columns;
use crate::error::C2PError;
use crate::pvp::PVPResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceType {
    #[default]
    Oscal,
}

/// Column names used to read rule rows from a component-definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAliases {
    #[serde(default = "default_rule_id_column")]
    pub rule_id_column: String,
    #[serde(default = "default_rule_description_column")]
    pub rule_description_column: String,
    #[serde(default = "default_check_id_column")]
    pub check_id_column: String,
    #[serde(default = "default_check_description_column")]
    pub check_description_column: String,
}

fn default_rule_id_column() -> String {
    columns::RULE_ID.to_string()
}

fn default_rule_description_column() -> String {
    columns::RULE_DESCRIPTION.to_string()
}

fn default_check_id_column() -> String {
    columns::CHECK_ID.to_string()
}

fn default_check_description_column() -> String {
    columns::CHECK_DESCRIPTION.to_string()
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            rule_id_column: default_rule_id_column(),
            rule_description_column: default_rule_description_column(),
            check_id_column: default_check_id_column(),
            check_description_column: default_check_description_column(),
        }
    }
}

impl ColumnAliases {
    pub fn with_rule_id_column(mut self, column: &str) -> Self {
        self.rule_id_column = column.to_string();
        self
    }

    pub fn with_check_id_column(mut self, column: &str) -> Self {
        self.check_id_column = column.to_string();
        self
    }

    pub fn with_rule_description_column(mut self, column: &str) -> Self {
        self.rule_description_column = column.to_string();
        self
    }

    pub fn with_check_description_column(mut self, column: &str) -> Self {
        self.check_description_column = column.to_string();
        self
    }
}

/// OSCAL compliance source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceOscal {
    #[serde(rename = "type", default)]
    pub compliance_type: ComplianceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<PathBuf>,
    pub component_definition: PathBuf,
    #[serde(flatten)]
    pub columns: ColumnAliases,
}

impl ComplianceOscal {
    pub fn new<P: Into<PathBuf>>(component_definition: P) -> Self {
        Self {
            compliance_type: ComplianceType::Oscal,
            catalog: None,
            profile: None,
            component_definition: component_definition.into(),
            columns: ColumnAliases::default(),
        }
    }

    pub fn with_catalog<P: Into<PathBuf>>(mut self, catalog: P) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    pub fn with_profile<P: Into<PathBuf>>(mut self, profile: P) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_columns(mut self, columns: ColumnAliases) -> Self {
        self.columns = columns;
        self
    }
}

/// Top-level configuration of one conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct C2PConfig {
    pub compliance: ComplianceOscal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pvp_result: Option<PVPResult>,
    #[serde(default)]
    pub pvp_name: String,
    #[serde(default)]
    pub result_title: String,
    #[serde(default)]
    pub result_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugins: BTreeMap<String, serde_json::Value>,
}

impl C2PConfig {
    pub fn new(compliance: ComplianceOscal, pvp_name: &str) -> Self {
        Self {
            compliance,
            pvp_result: None,
            pvp_name: pvp_name.to_string(),
            result_title: String::new(),
            result_description: String::new(),
            result_labels: None,
            plugins: BTreeMap::new(),
        }
    }

    pub fn with_result_title(mut self, title: &str) -> Self {
        self.result_title = title.to_string();
        self
    }

    pub fn with_result_description(mut self, description: &str) -> Self {
        self.result_description = description.to_string();
        self
    }

    pub fn with_result_labels(mut self, labels: Vec<String>) -> Self {
        self.result_labels = Some(labels);
        self
    }

    pub fn with_pvp_result(mut self, pvp_result: PVPResult) -> Self {
        self.pvp_result = Some(pvp_result);
        self
    }

    pub fn with_plugin_config(mut self, plugin: &str, config: serde_json::Value) -> Self {
        self.plugins.insert(plugin.to_string(), config);
        self
    }

    /// Load from a TOML file, or JSON when the extension is `.json`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, C2PError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| C2PError::load(path, e))?;

        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| C2PError::load(path, e))?
            }
            _ => toml::from_str(&content).map_err(|e| C2PError::load(path, e))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), C2PError> {
        if self.compliance.component_definition.as_os_str().is_empty() {
            return Err(C2PError::config(
                "compliance.component_definition must not be empty",
            ));
        }

        let columns = &self.compliance.columns;
        for (name, value) in [
            ("rule_id_column", &columns.rule_id_column),
            ("rule_description_column", &columns.rule_description_column),
            ("check_id_column", &columns.check_id_column),
            ("check_description_column", &columns.check_description_column),
        ] {
            if value.trim().is_empty() {
                return Err(C2PError::config(&format!("{} must not be empty", name)));
            }
        }

        Ok(())
    }

    /// Decode the settings table of one plugin, if present
    pub fn plugin_config<T: DeserializeOwned>(&self, plugin: &str) -> Result<Option<T>, C2PError> {
        match self.plugins.get(plugin) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| C2PError::parse(&format!("plugins.{}", plugin), e)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_column_defaults() {
        let columns = ColumnAliases::default();
        assert_eq!(columns.rule_id_column, "Rule_Id");
        assert_eq!(columns.rule_description_column, "Rule_Description");
        assert_eq!(columns.check_id_column, "Check_Id");
        assert_eq!(columns.check_description_column, "Check_Description");
    }

    #[test]
    fn test_load_toml_with_column_override_and_plugin_table() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
pvp_name = "Kyverno"
result_title = "Kyverno Assessment Results"
result_description = "OSCAL Assessment Results from Kyverno"
result_labels = ["nightly"]

[compliance]
type = "oscal"
component_definition = "data/component-definition.json"
rule_id_column = "My_Rule_Id"

[plugins.kyverno]
policy_template_dir = "templates"
deliverable_policy_dir = "out"
"#
        )
        .unwrap();

        let config = C2PConfig::load(file.path()).unwrap();
        assert_eq!(config.pvp_name, "Kyverno");
        assert_eq!(config.compliance.compliance_type, ComplianceType::Oscal);
        assert_eq!(config.compliance.columns.rule_id_column, "My_Rule_Id");
        assert_eq!(config.compliance.columns.check_id_column, "Check_Id");
        assert_eq!(config.result_labels, Some(vec!["nightly".to_string()]));

        #[derive(Deserialize)]
        struct Dirs {
            policy_template_dir: String,
        }
        let dirs: Dirs = config.plugin_config("kyverno").unwrap().unwrap();
        assert_eq!(dirs.policy_template_dir, "templates");
        assert!(config.plugin_config::<Dirs>("ocm").unwrap().is_none());
    }

    #[test]
    fn test_unknown_compliance_type_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[compliance]\ntype = \"csv\"\ncomponent_definition = \"cdef.json\"\n"
        )
        .unwrap();

        assert_matches!(C2PConfig::load(file.path()), Err(C2PError::Load { .. }));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        assert_matches!(
            C2PConfig::load("/nonexistent/c2p.toml"),
            Err(C2PError::Load { .. })
        );
    }

    #[test]
    fn test_empty_column_alias_is_config_error() {
        let mut config = C2PConfig::new(ComplianceOscal::new("cdef.json"), "OCM");
        config.compliance.columns.check_id_column = " ".to_string();
        assert_matches!(config.validate(), Err(C2PError::Config { .. }));
    }
}
