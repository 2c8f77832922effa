//! OCM plugin
//!
//! Results come from Open Cluster Management `Policy` resources: root
//! policies on the hub and their per-cluster copies. Policy generation
//! produces a kustomize-ready PolicyGenerator deliverable.

pub mod policy_generator;

use c2p_framework::config::constants::observation::METHOD_AUTOMATED;
use c2p_framework::logging::{codes, LoggingService};
use c2p_framework::plugin::deliverable::{
    copy_template_dir, prepare_deliverable_dir, read_text, write_yaml,
};
use c2p_framework::plugin::{PluginError, PluginSpec};
use c2p_framework::policy::Policy;
use c2p_framework::pvp::{ObservationByCheck, PVPResult, RawResult, ResultEnum, Subject};
use c2p_framework::utils::{get_path, get_str, set_path, time};
use crate::raw_items;
use chrono::{DateTime, Utc};
use policy_generator::{PolicyConfig, PolicySetSettings, POLICY_API_VERSION};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const PLUGIN_NAME: &str = "ocm";
pub const CLUSTER_NAME_LABEL: &str = "policy.open-cluster-management.io/cluster-name";
const POLICY_GENERATOR_FILE: &str = "policy-generator.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcmConfig {
    pub policy_template_dir: PathBuf,
    pub deliverable_policy_dir: PathBuf,
    /// Hub namespace the policies are delivered to
    pub namespace: String,
    #[serde(default = "default_parameters_configmap_name")]
    pub parameters_configmap_name: String,
    pub cluster_selectors: BTreeMap<String, String>,
    #[serde(default = "default_policy_set_name")]
    pub policy_set_name: String,
    #[serde(default = "default_exclude_namespaces")]
    pub exclude_namespaces: Vec<String>,
    #[serde(default = "default_include_namespaces")]
    pub include_namespaces: Vec<String>,
}

fn default_parameters_configmap_name() -> String {
    "c2p-parameters".to_string()
}

fn default_policy_set_name() -> String {
    "test".to_string()
}

fn default_exclude_namespaces() -> Vec<String> {
    [
        "kube-system",
        "open-cluster-management",
        "open-cluster-management-agent",
        "open-cluster-management-agent-addon",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_include_namespaces() -> Vec<String> {
    vec!["*".to_string()]
}

impl OcmConfig {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(
        policy_template_dir: P,
        deliverable_policy_dir: Q,
        namespace: &str,
        cluster_selectors: BTreeMap<String, String>,
    ) -> Self {
        Self {
            policy_template_dir: policy_template_dir.into(),
            deliverable_policy_dir: deliverable_policy_dir.into(),
            namespace: namespace.to_string(),
            parameters_configmap_name: default_parameters_configmap_name(),
            cluster_selectors,
            policy_set_name: default_policy_set_name(),
            exclude_namespaces: default_exclude_namespaces(),
            include_namespaces: default_include_namespaces(),
        }
    }

    pub fn with_policy_set_name(mut self, name: &str) -> Self {
        self.policy_set_name = name.to_string();
        self
    }

    fn settings(&self) -> PolicySetSettings<'_> {
        PolicySetSettings {
            policy_set_name: &self.policy_set_name,
            namespace: &self.namespace,
            cluster_selectors: &self.cluster_selectors,
            exclude_namespaces: &self.exclude_namespaces,
            include_namespaces: &self.include_namespaces,
            parameters_configmap_name: &self.parameters_configmap_name,
        }
    }
}

/// Map `status.compliant`; anything unrecognised is an error
pub fn map_status(compliant: &str) -> ResultEnum {
    match compliant {
        "Compliant" => ResultEnum::Pass,
        "NonCompliant" => ResultEnum::Failure,
        _ => ResultEnum::Error,
    }
}

/// Latest status event of a per-cluster policy
struct LatestEvent<'a> {
    event_name: &'a str,
    last_timestamp: Option<&'a str>,
    message: &'a str,
}

fn is_ocm_policy(item: &Value) -> bool {
    get_str(item, &["apiVersion"]) == Some(POLICY_API_VERSION) && get_str(item, &["kind"]) == Some("Policy")
}

fn is_root_policy(item: &Value) -> bool {
    get_path(item, &["metadata", "labels", CLUSTER_NAME_LABEL]).is_none()
}

/// First history entry of the last detail that has any history
fn latest_event(details: &[Value]) -> Option<LatestEvent<'_>> {
    details
        .iter()
        .filter_map(|detail| detail.get("history").and_then(Value::as_array))
        .filter_map(|history| history.first())
        .last()
        .map(|entry| LatestEvent {
            event_name: get_str(entry, &["eventName"]).unwrap_or_default(),
            last_timestamp: get_str(entry, &["lastTimestamp"]),
            message: get_str(entry, &["message"]).unwrap_or_default(),
        })
}

pub struct OcmPlugin {
    config: Option<OcmConfig>,
    logger: LoggingService,
}

impl OcmPlugin {
    pub fn new(config: Option<OcmConfig>, logger: LoggingService) -> Self {
        Self { config, logger }
    }

    fn cluster_subject(&self, policy: &Value, now: DateTime<Utc>) -> Subject {
        let name = get_str(policy, &["metadata", "name"]).unwrap_or_default();
        let cluster = get_str(policy, &["metadata", "namespace"]).unwrap_or_default();
        let compliant = get_str(policy, &["status", "compliant"]).unwrap_or_default();

        let details = get_path(policy, &["status", "details"])
            .and_then(Value::as_array)
            .filter(|d| !d.is_empty());
        let event = match details {
            Some(details) => latest_event(details),
            None => {
                self.logger.log_warning_with_context(
                    codes::plugin::MISSING_DETAILS,
                    "Policy status has no details",
                    vec![("name", name), ("cluster", cluster)],
                );
                None
            }
        };

        let evaluated_on = match event.as_ref().and_then(|e| e.last_timestamp) {
            Some(timestamp) => time::parse_rfc3339(timestamp).unwrap_or_else(|| {
                self.logger.log_warning_with_context(
                    codes::plugin::INVALID_RAW_RESULT,
                    "Unparsable lastTimestamp, using the current time",
                    vec![("name", name), ("timestamp", timestamp)],
                );
                now
            }),
            None => now,
        };
        let reason = event
            .filter(|e| !e.event_name.is_empty() && !e.message.is_empty())
            .map(|e| format!("[{}] {}", e.event_name, e.message));

        Subject::new(&format!("Cluster \"{}\"", cluster), "cluster", cluster, map_status(compliant))
            .with_evaluated_on(evaluated_on)
            .with_reason(reason)
    }

    /// Copy one rule's template and return its patched policy entry
    fn generate_rule(&self, config: &OcmConfig, rule_id: &str) -> Result<PolicyConfig, PluginError> {
        let rule_dir = config.deliverable_policy_dir.join(rule_id);
        copy_template_dir(&config.policy_template_dir.join(rule_id), &rule_dir)?;

        let generator_path = rule_dir.join(POLICY_GENERATOR_FILE);
        let mut generator = read_generator(&generator_path)?;
        let defaults = [
            ("namespace", json!(config.namespace)),
            ("standards", json!([])),
            ("controls", json!([])),
            ("categories", json!([])),
            ("placement", json!({"clusterSelectors": config.cluster_selectors})),
        ];
        for (key, value) in defaults {
            set_path(&mut generator, &["policyDefaults", key], value);
        }
        write_yaml(&generator_path, &generator)?;

        let first_policy = get_path(&generator, &["policies"])
            .and_then(Value::as_array)
            .and_then(|p| p.first())
            .cloned()
            .ok_or_else(|| PluginError::invalid_template(&generator_path, "no entry under 'policies'"))?;
        let mut policy_config: PolicyConfig = serde_json::from_value(first_policy)
            .map_err(|e| PluginError::invalid_template(&generator_path, e))?;
        policy_config.rebase_manifests(rule_id);
        policy_config.dedup_classifications();
        Ok(policy_config)
    }
}

fn read_generator(path: &Path) -> Result<Value, PluginError> {
    let content = read_text(path)?;
    let generator: Value =
        serde_saphyr::from_str(&content).map_err(|e| PluginError::invalid_template(path, e))?;
    if !generator.is_object() {
        return Err(PluginError::invalid_template(path, "expected a mapping"));
    }
    Ok(generator)
}

impl PluginSpec for OcmPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn generate_pvp_result(&self, raw_result: &RawResult) -> Result<PVPResult, PluginError> {
        let now = time::now();
        let policies: Vec<&Value> = raw_items(&raw_result.data)?
            .iter()
            .filter(|item| is_ocm_policy(item))
            .collect();
        let (roots, per_cluster): (Vec<&Value>, Vec<&Value>) =
            policies.into_iter().partition(|p| is_root_policy(p));

        let mut observations = Vec::new();
        for root in roots {
            let (Some(name), Some(namespace)) = (
                get_str(root, &["metadata", "name"]),
                get_str(root, &["metadata", "namespace"]),
            ) else {
                self.logger.log_warning_with_code(
                    codes::plugin::ITEM_SKIPPED,
                    "Root policy without name or namespace",
                );
                continue;
            };

            let propagated = format!("{}.{}", namespace, name);
            let subjects = per_cluster
                .iter()
                .filter(|p| get_str(p, &["metadata", "name"]) == Some(propagated.as_str()))
                .map(|p| self.cluster_subject(p, now))
                .collect();
            observations.push(
                ObservationByCheck::new(name, vec![METHOD_AUTOMATED.to_string()], now).with_subjects(subjects),
            );
        }

        self.logger.log_success_with_context(
            codes::success::RESULT_GENERATED,
            "Generated PVP result from OCM policies",
            vec![("observations", observations.len().to_string().as_str())],
        );
        Ok(PVPResult::new(observations))
    }

    fn generate_pvp_policy(&self, policy: &Policy) -> Result<(), PluginError> {
        let config = self.config.as_ref().ok_or_else(|| PluginError::MissingConfig {
            plugin: PLUGIN_NAME.to_string(),
        })?;

        let deliverable = &config.deliverable_policy_dir;
        if !deliverable.exists() {
            self.logger.log_info(&format!(
                "Creating deliverable policy directory {}",
                deliverable.display()
            ));
        }
        prepare_deliverable_dir(deliverable)?;

        let mut policy_configs: Vec<(String, PolicyConfig)> = Vec::new();
        for rule_set in &policy.rule_sets {
            let policy_config = self.generate_rule(config, &rule_set.rule_id)?;
            if !policy_configs.iter().any(|(id, _)| *id == rule_set.rule_id) {
                policy_configs.push((rule_set.rule_id.clone(), policy_config));
            }
        }

        let settings = config.settings();
        let generator = policy_generator::policy_set_generator(&settings, &policy_configs)
            .map_err(|e| c2p_framework::C2PError::serialize(POLICY_GENERATOR_FILE, e))?;
        write_yaml(&deliverable.join(POLICY_GENERATOR_FILE), &generator)?;
        write_yaml(
            &deliverable.join("parameters.yaml"),
            &policy_generator::parameters_configmap(&settings, &policy.parameters),
        )?;
        write_yaml(
            &deliverable.join("kustomization.yaml"),
            &policy_generator::kustomization(&settings),
        )?;

        let path = deliverable.display().to_string();
        self.logger.log_success_with_context(
            codes::success::POLICY_GENERATED,
            "Generated OCM policy deliverable",
            vec![
                ("path", path.as_str()),
                ("policies", policy_configs.len().to_string().as_str()),
            ],
        );
        Ok(())
    }
}
