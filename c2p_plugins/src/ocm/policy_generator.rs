//! PolicyGenerator documents written into the OCM deliverable

use c2p_framework::policy::Parameter;
use c2p_framework::utils::remove_nulls;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

pub const ANNOTATION_COMPONENT_TITLE: &str = "compliance-to-policy.component-title";
pub const POLICY_API_VERSION: &str = "policy.open-cluster-management.io/v1";

/// One manifest entry of a PolicyGenerator policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_compliance_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_interval: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prune_object_behavior: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patches: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_dependencies: Option<Value>,
    #[serde(default)]
    pub ignore_pending: bool,
    /// Generator options not modelled above, passed through unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A policy entry of a PolicyGenerator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    pub name: String,
    #[serde(default)]
    pub manifests: Vec<Manifest>,
    #[serde(default)]
    pub standards: Vec<String>,
    #[serde(default)]
    pub controls: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default = "default_true")]
    pub consolidate_manifests: bool,
    #[serde(default)]
    pub order_manifests: bool,
    #[serde(default)]
    pub inform_gatekeeper_policies: bool,
    #[serde(default)]
    pub inform_kyverno_policies: bool,
    #[serde(default = "default_remediation_action")]
    pub remediation_action: String,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default = "default_compliance_type")]
    pub compliance_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

fn default_remediation_action() -> String {
    "inform".to_string()
}

fn default_severity() -> String {
    "high".to_string()
}

fn default_compliance_type() -> String {
    "mustnothave".to_string()
}

fn dedup(values: &mut Vec<String>) {
    let mut seen: Vec<String> = Vec::with_capacity(values.len());
    values.retain(|v| {
        if seen.contains(v) {
            false
        } else {
            seen.push(v.clone());
            true
        }
    });
}

impl PolicyConfig {
    /// Point manifest paths at the rule's subdirectory of the deliverable
    pub fn rebase_manifests(&mut self, rule_id: &str) {
        for manifest in &mut self.manifests {
            if let Some(path) = &manifest.path {
                let relative = path.strip_prefix("./").unwrap_or(path);
                manifest.path = Some(format!("./{}/{}", rule_id, relative));
            }
        }
    }

    /// Drop repeated standards, controls and categories
    pub fn dedup_classifications(&mut self) {
        dedup(&mut self.standards);
        dedup(&mut self.controls);
        dedup(&mut self.categories);
    }
}

/// Settings shared by every generated top-level document
pub struct PolicySetSettings<'a> {
    pub policy_set_name: &'a str,
    pub namespace: &'a str,
    pub cluster_selectors: &'a BTreeMap<String, String>,
    pub exclude_namespaces: &'a [String],
    pub include_namespaces: &'a [String],
    pub parameters_configmap_name: &'a str,
}

/// DNS-compatible form of a policy set name
pub fn sanitize_policy_set_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Top-level PolicyGenerator bundling every rule's policy into one set
///
/// `policies` pairs each rule id with its policy; the set lists rule ids.
pub fn policy_set_generator(
    settings: &PolicySetSettings<'_>,
    policies: &[(String, PolicyConfig)],
) -> Result<Value, serde_json::Error> {
    let rule_ids: Vec<&str> = policies.iter().map(|(rule_id, _)| rule_id.as_str()).collect();
    let policies = policies
        .iter()
        .map(|(_, p)| serde_json::to_value(p).map(remove_nulls))
        .collect::<Result<Vec<Value>, _>>()?;

    Ok(json!({
        "apiVersion": POLICY_API_VERSION,
        "kind": "PolicyGenerator",
        "metadata": {"name": "policy-set"},
        "placementBindingDefaults": {"name": "policy-set"},
        "policyDefaults": {
            "placement": {"labelSelector": settings.cluster_selectors},
            "consolidateManifests": false,
            "orderManifests": false,
            "informGatekeeperPolicies": false,
            "informKyvernoPolicies": false,
            "namespaceSelector": {
                "exclude": settings.exclude_namespaces,
                "include": settings.include_namespaces,
            },
            "namespace": settings.namespace,
        },
        "policySetDefaults": {"placement": {"labelSelector": settings.cluster_selectors}},
        "policies": policies,
        "policySets": [{
            "name": sanitize_policy_set_name(settings.policy_set_name),
            "policies": rule_ids,
        }],
    }))
}

/// ConfigMap carrying every parameter value
pub fn parameters_configmap(settings: &PolicySetSettings<'_>, parameters: &[Parameter]) -> Value {
    let data: Map<String, Value> = parameters
        .iter()
        .map(|p| (p.id.clone(), Value::String(p.value.clone())))
        .collect();
    json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": settings.parameters_configmap_name,
            "namespace": settings.namespace,
        },
        "data": data,
    })
}

/// Kustomization wiring the generator, the parameters and the title annotation
pub fn kustomization(settings: &PolicySetSettings<'_>) -> Value {
    let patch = json!([{
        "op": "replace",
        "path": format!("/metadata/annotations/{}", ANNOTATION_COMPONENT_TITLE),
        "value": settings.policy_set_name,
    }]);
    json!({
        "generators": ["./policy-generator.yaml"],
        "patches": [{
            "target": {
                "kind": "PolicySet",
                "name": sanitize_policy_set_name(settings.policy_set_name),
            },
            "patch": patch.to_string(),
        }],
        "resources": ["./parameters.yaml"],
    })
}
