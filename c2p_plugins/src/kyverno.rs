//! Kyverno plugin
//!
//! Reads `PolicyReport`/`ClusterPolicyReport` resources and renders one
//! deliverable directory per rule from a template directory.

use c2p_framework::config::constants::observation::METHOD_AUTOMATED;
use c2p_framework::logging::{codes, LoggingService};
use c2p_framework::plugin::deliverable::{
    copy_template_dir, parse_yaml_documents, prepare_deliverable_dir, read_text, split_yaml_documents,
    top_level_scalar, write_text,
};
use c2p_framework::plugin::{PluginError, PluginSpec};
use c2p_framework::policy::Policy;
use c2p_framework::pvp::{ObservationByCheck, PVPResult, RawResult, ResultEnum, Subject};
use c2p_framework::utils::{get_str, template, time};
use crate::raw_items;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const PLUGIN_NAME: &str = "kyverno";

const POLICY_REPORT_API_VERSION: &str = "wgpolicyk8s.io/v1alpha2";
const POLICY_REPORT_KINDS: [&str; 2] = ["PolicyReport", "ClusterPolicyReport"];
const KYVERNO_API_VERSION: &str = "kyverno.io/v1";
const KYVERNO_POLICY_KINDS: [&str; 2] = ["ClusterPolicy", "Policy"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KyvernoConfig {
    pub policy_template_dir: PathBuf,
    pub deliverable_policy_dir: PathBuf,
}

impl KyvernoConfig {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(policy_template_dir: P, deliverable_policy_dir: Q) -> Self {
        Self {
            policy_template_dir: policy_template_dir.into(),
            deliverable_policy_dir: deliverable_policy_dir.into(),
        }
    }
}

/// Map a policy report result; unknown values are errors
pub fn map_status(status: &str) -> ResultEnum {
    match status {
        "pass" => ResultEnum::Pass,
        "fail" | "warn" => ResultEnum::Failure,
        "skip" | "error" => ResultEnum::Error,
        _ => ResultEnum::Error,
    }
}

fn is_policy_report(item: &Value) -> bool {
    get_str(item, &["apiVersion"]) == Some(POLICY_REPORT_API_VERSION)
        && get_str(item, &["kind"]).is_some_and(|kind| POLICY_REPORT_KINDS.contains(&kind))
}

fn is_kyverno_policy(api_version: Option<&str>, kind: Option<&str>) -> bool {
    api_version == Some(KYVERNO_API_VERSION) && kind.is_some_and(|kind| KYVERNO_POLICY_KINDS.contains(&kind))
}

/// Whether a YAML stream holds a Kyverno policy object
///
/// Policies often carry unquoted `{{ ... }}` variables that are not valid
/// YAML, so a stream that does not parse is judged on the top-level
/// `apiVersion` and `kind` lines of each document.
pub fn is_kyverno_policy_file(content: &str) -> bool {
    match parse_yaml_documents(content) {
        Ok(documents) => documents
            .iter()
            .any(|doc| is_kyverno_policy(get_str(doc, &["apiVersion"]), get_str(doc, &["kind"]))),
        Err(_) => split_yaml_documents(content).iter().any(|doc| {
            is_kyverno_policy(
                top_level_scalar(doc, "apiVersion").as_deref(),
                top_level_scalar(doc, "kind").as_deref(),
            )
        }),
    }
}

fn resource_subject(resource: &Value, result: &Value, evaluated_on: chrono::DateTime<chrono::Utc>) -> Subject {
    let field = |name: &str| get_str(resource, &[name]).unwrap_or_default();
    let namespace = get_str(resource, &["namespace"]).unwrap_or("(ClusterScope)");
    let title = format!(
        "{}/{} {} {}",
        field("apiVersion"),
        field("kind"),
        field("name"),
        namespace
    );
    let status = get_str(result, &["result"]).unwrap_or_default();

    Subject::new(&title, "resource", field("uid"), map_status(status))
        .with_evaluated_on(evaluated_on)
        .with_reason(get_str(result, &["message"]).map(str::to_string))
}

pub struct KyvernoPlugin {
    config: Option<KyvernoConfig>,
    logger: LoggingService,
}

impl KyvernoPlugin {
    pub fn new(config: Option<KyvernoConfig>, logger: LoggingService) -> Self {
        Self { config, logger }
    }

    fn render_rule_dir(&self, copied: &[PathBuf], values: &std::collections::HashMap<String, String>) -> Result<(), PluginError> {
        for path in copied {
            let content = read_text(path)?;
            if is_kyverno_policy_file(&content) {
                self.logger
                    .log_debug(&format!("Skipping Kyverno policy file {}", path.display()));
                continue;
            }

            let rendered = template::render(&content, values);
            self.report_unresolved(path, &rendered.unresolved);
            write_text(path, &rendered.text)?;
        }
        Ok(())
    }

    fn report_unresolved(&self, path: &Path, keys: &[String]) {
        let file = path.display().to_string();
        for key in keys {
            self.logger.log_warning_with_context(
                codes::plugin::UNRESOLVED_PLACEHOLDER,
                "Placeholder has no parameter value and was rendered empty",
                vec![("file", file.as_str()), ("key", key.as_str())],
            );
        }
    }
}

impl PluginSpec for KyvernoPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn generate_pvp_result(&self, raw_result: &RawResult) -> Result<PVPResult, PluginError> {
        let collected = time::now();
        let results = raw_items(&raw_result.data)?
            .iter()
            .filter(|item| is_policy_report(item))
            .filter_map(|report| report.get("results").and_then(Value::as_array))
            .flatten();

        let mut observations: Vec<ObservationByCheck> = Vec::new();
        for result in results {
            let Some(policy_name) = get_str(result, &["policy"]) else {
                self.logger.log_warning_with_code(
                    codes::plugin::ITEM_SKIPPED,
                    "Policy report result without a policy name",
                );
                continue;
            };

            let evaluated_on = result
                .get("timestamp")
                .and_then(|t| t.get("seconds"))
                .and_then(Value::as_f64)
                .and_then(time::from_epoch_seconds)
                .unwrap_or(collected);
            let subjects = result
                .get("resources")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .map(|resource| resource_subject(resource, result, evaluated_on));

            match observations.iter_mut().find(|o| o.check_id == policy_name) {
                Some(observation) => observation.subjects.extend(subjects),
                None => observations.push(
                    ObservationByCheck::new(policy_name, vec![METHOD_AUTOMATED.to_string()], collected)
                        .with_subjects(subjects.collect()),
                ),
            }
        }

        self.logger.log_success_with_context(
            codes::success::RESULT_GENERATED,
            "Generated PVP result from policy reports",
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

        let values = policy.parameter_values();
        for rule_set in &policy.rule_sets {
            let copied = copy_template_dir(
                &config.policy_template_dir.join(&rule_set.rule_id),
                &deliverable.join(&rule_set.rule_id),
            )?;
            self.render_rule_dir(&copied, &values)?;
        }

        let path = deliverable.display().to_string();
        self.logger.log_success_with_context(
            codes::success::POLICY_GENERATED,
            "Generated Kyverno deliverable",
            vec![
                ("path", path.as_str()),
                ("rules", policy.rule_sets.len().to_string().as_str()),
            ],
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use c2p_framework::logging::create_test_logger;
    use c2p_framework::policy::{Parameter, PropertyRow, RuleSet};
    use serde_json::json;

    fn report(kind: &str, results: Value) -> Value {
        json!({"apiVersion": "wgpolicyk8s.io/v1alpha2", "kind": kind, "results": results})
    }

    fn reports() -> Value {
        json!([
            report("PolicyReport", json!([
                {
                    "policy": "disallow-capabilities",
                    "result": "pass",
                    "message": "validation rule passed",
                    "timestamp": {"seconds": 1_700_000_000, "nanos": 0},
                    "resources": [{"apiVersion": "v1", "kind": "Pod", "name": "web", "namespace": "prod", "uid": "u1"}]
                },
                {
                    "policy": "require-labels",
                    "result": "fail",
                    "message": "label app is required",
                    "resources": [{"apiVersion": "apps/v1", "kind": "Deployment", "name": "api", "namespace": "prod", "uid": "u2"}]
                }
            ])),
            report("ClusterPolicyReport", json!([
                {
                    "policy": "disallow-capabilities",
                    "result": "skip",
                    "resources": [{"apiVersion": "v1", "kind": "Namespace", "name": "prod", "uid": "u3"}]
                }
            ])),
            {"apiVersion": "v1", "kind": "ConfigMap", "results": [{"policy": "ignored", "result": "pass"}]}
        ])
    }

    fn rule(rule_id: &str) -> RuleSet {
        RuleSet {
            rule_id: rule_id.to_string(),
            rule_description: None,
            check_id: rule_id.to_string(),
            check_description: None,
            raw: PropertyRow::new(),
        }
    }

    #[test]
    fn test_status_mapping_is_total() {
        assert_eq!(map_status("pass"), ResultEnum::Pass);
        assert_eq!(map_status("fail"), ResultEnum::Failure);
        assert_eq!(map_status("warn"), ResultEnum::Failure);
        assert_eq!(map_status("skip"), ResultEnum::Error);
        assert_eq!(map_status("error"), ResultEnum::Error);
        for unknown in ["", "Pass", "passed", "audit"] {
            assert_eq!(map_status(unknown), ResultEnum::Error);
        }
    }

    #[test]
    fn test_generate_pvp_result() {
        let (logger, _) = create_test_logger();
        let plugin = KyvernoPlugin::new(None, logger);
        let result = plugin.generate_pvp_result(&RawResult::new(reports())).unwrap();

        let ids: Vec<&str> = result
            .observations_by_check
            .iter()
            .map(|o| o.check_id.as_str())
            .collect();
        assert_eq!(ids, vec!["disallow-capabilities", "require-labels"]);

        let first = &result.observations_by_check[0];
        assert_eq!(first.subjects.len(), 2);
        assert_eq!(first.subjects[0].title, "v1/Pod web prod");
        assert_eq!(first.subjects[0].resource_id, "u1");
        assert_eq!(first.subjects[0].subject_type, "resource");
        assert_eq!(first.subjects[0].reason.as_deref(), Some("validation rule passed"));
        assert_eq!(
            first.subjects[0].evaluated_on,
            time::from_epoch_seconds(1_700_000_000.0)
        );
        assert_eq!(first.subjects[1].title, "v1/Namespace prod (ClusterScope)");
        assert_eq!(first.subjects[1].result, ResultEnum::Error);
        assert_eq!(first.subjects[1].evaluated_on, Some(first.collected));

        let second = &result.observations_by_check[1];
        assert_eq!(second.subjects[0].result, ResultEnum::Failure);
    }

    #[test]
    fn test_list_with_items_is_accepted() {
        let (logger, _) = create_test_logger();
        let plugin = KyvernoPlugin::new(None, logger);
        let data = json!({"apiVersion": "v1", "kind": "List", "items": reports()});
        let result = plugin.generate_pvp_result(&RawResult::new(data)).unwrap();
        assert_eq!(result.observations_by_check.len(), 2);

        assert_matches!(
            plugin.generate_pvp_result(&RawResult::new(json!("text"))),
            Err(PluginError::InvalidRawResult { .. })
        );
    }

    #[test]
    fn test_is_kyverno_policy_file() {
        let policy = "apiVersion: kyverno.io/v1\nkind: ClusterPolicy\nmetadata:\n  name: x\n";
        let other = "---\napiVersion: v1\nkind: ConfigMap\n---\nkind: Policy\napiVersion: policy.open-cluster-management.io/v1\n";
        assert!(is_kyverno_policy_file(policy));
        assert!(is_kyverno_policy_file(&format!("{}---\n{}", other, policy)));
        assert!(!is_kyverno_policy_file(other));
        assert!(!is_kyverno_policy_file("key: {{ value }}\n"));
    }

    #[test]
    fn test_policy_with_unquoted_variable_is_kept_verbatim() {
        let content = "apiVersion: kyverno.io/v1\nkind: ClusterPolicy\nmetadata:\n  name: add-owner\nspec:\n  rules:\n    - mutate:\n        patchStrategicMerge:\n          metadata:\n            labels:\n              owner: {{ request.userInfo.username }}\n";
        assert!(is_kyverno_policy_file(content));

        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        std::fs::create_dir_all(templates.join("add-owner")).unwrap();
        std::fs::write(templates.join("add-owner/policy.yaml"), content).unwrap();

        let deliverable = dir.path().join("deliverable");
        let (logger, memory) = create_test_logger();
        let plugin = KyvernoPlugin::new(Some(KyvernoConfig::new(&templates, &deliverable)), logger);
        plugin
            .generate_pvp_policy(&Policy::new(vec![rule("add-owner")], vec![]))
            .unwrap();

        let written = std::fs::read_to_string(deliverable.join("add-owner/policy.yaml")).unwrap();
        assert_eq!(written, content);
        assert!(!memory.has_warning_with_code(codes::plugin::UNRESOLVED_PLACEHOLDER));
    }

    #[test]
    fn test_generate_pvp_policy() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        let rule_dir = templates.join("require-labels");
        std::fs::create_dir_all(&rule_dir).unwrap();
        std::fs::write(
            rule_dir.join("policy.yaml"),
            "apiVersion: kyverno.io/v1\nkind: ClusterPolicy\nspec:\n  label: \"{{ request.object.metadata.name }}\"\n",
        )
        .unwrap();
        std::fs::write(
            rule_dir.join("config.yaml"),
            "apiVersion: v1\nkind: ConfigMap\ndata:\n  label: {{ required_label }}\n  other: '{{ missing }}'\n",
        )
        .unwrap();

        let deliverable = dir.path().join("deliverable");
        let (logger, memory) = create_test_logger();
        let plugin = KyvernoPlugin::new(Some(KyvernoConfig::new(&templates, &deliverable)), logger);
        let policy = Policy::new(
            vec![rule("require-labels")],
            vec![Parameter::new("required_label", "app")],
        );
        plugin.generate_pvp_policy(&policy).unwrap();

        let out = deliverable.join("require-labels");
        let config = std::fs::read_to_string(out.join("config.yaml")).unwrap();
        assert!(config.contains("label: app\n"));
        assert!(config.contains("other: ''"));
        let policy_file = std::fs::read_to_string(out.join("policy.yaml")).unwrap();
        assert!(policy_file.contains("{{ request.object.metadata.name }}"));
        assert!(memory.has_warning_with_code(codes::plugin::UNRESOLVED_PLACEHOLDER));
    }

    #[test]
    fn test_policy_errors() {
        let dir = tempfile::tempdir().unwrap();
        let (logger, _) = create_test_logger();

        let file = dir.path().join("file");
        std::fs::write(&file, "x").unwrap();
        let plugin = KyvernoPlugin::new(Some(KyvernoConfig::new(dir.path(), &file)), logger.clone());
        assert_matches!(
            plugin.generate_pvp_policy(&Policy::new(vec![rule("r")], vec![])),
            Err(PluginError::NotADirectory { .. })
        );

        let plugin = KyvernoPlugin::new(
            Some(KyvernoConfig::new(dir.path().join("none"), dir.path().join("out"))),
            logger.clone(),
        );
        assert_matches!(
            plugin.generate_pvp_policy(&Policy::new(vec![rule("r")], vec![])),
            Err(PluginError::TemplateNotFound { .. })
        );

        let plugin = KyvernoPlugin::new(None, logger);
        assert_matches!(
            plugin.generate_pvp_policy(&Policy::default()),
            Err(PluginError::MissingConfig { .. })
        );
    }
}
