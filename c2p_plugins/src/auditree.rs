//! Auditree plugin
//!
//! Results come from an Auditree `check_results.json`; policy generation
//! writes parameter values into an `auditree.json` template.

use c2p_framework::config::constants::observation::METHOD_AUTOMATED;
use c2p_framework::logging::{codes, LoggingService};
use c2p_framework::plugin::deliverable::{read_text, write_text};
use c2p_framework::plugin::{PluginError, PluginSpec};
use c2p_framework::policy::{Parameter, Policy};
use c2p_framework::pvp::{Link, ObservationByCheck, PVPResult, RawResult, ResultEnum, Subject};
use c2p_framework::utils::time;
use c2p_framework::utils::{get_path, set_path};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

pub const PLUGIN_NAME: &str = "auditree";
pub const DEFAULT_LOCKER_URL: &str = "files:///tmp/compliance";
pub const DEFAULT_CHECK_PATTERN: &str = "(.*)_([0-9]+)_(.+)$";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditreeConfig {
    pub auditree_json_template: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Matches the method part of a check id produced by parametrized
    /// expansion; group 1 is the base method name
    #[serde(default = "default_check_pattern")]
    pub parametrized_check_pattern: String,
}

fn default_output() -> PathBuf {
    PathBuf::from("auditree.json")
}

fn default_check_pattern() -> String {
    DEFAULT_CHECK_PATTERN.to_string()
}

impl AuditreeConfig {
    pub fn new<P: Into<PathBuf>>(auditree_json_template: P) -> Self {
        Self {
            auditree_json_template: auditree_json_template.into(),
            output: default_output(),
            parametrized_check_pattern: default_check_pattern(),
        }
    }

    pub fn with_output<P: Into<PathBuf>>(mut self, output: P) -> Self {
        self.output = output.into();
        self
    }
}

/// Map an Auditree check status; unknown statuses are errors
pub fn map_status(status: &str) -> ResultEnum {
    match status {
        "pass" => ResultEnum::Pass,
        "fail" | "warn" => ResultEnum::Failure,
        "error" => ResultEnum::Error,
        _ => ResultEnum::Error,
    }
}

pub struct AuditreePlugin {
    config: Option<AuditreeConfig>,
    check_pattern: Regex,
    logger: LoggingService,
}

impl AuditreePlugin {
    pub fn new(config: Option<AuditreeConfig>, logger: LoggingService) -> Result<Self, PluginError> {
        let pattern = config
            .as_ref()
            .map(|c| c.parametrized_check_pattern.as_str())
            .unwrap_or(DEFAULT_CHECK_PATTERN);
        let check_pattern = Regex::new(pattern).map_err(|e| {
            c2p_framework::C2PError::config(&format!(
                "invalid parametrized_check_pattern '{}': {}",
                pattern, e
            ))
        })?;
        Ok(Self {
            config,
            check_pattern,
            logger,
        })
    }

    fn check_observation(
        &self,
        check_id: String,
        check_result: &Value,
        evidences: &[Link],
    ) -> ObservationByCheck {
        let collected = check_result
            .get("timestamp")
            .and_then(Value::as_f64)
            .and_then(time::from_epoch_seconds)
            .unwrap_or_else(time::now);

        let (result, reason) = match check_result.get("status").and_then(Value::as_str) {
            Some(status) => (map_status(status), diagnostics(check_result, status)),
            None => {
                self.logger.log_warning_with_context(
                    codes::plugin::INVALID_RAW_RESULT,
                    "Check has no status",
                    vec![("check_id", check_id.as_str())],
                );
                (
                    ResultEnum::Error,
                    format!("Status not found for this check {}.", check_id),
                )
            }
        };

        let subject = Subject::new(
            &format!("Auditree Check: {}", check_id),
            "inventory-item",
            &check_id,
            result,
        )
        .with_evaluated_on(collected)
        .with_reason(Some(reason));

        let mut observation =
            ObservationByCheck::new(&check_id, vec![METHOD_AUTOMATED.to_string()], collected)
                .with_subjects(vec![subject]);
        if !evidences.is_empty() {
            observation.relevant_evidences = Some(evidences.to_vec());
        }
        observation
    }

    /// Check id with any parametrized-expansion suffix removed
    pub fn normalize_check_id(&self, check_id: &str) -> String {
        let (class, method) = match check_id.rsplit_once('.') {
            Some((class, method)) => (Some(class), method),
            None => (None, check_id),
        };
        let Some(base) = self
            .check_pattern
            .captures(method)
            .and_then(|caps| caps.get(1))
        else {
            return check_id.to_string();
        };
        match class {
            Some(class) => format!("{}.{}", class, base.as_str()),
            None => base.as_str().to_string(),
        }
    }

    /// Fold observations that share a normalized check id into one
    ///
    /// Groups keep the order in which their first member appeared. A merged
    /// observation takes `collected` from its first member and the union of
    /// subjects and evidences.
    pub fn merge_parametrized_checks(&self, observations: Vec<ObservationByCheck>) -> Vec<ObservationByCheck> {
        let mut groups: Vec<(String, Vec<ObservationByCheck>)> = Vec::new();
        for observation in observations {
            let normalized = self.normalize_check_id(&observation.check_id);
            match groups.iter_mut().find(|(id, _)| *id == normalized) {
                Some((_, members)) => members.push(observation),
                None => groups.push((normalized, vec![observation])),
            }
        }

        groups
            .into_iter()
            .filter_map(|(normalized, members)| {
                let mut members = members.into_iter();
                let first = members.next()?;
                if first.check_id == normalized && members.len() == 0 {
                    return Some(first);
                }

                let mut merged = ObservationByCheck::new(&normalized, first.methods.clone(), first.collected);
                let mut evidences: Vec<Link> = Vec::new();
                for member in std::iter::once(first).chain(members) {
                    merged.subjects.extend(member.subjects);
                    for link in member.relevant_evidences.into_iter().flatten() {
                        if !evidences.iter().any(|e| e.href == link.href) {
                            evidences.push(link);
                        }
                    }
                }
                if !evidences.is_empty() {
                    merged.relevant_evidences = Some(evidences);
                }
                Some(merged)
            })
            .collect()
    }
}

/// JSON text of the diagnostics relevant to `status`
fn diagnostics(check_result: &Value, status: &str) -> String {
    let section = |name: &str| {
        check_result
            .get(name)
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    };

    let selected = match status {
        "pass" => section("successes"),
        "warn" => section("warnings"),
        "fail" => section("failures"),
        "error" => section("exception"),
        _ => {
            let mut union = Map::new();
            for name in ["successes", "warnings", "failures"] {
                if let Value::Object(map) = section(name) {
                    union.extend(map);
                }
            }
            match check_result.get("exception") {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) if s.is_empty() => {}
                Some(exception) => {
                    union.insert("exception".to_string(), exception.clone());
                }
            }
            Value::Object(union)
        }
    };
    selected.to_string()
}

/// Parse `parameter` into the JSON type of the value it replaces
pub fn coerce_parameter(existing: &Value, parameter: &Parameter) -> Result<Value, PluginError> {
    let invalid = |reason: String| PluginError::InvalidParameterValue {
        parameter_id: parameter.id.clone(),
        reason,
    };

    match existing {
        Value::Array(_) => Ok(Value::Array(
            parameter
                .value
                .split(',')
                .map(|item| Value::String(item.to_string()))
                .collect(),
        )),
        Value::String(_) => Ok(Value::String(parameter.value.clone())),
        Value::Number(n) if n.is_f64() => {
            let parsed: f64 = parameter
                .value
                .trim()
                .parse()
                .map_err(|e: std::num::ParseFloatError| invalid(e.to_string()))?;
            serde_json::Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| invalid(format!("'{}' is not a finite number", parameter.value)))
        }
        Value::Number(_) => parameter
            .value
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| invalid(e.to_string())),
        _ => Err(PluginError::UnsupportedParameterValue {
            parameter_id: parameter.id.clone(),
        }),
    }
}

impl PluginSpec for AuditreePlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn generate_pvp_result(&self, raw_result: &RawResult) -> Result<PVPResult, PluginError> {
        let locker_url = raw_result
            .additional_str("locker_url")
            .unwrap_or(DEFAULT_LOCKER_URL);
        let classes = raw_result
            .data
            .as_object()
            .ok_or_else(|| PluginError::invalid_raw_result("check results must be an object"))?;

        let mut observations = Vec::new();
        for (class_name, class_result) in classes {
            let Some(checks) = class_result.get("checks").and_then(Value::as_object) else {
                continue;
            };
            let evidences: Vec<Link> = class_result
                .get("evidence")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .map(|evidence| {
                    let path = evidence.get("path").and_then(Value::as_str).unwrap_or_default();
                    let description = evidence
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    Link::new(description, &format!("{}/{}", locker_url, path))
                })
                .collect();

            for (method_name, check_result) in checks {
                let check_id = format!("{}.{}", class_name, method_name);
                observations.push(self.check_observation(check_id, check_result, &evidences));
            }
        }

        let observations = self.merge_parametrized_checks(observations);
        self.logger.log_success_with_context(
            codes::success::RESULT_GENERATED,
            "Generated PVP result from Auditree check results",
            vec![("observations", observations.len().to_string().as_str())],
        );
        Ok(PVPResult::new(observations))
    }

    fn generate_pvp_policy(&self, policy: &Policy) -> Result<(), PluginError> {
        let config = self.config.as_ref().ok_or_else(|| PluginError::MissingConfig {
            plugin: PLUGIN_NAME.to_string(),
        })?;

        let template_path = &config.auditree_json_template;
        let mut document: Value = serde_json::from_str(&read_text(template_path)?)
            .map_err(|e| PluginError::invalid_template(template_path, e))?;

        for parameter in &policy.parameters {
            let segments: Vec<&str> = parameter.id.split('.').collect();
            let Some(existing) = get_path(&document, &segments) else {
                self.logger.log_debug(&format!(
                    "Parameter '{}' has no counterpart in the template",
                    parameter.id
                ));
                continue;
            };
            let updated = coerce_parameter(existing, parameter)?;
            set_path(&mut document, &segments, updated);
        }

        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| c2p_framework::C2PError::serialize("auditree.json", e))?;
        write_text(&config.output, &json)?;

        let output = config.output.display().to_string();
        self.logger.log_success_with_context(
            codes::success::POLICY_GENERATED,
            "Wrote auditree.json",
            vec![("path", output.as_str())],
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use c2p_framework::logging::create_test_logger;
    use serde_json::json;

    fn plugin(config: Option<AuditreeConfig>) -> AuditreePlugin {
        let (logger, _) = create_test_logger();
        AuditreePlugin::new(config, logger).unwrap()
    }

    fn check_results() -> Value {
        json!({
            "chk_pkg.kube.checks.test_cluster.ClusterCheck": {
                "checks": {
                    "test_rbac_0_admin": {
                        "timestamp": 1_700_000_000.0,
                        "status": "pass",
                        "successes": {"admin": ["ok"]}
                    },
                    "test_rbac_1_viewer": {
                        "timestamp": 1_700_000_100.0,
                        "status": "fail",
                        "failures": {"viewer": ["too broad"]}
                    },
                    "test_version": {
                        "timestamp": 1_700_000_200.0,
                        "status": "warn",
                        "warnings": {"version": ["old"]}
                    }
                },
                "evidence": [
                    {"path": "raw/kube/cluster.json", "description": "Cluster resources"}
                ]
            }
        })
    }

    #[test]
    fn test_status_mapping_is_total() {
        assert_eq!(map_status("pass"), ResultEnum::Pass);
        assert_eq!(map_status("fail"), ResultEnum::Failure);
        assert_eq!(map_status("warn"), ResultEnum::Failure);
        assert_eq!(map_status("error"), ResultEnum::Error);
        for unknown in ["", "PASS", "passed", "skipped", "not_found"] {
            assert_eq!(map_status(unknown), ResultEnum::Error);
        }
    }

    #[test]
    fn test_generate_pvp_result() {
        let raw = RawResult::new(check_results())
            .with_additional_prop("locker_url", json!("https://github.com/org/evidence"));
        let result = plugin(None).generate_pvp_result(&raw).unwrap();

        let ids: Vec<&str> = result
            .observations_by_check
            .iter()
            .map(|o| o.check_id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "chk_pkg.kube.checks.test_cluster.ClusterCheck.test_rbac",
                "chk_pkg.kube.checks.test_cluster.ClusterCheck.test_version",
            ]
        );

        let version = &result.observations_by_check[1];
        let subject = &version.subjects[0];
        assert_eq!(subject.title, format!("Auditree Check: {}", version.check_id));
        assert_eq!(subject.subject_type, "inventory-item");
        assert_eq!(subject.result, ResultEnum::Failure);
        assert_eq!(subject.reason.as_deref(), Some(r#"{"version":["old"]}"#));
        assert_eq!(
            version.relevant_evidences.as_ref().unwrap()[0].href,
            "https://github.com/org/evidence/raw/kube/cluster.json"
        );
    }

    #[test]
    fn test_parametrized_checks_are_merged() {
        let raw = RawResult::new(check_results());
        let result = plugin(None).generate_pvp_result(&raw).unwrap();

        let merged = &result.observations_by_check[0];
        let resource_ids: Vec<&str> = merged.subjects.iter().map(|s| s.resource_id.as_str()).collect();
        assert_eq!(
            resource_ids,
            vec![
                "chk_pkg.kube.checks.test_cluster.ClusterCheck.test_rbac_0_admin",
                "chk_pkg.kube.checks.test_cluster.ClusterCheck.test_rbac_1_viewer",
            ]
        );
        assert_eq!(merged.collected, time::from_epoch_seconds(1_700_000_000.0).unwrap());
        assert_eq!(merged.subjects[1].result, ResultEnum::Failure);
        let evidences = merged.relevant_evidences.as_ref().unwrap();
        assert_eq!(evidences.len(), 1);
        assert_eq!(evidences[0].href, "files:///tmp/compliance/raw/kube/cluster.json");
    }

    #[test]
    fn test_normalize_check_id() {
        let plugin = plugin(None);
        assert_eq!(plugin.normalize_check_id("check.method_0_foo"), "check.method");
        assert_eq!(plugin.normalize_check_id("check.method_12_bar_baz"), "check.method");
        assert_eq!(plugin.normalize_check_id("check.method"), "check.method");
        assert_eq!(plugin.normalize_check_id("a.b.method_x_foo"), "a.b.method_x_foo");
    }

    #[test]
    fn test_missing_and_unknown_status() {
        let raw = RawResult::new(json!({
            "C": {"checks": {
                "test_a": {"timestamp": 1_700_000_000.0},
                "test_b": {"timestamp": 1_700_000_000.0, "status": "unknown",
                           "successes": {"x": 1}, "exception": "boom"}
            }}
        }));
        let result = plugin(None).generate_pvp_result(&raw).unwrap();

        let missing = &result.observations_by_check[0].subjects[0];
        assert_eq!(missing.result, ResultEnum::Error);
        assert_eq!(missing.reason.as_deref(), Some("Status not found for this check C.test_a."));

        let unknown = &result.observations_by_check[1].subjects[0];
        assert_eq!(unknown.result, ResultEnum::Error);
        assert_eq!(unknown.reason.as_deref(), Some(r#"{"x":1,"exception":"boom"}"#));
    }

    #[test]
    fn test_invalid_raw_result() {
        let raw = RawResult::new(json!(["not", "an", "object"]));
        assert_matches!(
            plugin(None).generate_pvp_result(&raw),
            Err(PluginError::InvalidRawResult { .. })
        );
    }

    #[test]
    fn test_coerce_parameter() {
        let p = |value: &str| Parameter::new("a.b", value);
        assert_eq!(coerce_parameter(&json!(["x"]), &p("a,b")).unwrap(), json!(["a", "b"]));
        assert_eq!(coerce_parameter(&json!("x"), &p("y")).unwrap(), json!("y"));
        assert_eq!(coerce_parameter(&json!(1), &p("42")).unwrap(), json!(42));
        assert_eq!(coerce_parameter(&json!(1.5), &p("2.5")).unwrap(), json!(2.5));
        assert_matches!(
            coerce_parameter(&json!(1), &p("many")),
            Err(PluginError::InvalidParameterValue { parameter_id, .. }) if parameter_id == "a.b"
        );
        assert_matches!(
            coerce_parameter(&json!({"k": 1}), &p("1")),
            Err(PluginError::UnsupportedParameterValue { .. })
        );
        assert_matches!(
            coerce_parameter(&json!(true), &p("false")),
            Err(PluginError::UnsupportedParameterValue { .. })
        );
    }

    #[test]
    fn test_generate_pvp_policy() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("auditree.template.json");
        std::fs::write(
            &template,
            r#"{"locker": {"repo_url": "x"}, "org": {"kube": {"min_replicas": 1, "namespaces": ["a"]}}}"#,
        )
        .unwrap();
        let output = dir.path().join("auditree.json");
        let plugin = plugin(Some(AuditreeConfig::new(&template).with_output(&output)));

        let policy = Policy::new(
            vec![],
            vec![
                Parameter::new("org.kube.min_replicas", "3"),
                Parameter::new("org.kube.namespaces", "default,prod"),
                Parameter::new("not.in.template", "ignored"),
            ],
        );
        plugin.generate_pvp_policy(&policy).unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["org"]["kube"]["min_replicas"], 3);
        assert_eq!(written["org"]["kube"]["namespaces"], json!(["default", "prod"]));
        assert_eq!(written["locker"]["repo_url"], "x");
        assert!(written.get("not").is_none());
    }

    #[test]
    fn test_policy_requires_config() {
        let result = plugin(None).generate_pvp_policy(&Policy::default());
        assert_matches!(result, Err(PluginError::MissingConfig { .. }));
    }
}
