//! # Markdown compliance report
//!
//! Joins assessment-results observations back to the component-definition
//! they were produced from and renders one section per target component:
//! component, then control, then rule, then evaluated subjects.

use crate::config::ColumnAliases;
use crate::oscal::{find_prop_value, AssessmentResults, Catalog, ComponentDefinition, Observation};
use crate::config::constants::props;
use crate::policy::{group_props_by_remarks, PropertyRow};
use std::fmt::Write;

struct SubjectResult {
    uuid: String,
    title: String,
    result: String,
    reason: String,
}

struct RuleResult {
    id: String,
    description: String,
    subjects: Vec<SubjectResult>,
}

struct ControlResult {
    id: String,
    title: String,
    rule_results: Vec<RuleResult>,
}

struct RenderedComponent {
    title: String,
    control_results: Vec<ControlResult>,
}

/// Glyph for a subject's `result` property
pub fn result_icon(result: &str) -> &'static str {
    match result {
        "pass" => ":white_check_mark:",
        "failure" => ":x:",
        _ => ":warning:",
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    columns: ColumnAliases,
    catalog: Option<Catalog>,
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column names used to read rule ids and check descriptions
    pub fn with_columns(mut self, columns: ColumnAliases) -> Self {
        self.columns = columns;
        self
    }

    /// Catalog used to print control titles next to control ids
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn render(&self, assessment_results: &AssessmentResults, component_definition: &ComponentDefinition) -> String {
        let components = self.collect(assessment_results, component_definition);
        let mut out = String::new();
        for component in &components {
            write_component(&mut out, component);
        }
        out
    }

    fn collect(
        &self,
        assessment_results: &AssessmentResults,
        component_definition: &ComponentDefinition,
    ) -> Vec<RenderedComponent> {
        let rule_rows: Vec<(&str, Vec<PropertyRow>)> = component_definition
            .validation_components()
            .map(|c| (c.title.as_str(), group_props_by_remarks(c)))
            .collect();
        let observations = assessment_results.first_observations();

        component_definition
            .target_components()
            .map(|component| RenderedComponent {
                title: component.title.clone(),
                control_results: component
                    .control_implementations
                    .iter()
                    .flat_map(|ci| ci.implemented_requirements.iter())
                    .map(|requirement| ControlResult {
                        id: requirement.control_id.clone(),
                        title: self.control_title(&requirement.control_id),
                        rule_results: requirement
                            .props
                            .iter()
                            .filter(|p| p.name == self.columns.rule_id_column)
                            .filter_map(|p| self.rule_result(&p.value, &rule_rows, observations))
                            .collect(),
                    })
                    .collect(),
            })
            .collect()
    }

    fn control_title(&self, control_id: &str) -> String {
        self.catalog
            .as_ref()
            .and_then(|c| c.find_control(control_id))
            .map(|c| c.title.clone())
            .unwrap_or_default()
    }

    /// `None` when no PVP defines the rule
    fn rule_result(
        &self,
        rule_id: &str,
        rule_rows: &[(&str, Vec<PropertyRow>)],
        observations: &[Observation],
    ) -> Option<RuleResult> {
        let (pvp, row) = rule_rows.iter().find_map(|(pvp, rows)| {
            rows.iter()
                .find(|row| row.get(&self.columns.rule_id_column) == Some(rule_id))
                .map(|row| (*pvp, row))
        })?;

        let subjects = observations
            .iter()
            .find(|o| find_prop_value(&o.props, props::ASSESSMENT_RULE_ID) == Some(rule_id))
            .map(|o| {
                o.subjects
                    .iter()
                    .map(|subject| {
                        let result = find_prop_value(&subject.props, props::RESULT).unwrap_or_default();
                        SubjectResult {
                            uuid: subject.subject_uuid.clone(),
                            title: subject.title.clone().unwrap_or_default(),
                            result: format!("{} {}", result, result_icon(result)),
                            reason: find_prop_value(&subject.props, props::REASON)
                                .unwrap_or_default()
                                .to_string(),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(RuleResult {
            id: format!("{} ({})", rule_id, pvp),
            description: row
                .get(&self.columns.check_description_column)
                .unwrap_or_default()
                .to_string(),
            subjects,
        })
    }
}

/// Render with default column names and no catalog
pub fn render(assessment_results: &AssessmentResults, component_definition: &ComponentDefinition) -> String {
    ReportRenderer::new().render(assessment_results, component_definition)
}

// fmt::Write into a String is infallible

fn write_component(out: &mut String, component: &RenderedComponent) {
    let _ = writeln!(out, "## Component: {}\n", component.title);
    for control in &component.control_results {
        let _ = writeln!(out, "#### Result of control {}: {}\n", control.id, control.title);
        for rule in &control.rule_results {
            write_rule(out, rule);
        }
        let _ = writeln!(out, "---\n");
    }
}

fn write_rule(out: &mut String, rule: &RuleResult) {
    if rule.subjects.is_empty() {
        let _ = writeln!(out, "Rule ID: {}\n  - No subjects found\n", rule.id);
        return;
    }

    let _ = writeln!(out, "Rule `{}`:\n- {}\n", rule.id, rule.description);
    let _ = writeln!(out, "<details><summary>Details</summary>\n");
    for subject in &rule.subjects {
        let _ = writeln!(out, "  - Subject UUID: {}", subject.uuid);
        let _ = writeln!(out, "    - Title: {}", subject.title);
        let _ = writeln!(out, "    - Result: {}", subject.result);
        let _ = writeln!(out, "    - Reason:");
        let _ = writeln!(out, "      ```");
        for line in subject.reason.lines() {
            let _ = writeln!(out, "      {}", line);
        }
        let _ = writeln!(out, "      ```\n");
    }
    let _ = writeln!(out, "</details>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{C2PConfig, ComplianceOscal};
    use crate::logging::create_test_logger;
    use crate::oscal::{Control, Metadata};
    use crate::policy::fixtures::{component, prop, requirement, implementation, scenario};
    use crate::projection::C2P;
    use crate::pvp::{ObservationByCheck, PVPResult, ResultEnum, Subject};
    use crate::utils::time;

    fn project(cdef: ComponentDefinition, subjects: Vec<Subject>) -> AssessmentResults {
        let (logger, _) = create_test_logger();
        let mut c2p = C2P::from_component_definition(
            C2PConfig::new(ComplianceOscal::new("cdef.json"), "OCM"),
            cdef,
            logger,
        );
        c2p.set_pvp_result(PVPResult::new(vec![ObservationByCheck::new(
            "C1",
            vec!["AUTOMATED".to_string()],
            time::now(),
        )
        .with_subjects(subjects)]));
        c2p.result_to_oscal().unwrap()
    }

    #[test]
    fn test_icons() {
        assert_eq!(result_icon("pass"), ":white_check_mark:");
        assert_eq!(result_icon("failure"), ":x:");
        assert_eq!(result_icon("error"), ":warning:");
        assert_eq!(result_icon(""), ":warning:");
    }

    #[test]
    fn test_render_scenario() {
        let mut cdef = scenario();
        cdef.components[0]
            .props
            .push(prop("Check_Description", "Cluster is configured", "r1"));
        let ar = project(
            cdef.clone(),
            vec![
                Subject::new("cluster-a", "cluster", "cluster-a", ResultEnum::Pass),
                Subject::new("cluster-b", "cluster", "cluster-b", ResultEnum::Failure)
                    .with_reason(Some("[violation] missing label".to_string())),
            ],
        );

        let report = render(&ar, &cdef);
        assert!(report.contains("## Component: Kubernetes"));
        assert!(report.contains("#### Result of control cm-6: "));
        assert!(report.contains("Rule `R1 (OCM)`:\n- Cluster is configured"));
        assert!(report.contains("    - Result: pass :white_check_mark:"));
        assert!(report.contains("    - Result: failure :x:"));
        assert!(report.contains("      [violation] missing label"));
    }

    #[test]
    fn test_rule_without_observation() {
        let mut cdef = scenario();
        cdef.components[0].props.push(prop("Rule_Id", "R2", "r2"));
        cdef.components[0].props.push(prop("Check_Id", "C2", "r2"));
        cdef.components[1].control_implementations[0]
            .implemented_requirements
            .push(requirement("ac-1", &["R2", "UNKNOWN"], &[]));

        let ar = project(cdef.clone(), vec![]);
        let report = render(&ar, &cdef);
        assert!(report.contains("Rule ID: R1 (OCM)\n  - No subjects found"));
        assert!(report.contains("Rule ID: R2 (OCM)\n  - No subjects found"));
        assert!(!report.contains("UNKNOWN"));
    }

    #[test]
    fn test_catalog_titles_and_custom_columns() {
        let mut target = component("Service", "Cluster", vec![]);
        let mut req = requirement("cm-6", &[], &[]);
        req.props.push(prop("My_Rule", "R1", ""));
        target.control_implementations = vec![implementation(vec![req])];
        let cdef = crate::policy::fixtures::cdef(vec![
            component(
                "validation",
                "OCM",
                vec![prop("My_Rule", "R1", "r1"), prop("Check_Id", "C1", "r1")],
            ),
            target,
        ]);

        let catalog = Catalog {
            uuid: "cat".to_string(),
            metadata: Metadata::new("catalog", "1", "1.1.2", time::now()),
            groups: vec![],
            controls: vec![Control {
                id: "cm-6".to_string(),
                class: None,
                title: "Configuration Settings".to_string(),
                params: vec![],
                props: vec![],
                links: vec![],
                parts: vec![],
                controls: vec![],
            }],
        };
        let ar = project(scenario(), vec![]);

        let report = ReportRenderer::new()
            .with_columns(ColumnAliases::default().with_rule_id_column("My_Rule"))
            .with_catalog(catalog)
            .render(&ar, &cdef);
        assert!(report.contains("#### Result of control cm-6: Configuration Settings"));
        assert!(report.contains("Rule ID: R1 (OCM)"));
    }
}
