//! Rule and parameter extraction from a component-definition
//!
//! Validation components (PVPs) carry rule rows; every other component carries
//! parameter rows. Rows missing their discriminant column are dropped, and
//! every drop is logged at warning level.

use super::grouping::{group_props_by_remarks, PropertyRow};
use super::types::{Parameter, Policy, RuleSet};
use crate::config::constants::columns;
use crate::config::ColumnAliases;
use crate::logging::{codes, LoggingService};
use crate::oscal::ComponentDefinition;

/// Builds `Policy` values from a component-definition
pub struct PolicyExtractor {
    columns: ColumnAliases,
    logger: LoggingService,
}

impl PolicyExtractor {
    pub fn new(columns: ColumnAliases, logger: LoggingService) -> Self {
        Self { columns, logger }
    }

    pub fn columns(&self) -> &ColumnAliases {
        &self.columns
    }

    /// Extract rule sets and parameters together
    pub fn extract_policy(&self, cdef: &ComponentDefinition, pvp_component_title: &str) -> Policy {
        let policy = Policy::new(
            self.extract_rule_sets(cdef, pvp_component_title),
            self.extract_parameters(cdef),
        );
        self.logger.log_success_with_context(
            codes::success::POLICY_EXTRACTED,
            "Policy extracted from component-definition",
            vec![
                ("pvp", pvp_component_title),
                ("rule_sets", policy.rule_sets.len().to_string().as_str()),
                ("parameters", policy.parameters.len().to_string().as_str()),
            ],
        );
        policy
    }

    /// Rule sets of the unique validation component titled `pvp_component_title`
    ///
    /// Zero or several matching components yield an empty list.
    pub fn extract_rule_sets(
        &self,
        cdef: &ComponentDefinition,
        pvp_component_title: &str,
    ) -> Vec<RuleSet> {
        let matches: Vec<_> = cdef
            .validation_components()
            .filter(|c| c.title == pvp_component_title)
            .collect();

        let component = match matches.as_slice() {
            [component] => *component,
            [] => {
                self.logger.log_warning_with_context(
                    codes::extraction::COMPONENT_NOT_FOUND,
                    "No validation component matches the PVP name; no rule sets extracted",
                    vec![("pvp", pvp_component_title)],
                );
                return Vec::new();
            }
            many => {
                self.logger.log_warning_with_context(
                    codes::extraction::AMBIGUOUS_COMPONENT,
                    "Several validation components match the PVP name; no rule sets extracted",
                    vec![
                        ("pvp", pvp_component_title),
                        ("matches", many.len().to_string().as_str()),
                    ],
                );
                return Vec::new();
            }
        };

        group_props_by_remarks(component)
            .into_iter()
            .filter(|row| self.has_rule_id(row, pvp_component_title))
            .filter_map(|row| self.to_rule_set(row))
            .collect()
    }

    fn has_rule_id(&self, row: &PropertyRow, pvp_component_title: &str) -> bool {
        if row.contains(columns::RULE_ID) {
            return true;
        }
        let row_columns = column_names(row);
        self.logger.log_warning_with_context(
            codes::extraction::ROW_DROPPED,
            "Validation component row has no Rule_Id",
            vec![("pvp", pvp_component_title), ("columns", row_columns.as_str())],
        );
        false
    }

    fn to_rule_set(&self, row: PropertyRow) -> Option<RuleSet> {
        let rule_id = non_empty(row.get(&self.columns.rule_id_column));
        let check_id = non_empty(row.get(&self.columns.check_id_column));

        match (rule_id, check_id) {
            (Some(rule_id), Some(check_id)) => Some(RuleSet {
                rule_id: rule_id.to_string(),
                rule_description: row
                    .get(&self.columns.rule_description_column)
                    .map(str::to_string),
                check_id: check_id.to_string(),
                check_description: row
                    .get(&self.columns.check_description_column)
                    .map(str::to_string),
                raw: row,
            }),
            _ => {
                self.logger.log_warning_with_context(
                    codes::extraction::ROW_DROPPED,
                    "Rule row has no value under the configured rule or check column",
                    vec![
                        ("rule_id_column", self.columns.rule_id_column.as_str()),
                        ("check_id_column", self.columns.check_id_column.as_str()),
                        ("row_rule_id", row.get(columns::RULE_ID).unwrap_or_default()),
                    ],
                );
                None
            }
        }
    }

    /// Parameters of all non-validation components, merged in component order
    ///
    /// A parameter id defined again by a later component takes the later
    /// value in the position of the first definition.
    pub fn extract_parameters(&self, cdef: &ComponentDefinition) -> Vec<Parameter> {
        let mut parameters: Vec<Parameter> = Vec::new();

        for component in cdef.target_components() {
            for row in group_props_by_remarks(component) {
                if !row.contains(columns::PARAMETER_ID) {
                    self.logger.log_debug_with_context(
                        codes::extraction::ROW_DROPPED,
                        "Component row has no Parameter_Id",
                        vec![
                            ("component", component.title.as_str()),
                            ("columns", column_names(&row).as_str()),
                        ],
                    );
                    continue;
                }
                let Some(parameter) = self.to_parameter(&row, &component.title) else {
                    continue;
                };

                match parameters.iter_mut().find(|p| p.id == parameter.id) {
                    Some(existing) => {
                        if existing.value != parameter.value {
                            self.logger.log_warning_with_context(
                                codes::extraction::PARAMETER_OVERRIDDEN,
                                "Parameter redefined by a later component; the later value wins",
                                vec![
                                    ("parameter_id", parameter.id.as_str()),
                                    ("previous", existing.value.as_str()),
                                    ("value", parameter.value.as_str()),
                                    ("component", component.title.as_str()),
                                ],
                            );
                        }
                        *existing = parameter;
                    }
                    None => parameters.push(parameter),
                }
            }
        }

        parameters
    }

    fn to_parameter(&self, row: &PropertyRow, component_title: &str) -> Option<Parameter> {
        let Some(id) = non_empty(row.get(columns::PARAMETER_ID)) else {
            self.logger.log_warning_with_context(
                codes::extraction::ROW_DROPPED,
                "Parameter row has an empty Parameter_Id",
                vec![("component", component_title)],
            );
            return None;
        };

        let value = match row.get(columns::PARAMETER_VALUE_ALTERNATIVES) {
            Some(value) => value.to_string(),
            None => {
                self.logger
                    .log_debug(&format!("Parameter '{}' has no value; using empty text", id));
                String::new()
            }
        };

        Some(Parameter {
            id: id.to_string(),
            description: row
                .get(columns::PARAMETER_DESCRIPTION)
                .map(str::to_string),
            value,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn column_names(row: &PropertyRow) -> String {
    row.iter().map(|(name, _)| name).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::oscal::{
        ComponentDefinition, ControlImplementation, DefinedComponent, ImplementedRequirement,
        Metadata, Property, Statement,
    };

    pub fn prop(name: &str, value: &str, remarks: &str) -> Property {
        Property::new(name, value).with_remarks(remarks)
    }

    pub fn component(component_type: &str, title: &str, props: Vec<Property>) -> DefinedComponent {
        DefinedComponent {
            uuid: crate::oscal::new_uuid(),
            component_type: component_type.to_string(),
            title: title.to_string(),
            description: String::new(),
            purpose: None,
            props,
            links: vec![],
            control_implementations: vec![],
        }
    }

    pub fn requirement(control_id: &str, rule_ids: &[&str], statements: &[&str]) -> ImplementedRequirement {
        ImplementedRequirement {
            uuid: crate::oscal::new_uuid(),
            control_id: control_id.to_string(),
            description: String::new(),
            props: rule_ids.iter().map(|r| Property::new("Rule_Id", r)).collect(),
            set_parameters: vec![],
            statements: statements
                .iter()
                .map(|s| Statement {
                    statement_id: s.to_string(),
                    uuid: crate::oscal::new_uuid(),
                    description: String::new(),
                    props: vec![],
                })
                .collect(),
        }
    }

    pub fn implementation(requirements: Vec<ImplementedRequirement>) -> ControlImplementation {
        ControlImplementation {
            uuid: crate::oscal::new_uuid(),
            source: "profile.json".to_string(),
            description: String::new(),
            props: vec![],
            set_parameters: vec![],
            implemented_requirements: requirements,
        }
    }

    pub fn cdef(components: Vec<DefinedComponent>) -> ComponentDefinition {
        ComponentDefinition {
            uuid: crate::oscal::new_uuid(),
            metadata: Metadata::new("cdef", "1.0", "1.1.2", crate::utils::time::now()),
            components,
        }
    }

    /// One PVP "OCM" with rule R1/C1 and one target with parameter P1=3
    pub fn scenario() -> ComponentDefinition {
        let mut target = component(
            "Service",
            "Kubernetes",
            vec![
                prop("Rule_Id", "R1", "r1"),
                prop("Parameter_Id", "P1", "p1"),
                prop("Parameter_Value_Alternatives", "3", "p1"),
            ],
        );
        target.control_implementations = vec![implementation(vec![requirement(
            "cm-6",
            &["R1"],
            &["cm-6_smt.a", "cm-6_smt.b"],
        )])];

        cdef(vec![
            component(
                "validation",
                "OCM",
                vec![prop("Rule_Id", "R1", "r1"), prop("Check_Id", "C1", "r1")],
            ),
            target,
        ])
    }
}
