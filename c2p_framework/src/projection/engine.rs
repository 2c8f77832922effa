//! Projection of unified results onto OSCAL assessment results

use crate::config::constants::{oscal, props};
use crate::config::C2PConfig;
use crate::error::C2PError;
use crate::logging::{codes, LoggingService};
use crate::oscal::{
    load_catalog, load_component_definition, load_profile, new_uuid, AssessmentResult,
    AssessmentResults, Catalog, ComponentDefinition, ControlSelection, ImportAp, Link, Metadata,
    Observation, Profile, Property, RelevantEvidence, ReviewedControls, SelectControlById,
    SubjectReference,
};
use crate::policy::{Parameter, Policy, PolicyExtractor, RuleSet};
use crate::pvp::{apply_defaults, ObservationByCheck, PVPResult, Subject};
use crate::utils::time;

/// Version stamped into generated document metadata
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One conversion run over a loaded component-definition
pub struct C2P {
    config: C2PConfig,
    component_definition: ComponentDefinition,
    catalog: Option<Catalog>,
    profile: Option<Profile>,
    extractor: PolicyExtractor,
    logger: LoggingService,
}

impl C2P {
    /// Load the documents named by `config`
    ///
    /// Catalog and profile are loaded only when configured. Any load failure
    /// aborts construction.
    pub fn new(config: C2PConfig, logger: LoggingService) -> Result<Self, C2PError> {
        let compliance = &config.compliance;
        let catalog = compliance.catalog.as_ref().map(load_catalog).transpose()?;
        let profile = compliance.profile.as_ref().map(load_profile).transpose()?;
        let component_definition = load_component_definition(&compliance.component_definition)?;

        let cdef_path = compliance.component_definition.display().to_string();
        logger.log_success_with_context(
            codes::success::DOCUMENT_LOADED,
            "Loaded component-definition",
            vec![("path", cdef_path.as_str())],
        );

        let mut c2p = Self::from_component_definition(config, component_definition, logger);
        c2p.catalog = catalog;
        c2p.profile = profile;
        Ok(c2p)
    }

    /// Build from an already loaded component-definition
    pub fn from_component_definition(
        config: C2PConfig,
        component_definition: ComponentDefinition,
        logger: LoggingService,
    ) -> Self {
        let extractor = PolicyExtractor::new(config.compliance.columns.clone(), logger.clone());
        Self {
            config,
            component_definition,
            catalog: None,
            profile: None,
            extractor,
            logger,
        }
    }

    pub fn config(&self) -> &C2PConfig {
        &self.config
    }

    pub fn component_definition(&self) -> &ComponentDefinition {
        &self.component_definition
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Rules of the configured PVP plus all target parameters
    pub fn get_policy(&self) -> Policy {
        self.extractor
            .extract_policy(&self.component_definition, &self.config.pvp_name)
    }

    pub fn get_rule_sets(&self) -> Vec<RuleSet> {
        self.extractor
            .extract_rule_sets(&self.component_definition, &self.config.pvp_name)
    }

    pub fn get_parameters(&self) -> Vec<Parameter> {
        self.extractor.extract_parameters(&self.component_definition)
    }

    pub fn set_pvp_result(&mut self, pvp_result: PVPResult) {
        self.config.pvp_result = Some(pvp_result);
    }

    /// Project the current unified result into assessment results
    pub fn result_to_oscal(&self) -> Result<AssessmentResults, C2PError> {
        let pvp_result = self
            .config
            .pvp_result
            .as_ref()
            .ok_or_else(|| C2PError::config("no PVP result has been set"))?;
        Ok(project(
            &self.component_definition,
            &self.extractor,
            &self.config,
            pvp_result,
            &self.logger,
        ))
    }
}

impl std::fmt::Debug for C2P {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("C2P")
            .field("pvp_name", &self.config.pvp_name)
            .field("component_definition", &self.component_definition.uuid)
            .field("catalog", &self.catalog.is_some())
            .field("profile", &self.profile.is_some())
            .field("pvp_result", &self.config.pvp_result.is_some())
            .finish_non_exhaustive()
    }
}

/// Build assessment results from a unified result
///
/// Observations whose check id matches no rule set of the configured PVP are
/// left out and reported as warnings.
pub fn project(
    component_definition: &ComponentDefinition,
    extractor: &PolicyExtractor,
    config: &C2PConfig,
    pvp_result: &PVPResult,
    logger: &LoggingService,
) -> AssessmentResults {
    let pvp_result = apply_defaults(pvp_result.clone());
    let rule_sets = extractor.extract_rule_sets(component_definition, &config.pvp_name);

    let mut observations = Vec::new();
    for observation in &pvp_result.observations_by_check {
        match rule_sets.iter().find(|r| r.check_id == observation.check_id) {
            Some(rule_set) => observations.push(to_oscal_observation(observation, rule_set)),
            None => logger.log_warning_with_context(
                codes::projection::OBSERVATION_DROPPED,
                "Observation has no matching rule and is left out",
                vec![
                    ("check_id", observation.check_id.as_str()),
                    ("pvp", config.pvp_name.as_str()),
                ],
            ),
        }
    }

    if observations.is_empty() && !pvp_result.observations_by_check.is_empty() {
        logger.log_warning_with_code(
            codes::projection::EMPTY_RESULT,
            "No observation matched a rule; the result has no observations",
        );
    }

    let now = time::now();
    let mut result = AssessmentResult {
        uuid: new_uuid(),
        title: config.result_title.clone(),
        description: config.result_description.clone(),
        start: now,
        end: None,
        props: vec![],
        links: vec![],
        reviewed_controls: reviewed_controls(component_definition),
        observations,
    };
    if let Some(links) = &pvp_result.links {
        result.links = links
            .iter()
            .map(|l| Link::new(&l.href, Some(&l.description)))
            .collect();
    }
    if let Some(labels) = &config.result_labels {
        result.props = labels
            .iter()
            .map(|label| Property::new(props::LABEL, label))
            .collect();
    }

    logger.log_success_with_context(
        codes::success::ASSESSMENT_PROJECTED,
        "Projected PVP result onto assessment results",
        vec![("observations", result.observations.len().to_string().as_str())],
    );

    AssessmentResults {
        uuid: new_uuid(),
        metadata: Metadata::new(
            &config.result_title,
            GENERATOR_VERSION,
            oscal::OSCAL_VERSION,
            now,
        ),
        import_ap: ImportAp {
            href: oscal::IMPORT_AP_PLACEHOLDER_HREF.to_string(),
            remarks: None,
        },
        results: vec![result],
    }
}

/// Controls implemented by the target components
///
/// One control selection per control-implementation, one entry per
/// implemented requirement.
pub fn reviewed_controls(component_definition: &ComponentDefinition) -> ReviewedControls {
    let control_selections = component_definition
        .target_components()
        .flat_map(|component| component.control_implementations.iter())
        .map(|implementation| ControlSelection {
            description: None,
            include_controls: implementation
                .implemented_requirements
                .iter()
                .map(|requirement| SelectControlById {
                    control_id: requirement.control_id.clone(),
                    statement_ids: requirement
                        .statements
                        .iter()
                        .map(|s| s.statement_id.clone())
                        .collect(),
                })
                .collect(),
        })
        .collect();

    ReviewedControls {
        description: None,
        control_selections,
    }
}

fn to_oscal_observation(observation: &ObservationByCheck, rule_set: &RuleSet) -> Observation {
    let title = observation
        .title
        .clone()
        .unwrap_or_else(|| observation.check_id.clone());
    let description = observation.description.clone().unwrap_or_else(|| title.clone());

    let mut observation_props = vec![Property::sanitized(props::ASSESSMENT_RULE_ID, &rule_set.rule_id)];
    if let Some(extra) = &observation.props {
        observation_props.extend(extra.iter().map(|p| Property::new(&p.name, &p.value)));
    }

    let relevant_evidence = observation
        .relevant_evidences
        .iter()
        .flatten()
        .map(|link| RelevantEvidence {
            href: Some(link.href.clone()),
            description: link.description.clone(),
            props: vec![],
            links: vec![],
            remarks: None,
        })
        .collect();

    Observation {
        uuid: new_uuid(),
        title: Some(title),
        description,
        props: observation_props,
        links: vec![],
        methods: observation.methods.clone(),
        types: vec![],
        subjects: observation.subjects.iter().map(to_subject_reference).collect(),
        relevant_evidence,
        collected: observation.collected,
    }
}

fn to_subject_reference(subject: &Subject) -> SubjectReference {
    let mut subject_props = Vec::new();
    if !subject.resource_id.trim().is_empty() {
        subject_props.push(Property::sanitized(props::RESOURCE_ID, &subject.resource_id));
    }
    subject_props.push(Property::sanitized(props::RESULT, subject.result.as_str()));
    if let Some(evaluated_on) = &subject.evaluated_on {
        subject_props.push(Property::sanitized(props::EVALUATED_ON, &time::to_iso(evaluated_on)));
    }
    if let Some(reason) = &subject.reason {
        subject_props.push(Property::sanitized(props::REASON, reason));
    }

    SubjectReference {
        subject_uuid: new_uuid(),
        subject_type: subject.subject_type.clone(),
        title: Some(subject.title.clone()),
        props: subject_props,
    }
}
