//! Combine assessment results produced from several PVPs

use super::engine::GENERATOR_VERSION;
use crate::config::constants::oscal;
use crate::logging::{codes, LoggingService};
use crate::oscal::{
    new_uuid, AssessmentResult, AssessmentResults, ControlSelection, ImportAp, Metadata,
    ReviewedControls, SelectControlById,
};
use crate::utils::time;

/// Merge `inputs` into one document with a single result titled `title`
///
/// Included controls are merged by control id in first-seen order, their
/// statement ids concatenated. Observations and result props are kept in
/// input order. The OSCAL version comes from the first input.
pub fn merge_assessment_results(
    title: &str,
    inputs: &[AssessmentResults],
    logger: &LoggingService,
) -> AssessmentResults {
    let mut include_controls: Vec<SelectControlById> = Vec::new();
    let mut observations = Vec::new();
    let mut result_props = Vec::new();
    let mut links = Vec::new();

    for result in inputs.iter().flat_map(|ar| ar.results.iter()) {
        let selections = result
            .reviewed_controls
            .control_selections
            .iter()
            .flat_map(|s| s.include_controls.iter());
        for control in selections {
            match include_controls
                .iter_mut()
                .find(|c| c.control_id == control.control_id)
            {
                Some(existing) => existing
                    .statement_ids
                    .extend(control.statement_ids.iter().cloned()),
                None => include_controls.push(control.clone()),
            }
        }

        observations.extend(result.observations.iter().cloned());
        for prop in &result.props {
            if !result_props.contains(prop) {
                result_props.push(prop.clone());
            }
        }
        links.extend(result.links.iter().cloned());
    }

    let oscal_version = inputs
        .first()
        .map(|ar| ar.metadata.oscal_version.as_str())
        .unwrap_or(oscal::OSCAL_VERSION);
    let now = time::now();

    logger.log_success_with_context(
        codes::success::RESULTS_MERGED,
        "Merged assessment results",
        vec![
            ("inputs", inputs.len().to_string().as_str()),
            ("observations", observations.len().to_string().as_str()),
        ],
    );

    AssessmentResults {
        uuid: new_uuid(),
        metadata: Metadata::new(title, GENERATOR_VERSION, oscal_version, now),
        import_ap: ImportAp {
            href: oscal::IMPORT_AP_PLACEHOLDER_HREF.to_string(),
            remarks: None,
        },
        results: vec![AssessmentResult {
            uuid: new_uuid(),
            title: title.to_string(),
            description: title.to_string(),
            start: now,
            end: None,
            props: result_props,
            links,
            reviewed_controls: ReviewedControls {
                description: None,
                control_selections: vec![ControlSelection {
                    description: None,
                    include_controls,
                }],
            },
            observations,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::create_test_logger;
    use crate::oscal::{Observation, Property};

    fn observation(title: &str) -> Observation {
        Observation {
            uuid: new_uuid(),
            title: Some(title.to_string()),
            description: title.to_string(),
            props: vec![],
            links: vec![],
            methods: vec!["AUTOMATED".to_string()],
            types: vec![],
            subjects: vec![],
            relevant_evidence: vec![],
            collected: time::now(),
        }
    }

    fn assessment(
        oscal_version: &str,
        controls: Vec<(&str, Vec<&str>)>,
        observations: Vec<Observation>,
    ) -> AssessmentResults {
        AssessmentResults {
            uuid: new_uuid(),
            metadata: Metadata::new("input", "0.1", oscal_version, time::now()),
            import_ap: ImportAp {
                href: "https://not-available-for-now".to_string(),
                remarks: None,
            },
            results: vec![AssessmentResult {
                uuid: new_uuid(),
                title: "input".to_string(),
                description: "input".to_string(),
                start: time::now(),
                end: None,
                props: vec![Property::new("label", "shared")],
                links: vec![],
                reviewed_controls: ReviewedControls {
                    description: None,
                    control_selections: vec![ControlSelection {
                        description: None,
                        include_controls: controls
                            .into_iter()
                            .map(|(id, stmts)| SelectControlById {
                                control_id: id.to_string(),
                                statement_ids: stmts.iter().map(|s| s.to_string()).collect(),
                            })
                            .collect(),
                    }],
                },
                observations,
            }],
        }
    }

    #[test]
    fn test_merge_controls_and_observations() {
        let first = assessment(
            "1.1.2",
            vec![("cm-6", vec!["cm-6_smt.a"]), ("ac-1", vec![])],
            vec![observation("kyverno-check")],
        );
        let second = assessment(
            "1.0.4",
            vec![("cm-6", vec!["cm-6_smt.b"]), ("sc-7", vec!["sc-7_smt"])],
            vec![observation("ocm-check-1"), observation("ocm-check-2")],
        );

        let (logger, memory) = create_test_logger();
        let merged = merge_assessment_results("Heterogeneous", &[first, second], &logger);

        assert_eq!(merged.metadata.title, "Heterogeneous");
        assert_eq!(merged.metadata.oscal_version, "1.1.2");

        let result = &merged.results[0];
        let include = &result.reviewed_controls.control_selections[0].include_controls;
        let ids: Vec<&str> = include.iter().map(|c| c.control_id.as_str()).collect();
        assert_eq!(ids, vec!["cm-6", "ac-1", "sc-7"]);
        assert_eq!(include[0].statement_ids, vec!["cm-6_smt.a", "cm-6_smt.b"]);

        let titles: Vec<&str> = result
            .observations
            .iter()
            .filter_map(|o| o.title.as_deref())
            .collect();
        assert_eq!(titles, vec!["kyverno-check", "ocm-check-1", "ocm-check-2"]);
        assert_eq!(result.props.len(), 1);
        assert!(memory.has_success_with_code(codes::success::RESULTS_MERGED));
    }

    #[test]
    fn test_merge_nothing() {
        let (logger, _) = create_test_logger();
        let merged = merge_assessment_results("empty", &[], &logger);
        assert_eq!(merged.metadata.oscal_version, "1.1.2");
        assert!(merged.results[0].observations.is_empty());
    }
}
