//! # OSCAL document layer
//!
//! Typed models of the catalog, profile, component-definition and
//! assessment-results documents, restricted to the parts the mapping engine
//! reads or writes. Unknown fields are ignored on input.

pub mod assessment_results;
pub mod catalog;
pub mod common;
pub mod component;
pub mod io;
pub mod profile;

pub use assessment_results::{
    AssessmentResult, AssessmentResults, AssessmentResultsRoot, ControlSelection, ImportAp,
    Observation, RelevantEvidence, ReviewedControls, SelectControlById, SubjectReference,
};
pub use catalog::{Catalog, Control, Group};
pub use common::{find_prop_value, new_uuid, Link, Metadata, Property};
pub use component::{
    is_validation_component, ComponentDefinition, ComponentDefinitionRoot,
    ControlImplementation, DefinedComponent, ImplementedRequirement, Statement,
};
pub use io::{
    assessment_results_to_json, load_assessment_results, load_catalog,
    load_component_definition, load_profile, write_json,
};
pub use profile::Profile;
