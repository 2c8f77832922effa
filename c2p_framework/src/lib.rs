//! # C2P Framework - compliance to policy mapping engine
//!
//! Extracts rules and parameters from OSCAL component-definitions, normalizes
//! policy validation point results into a unified observation model, projects
//! that model onto OSCAL assessment results and renders Markdown reports.

pub mod config;
pub mod error;
pub mod logging;
pub mod oscal;
pub mod plugin;
pub mod policy;
pub mod projection;
pub mod pvp;
pub mod report;
pub mod utils;

// Convenience re-exports
pub use error::C2PError;
pub use projection::{merge_assessment_results, C2P};

pub mod prelude {
    pub use crate::config::{C2PConfig, ColumnAliases, ComplianceOscal, LoggingPreferences};
    pub use crate::error::C2PError;
    pub use crate::logging::{create_logging_service, LogLevel, LoggingService};

    pub use crate::oscal::{AssessmentResults, Catalog, ComponentDefinition, Profile};
    pub use crate::plugin::{PluginError, PluginRegistry, PluginSpec, RegistryError};
    pub use crate::policy::{Parameter, Policy, PolicyExtractor, RuleSet};
    pub use crate::projection::{merge_assessment_results, C2P};
    pub use crate::pvp::{
        apply_defaults, Link, ObservationByCheck, PVPResult, Property, RawResult, ResultEnum,
        Subject,
    };
    pub use crate::report::ReportRenderer;
}
