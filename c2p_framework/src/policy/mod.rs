//! # Rule and parameter extraction
//!
//! Turns a component-definition into a [`Policy`]: the rule sets of one PVP
//! and the parameters of the components it validates.

pub mod extractor;
pub mod grouping;
pub mod types;

pub use extractor::PolicyExtractor;
pub use grouping::{group_by_correlation_key, group_props_by_remarks, PropertyRow};
pub use types::{Parameter, Policy, RuleSet};

#[cfg(test)]
pub(crate) use extractor::fixtures;
