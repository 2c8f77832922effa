//! # OSCAL projection
//!
//! Turns a unified [`PVPResult`](crate::pvp::PVPResult) plus the
//! component-definition it was checked against into OSCAL assessment results,
//! and merges results coming from different PVPs.

pub mod engine;
pub mod merge;

pub use engine::{project, reviewed_controls, C2P, GENERATOR_VERSION};
pub use merge::merge_assessment_results;
