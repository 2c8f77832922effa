//! # Unified observation model
//!
//! The contract between plugins and the projection engine: a plugin turns its
//! tool's output into a [`PVPResult`], the engine turns that into OSCAL.

pub mod defaults;
pub mod raw;
pub mod result;

pub use defaults::apply_defaults;
pub use raw::{RawResult, RawResultMetadata};
pub use result::{Link, ObservationByCheck, PVPResult, Property, ResultEnum, Subject};
