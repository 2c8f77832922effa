//! # Plugin contract
//!
//! Tool adapters implement [`PluginSpec`] and are looked up by name through a
//! [`PluginRegistry`]. The `deliverable` helpers cover the filesystem side of
//! policy generation.

pub mod deliverable;
pub mod errors;
pub mod registry;
pub mod traits;

pub use errors::{PluginError, RegistryError};
pub use registry::PluginRegistry;
pub use traits::PluginSpec;
