//! Contract implemented by every tool adapter

use super::errors::PluginError;
use crate::policy::Policy;
use crate::pvp::{PVPResult, RawResult};

/// A policy validation point adapter
///
/// Translates the tool's native results into the unified model and turns an
/// extracted [`Policy`] into the tool's deliverable.
pub trait PluginSpec: Send + Sync {
    /// Registry key, e.g. `kyverno`
    fn name(&self) -> &str;

    fn generate_pvp_result(&self, raw_result: &RawResult) -> Result<PVPResult, PluginError>;

    /// Write the deliverable for `policy` to the plugin's configured output
    fn generate_pvp_policy(&self, policy: &Policy) -> Result<(), PluginError>;
}
