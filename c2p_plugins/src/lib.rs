//! # c2p plugins
//!
//! Reference PVP plugins for the compliance-to-policy framework:
//! Auditree, Kyverno and Open Cluster Management.

pub mod auditree;
pub mod kyverno;
pub mod ocm;

use c2p_framework::config::C2PConfig;
use c2p_framework::logging::LoggingService;
use c2p_framework::plugin::{PluginError, PluginRegistry};
use c2p_framework::pvp::RawResult;
use c2p_framework::utils::get_path;
use c2p_framework::C2PError;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub use auditree::AuditreePlugin;
pub use kyverno::KyvernoPlugin;
pub use ocm::OcmPlugin;

/// Create a registry with every bundled plugin
///
/// Each plugin picks up its `[plugins.<name>]` table from `config` when one
/// is present. Plugins without a table can still transform results.
pub fn create_plugin_registry(config: &C2PConfig, logger: LoggingService) -> Result<PluginRegistry, PluginError> {
    let mut registry = PluginRegistry::new();

    registry.register(Box::new(AuditreePlugin::new(
        config.plugin_config(auditree::PLUGIN_NAME)?,
        logger.clone(),
    )?))?;
    registry.register(Box::new(KyvernoPlugin::new(
        config.plugin_config(kyverno::PLUGIN_NAME)?,
        logger.clone(),
    )))?;
    registry.register(Box::new(OcmPlugin::new(config.plugin_config(ocm::PLUGIN_NAME)?, logger)))?;

    Ok(registry)
}

/// Read one tool output file as JSON, or YAML for `.yaml`/`.yml`
pub fn load_raw_data(path: &Path) -> Result<Value, C2PError> {
    let content = std::fs::read_to_string(path).map_err(|e| C2PError::load(path, e))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_saphyr::from_str(&content).map_err(|e| C2PError::load(path, e)),
        _ => serde_json::from_str(&content).map_err(|e| C2PError::load(path, e)),
    }
}

/// Build the raw result handed to a plugin from one or more tool outputs
///
/// A single input is passed through as-is. Several inputs must each be a
/// list of resources; their items are concatenated into one list.
pub fn load_raw_result(paths: &[PathBuf]) -> Result<RawResult, PluginError> {
    match paths {
        [] => Err(PluginError::invalid_raw_result("no input files given")),
        [path] => Ok(RawResult::new(load_raw_data(path)?).with_filepath(&path.display().to_string())),
        _ => {
            let mut items = Vec::new();
            for path in paths {
                let data = load_raw_data(path)?;
                items.extend(raw_items(&data)?.iter().cloned());
            }
            Ok(RawResult::new(Value::Array(items)))
        }
    }
}

/// Items of a raw result: either a list or a Kubernetes `List` with `items`
pub(crate) fn raw_items(data: &Value) -> Result<&[Value], PluginError> {
    let items = match data {
        Value::Array(items) => Some(items),
        Value::Object(_) => get_path(data, &["items"]).and_then(Value::as_array),
        _ => None,
    };
    items
        .map(Vec::as_slice)
        .ok_or_else(|| PluginError::invalid_raw_result("expected a list of resources"))
}
