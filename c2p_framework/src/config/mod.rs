//! Configuration module
//!
//! `c2p_config` holds the per-run conversion settings, `runtime` the
//! environment-driven preferences and `constants` the fixed vocabulary.

pub mod c2p_config;
pub mod constants;
pub mod runtime;

pub use c2p_config::{C2PConfig, ColumnAliases, ComplianceOscal, ComplianceType};
pub use runtime::{LogFormat, LoggingPreferences};
