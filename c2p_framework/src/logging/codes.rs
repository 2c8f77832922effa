//! Log and error codes for the mapping engine
//!
//! Codes are short static identifiers. The leading letter encodes the category:
//! `ERR` system, `L` loading, `X` extraction, `P` projection, `G` plugin,
//! `S` success.

use serde::{Serialize, Serializer};

/// Static code attached to every log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Category derived from the code prefix
    pub fn category(&self) -> &'static str {
        get_category(self.0)
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Document and configuration loading codes
pub mod loading {
    use super::Code;

    pub const DOCUMENT_LOAD_FAILURE: Code = Code::new("L001");
    pub const DOCUMENT_PARSE_FAILURE: Code = Code::new("L002");
    pub const CONFIG_ERROR: Code = Code::new("L003");
    pub const SERIALIZATION_FAILURE: Code = Code::new("L004");
    pub const IO_ERROR: Code = Code::new("L005");
}

/// Rule and parameter extraction codes
pub mod extraction {
    use super::Code;

    pub const COMPONENT_NOT_FOUND: Code = Code::new("X001");
    pub const AMBIGUOUS_COMPONENT: Code = Code::new("X002");
    pub const ROW_DROPPED: Code = Code::new("X003");
    pub const PARAMETER_OVERRIDDEN: Code = Code::new("X004");
}

/// OSCAL projection codes
pub mod projection {
    use super::Code;

    pub const OBSERVATION_DROPPED: Code = Code::new("P001");
    pub const EMPTY_RESULT: Code = Code::new("P002");
}

/// Plugin (adapter) codes
pub mod plugin {
    use super::Code;

    pub const UNSUPPORTED_PARAMETER_VALUE: Code = Code::new("G001");
    pub const INVALID_PARAMETER_VALUE: Code = Code::new("G002");
    pub const NOT_A_DIRECTORY: Code = Code::new("G003");
    pub const TEMPLATE_NOT_FOUND: Code = Code::new("G004");
    pub const FILESYSTEM_ERROR: Code = Code::new("G005");
    pub const INVALID_TEMPLATE: Code = Code::new("G006");
    pub const INVALID_RAW_RESULT: Code = Code::new("G007");
    pub const MISSING_CONFIG: Code = Code::new("G008");
    pub const UNRESOLVED_PLACEHOLDER: Code = Code::new("G009");
    pub const MISSING_DETAILS: Code = Code::new("G010");
    pub const ITEM_SKIPPED: Code = Code::new("G011");
    pub const DUPLICATE_PLUGIN: Code = Code::new("G020");
    pub const PLUGIN_NOT_FOUND: Code = Code::new("G021");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const DOCUMENT_LOADED: Code = Code::new("S001");
    pub const POLICY_EXTRACTED: Code = Code::new("S002");
    pub const RESULT_GENERATED: Code = Code::new("S003");
    pub const ASSESSMENT_PROJECTED: Code = Code::new("S004");
    pub const POLICY_GENERATED: Code = Code::new("S005");
    pub const REPORT_RENDERED: Code = Code::new("S006");
    pub const RESULTS_MERGED: Code = Code::new("S007");
}

/// Get the category name of a code string
pub fn get_category(code: &str) -> &'static str {
    if code.starts_with("ERR") {
        "System"
    } else if code.starts_with('L') {
        "Loading"
    } else if code.starts_with('X') {
        "Extraction"
    } else if code.starts_with('P') {
        "Projection"
    } else if code.starts_with('G') {
        "Plugin"
    } else if code.starts_with('S') {
        "Success"
    } else if code.starts_with('W') {
        "Warning"
    } else if code.starts_with('D') {
        "Debug"
    } else {
        "Info"
    }
}
