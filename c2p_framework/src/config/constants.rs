//! Fixed names and values shared by the engine and the plugins

pub mod oscal {
    /// OSCAL schema version stamped into generated documents
    pub const OSCAL_VERSION: &str = "1.1.2";

    /// Assessment plans are not modelled yet; results point at this href
    pub const IMPORT_AP_PLACEHOLDER_HREF: &str = "https://not-available-for-now";

    /// Component type that marks a PVP (rule/check producer)
    pub const VALIDATION_COMPONENT_TYPE: &str = "validation";
}

pub mod columns {
    pub const RULE_ID: &str = "Rule_Id";
    pub const RULE_DESCRIPTION: &str = "Rule_Description";
    pub const CHECK_ID: &str = "Check_Id";
    pub const CHECK_DESCRIPTION: &str = "Check_Description";
    pub const PARAMETER_ID: &str = "Parameter_Id";
    pub const PARAMETER_DESCRIPTION: &str = "Parameter_Description";
    pub const PARAMETER_VALUE_ALTERNATIVES: &str = "Parameter_Value_Alternatives";
}

/// Property names written into assessment results
pub mod props {
    pub const ASSESSMENT_RULE_ID: &str = "assessment-rule-id";
    pub const RESOURCE_ID: &str = "resource-id";
    pub const RESULT: &str = "result";
    pub const EVALUATED_ON: &str = "evaluated-on";
    pub const REASON: &str = "reason";
    pub const LABEL: &str = "label";
}

pub mod observation {
    pub const METHOD_AUTOMATED: &str = "AUTOMATED";
}
