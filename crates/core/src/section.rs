//! The fixed compliance section set.
//!
//! Every submission carries a status, a document group, and a chat thread
//! per section. Section names are part of the stored vocabulary (they key
//! the `section_status` map and tag files, chat messages, and timeline
//! events), so the serialized form uses the human-readable titles the
//! original data model established.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A named compliance category with its own documents, status, and chat
/// thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "Company Information")]
    CompanyInformation,
    #[serde(rename = "Compliance")]
    Compliance,
    #[serde(rename = "Security")]
    Security,
    #[serde(rename = "Attestations")]
    Attestations,
}

/// All sections in canonical order. Aggregate approval and resume routing
/// both iterate this list.
pub const ALL_SECTIONS: &[Section] = &[
    Section::CompanyInformation,
    Section::Compliance,
    Section::Security,
    Section::Attestations,
];

impl Section {
    /// The stored (and displayed) section name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::CompanyInformation => "Company Information",
            Section::Compliance => "Compliance",
            Section::Security => "Security",
            Section::Attestations => "Attestations",
        }
    }

    /// Parse a stored section name. Unknown names are a validation error:
    /// callers must not construct requests for sections outside the fixed
    /// set.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        match name {
            "Company Information" => Ok(Section::CompanyInformation),
            "Compliance" => Ok(Section::Compliance),
            "Security" => Ok(Section::Security),
            "Attestations" => Ok(Section::Attestations),
            other => Err(CoreError::Validation(format!(
                "Invalid section '{other}'. Must be one of: Company Information, \
                 Compliance, Security, Attestations"
            ))),
        }
    }

    /// Number of distinct document fields a partner must upload before the
    /// section counts as complete.
    pub fn required_field_count(&self) -> usize {
        match self {
            Section::CompanyInformation => 4,
            Section::Compliance => 3,
            Section::Security => 3,
            Section::Attestations => 2,
        }
    }

    /// The partner-facing form route for this section.
    pub fn route(&self) -> &'static str {
        match self {
            Section::CompanyInformation => "/onboarding/company-info",
            Section::Compliance => "/onboarding/compliance",
            Section::Security => "/onboarding/security",
            Section::Attestations => "/onboarding/attestations",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_all_sections() {
        for section in ALL_SECTIONS {
            let parsed = Section::parse(section.as_str()).unwrap();
            assert_eq!(parsed, *section);
        }
    }

    #[test]
    fn unknown_section_rejected() {
        let result = Section::parse("Legal");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid section"));
    }

    #[test]
    fn serde_uses_display_names() {
        let json = serde_json::to_string(&Section::CompanyInformation).unwrap();
        assert_eq!(json, "\"Company Information\"");
        let back: Section = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Section::CompanyInformation);
    }

    #[test]
    fn required_field_counts_match_document_checklists() {
        assert_eq!(Section::CompanyInformation.required_field_count(), 4);
        assert_eq!(Section::Compliance.required_field_count(), 3);
        assert_eq!(Section::Security.required_field_count(), 3);
        assert_eq!(Section::Attestations.required_field_count(), 2);
    }
}
