//! Auxiliary test-case metadata: custom fields, keywords and requirements.

use serde::{Deserialize, Serialize};

/// A TestLink custom field value attached to a test case
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomField {
    /// Field name
    pub name: String,
    /// Field value (may contain markup)
    pub value: String,
}

impl CustomField {
    /// Creates a new custom field
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A keyword tag with optional notes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Keyword {
    /// Keyword name
    pub name: String,
    /// Free-text notes
    pub notes: String,
}

impl Keyword {
    /// Creates a keyword without notes
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: String::new(),
        }
    }

    /// Creates a keyword with notes
    #[must_use]
    pub fn with_notes(name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: notes.into(),
        }
    }
}

/// A requirement coverage link
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Requirement {
    /// Requirement document id (e.g. `REQ-001`)
    pub doc_id: String,
    /// Requirement title
    pub title: String,
    /// Title of the requirement specification containing it
    pub spec_title: String,
}

impl Requirement {
    /// Creates a requirement link
    #[must_use]
    pub fn new(
        doc_id: impl Into<String>,
        title: impl Into<String>,
        spec_title: impl Into<String>,
    ) -> Self {
        Self {
            doc_id: doc_id.into(),
            title: title.into(),
            spec_title: spec_title.into(),
        }
    }
}
