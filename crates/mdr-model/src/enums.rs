//! Type-safe enumerations for library item versioning.
//!
//! The string forms are part of the persisted and displayed contract, so
//! `as_str` and `FromStr` must stay in sync with the serde representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a library item version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LibraryItemStatus {
    /// Editable working copy. Never released when the major version is 0.
    Draft,
    /// Released version. Minor version is always 0.
    Final,
    /// Released version that is no longer in use.
    Retired,
}

impl LibraryItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryItemStatus::Draft => "Draft",
            LibraryItemStatus::Final => "Final",
            LibraryItemStatus::Retired => "Retired",
        }
    }

    pub fn all() -> [LibraryItemStatus; 3] {
        [
            LibraryItemStatus::Draft,
            LibraryItemStatus::Final,
            LibraryItemStatus::Retired,
        ]
    }
}

impl fmt::Display for LibraryItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LibraryItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DRAFT" => Ok(LibraryItemStatus::Draft),
            "FINAL" => Ok(LibraryItemStatus::Final),
            "RETIRED" => Ok(LibraryItemStatus::Retired),
            _ => Err(format!("Unknown library item status: {s}")),
        }
    }
}

/// Actions that move a library item between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectAction {
    Approve,
    Edit,
    Delete,
    NewVersion,
    Inactivate,
    Reactivate,
}

impl ObjectAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectAction::Approve => "approve",
            ObjectAction::Edit => "edit",
            ObjectAction::Delete => "delete",
            ObjectAction::NewVersion => "new_version",
            ObjectAction::Inactivate => "inactivate",
            ObjectAction::Reactivate => "reactivate",
        }
    }

    pub fn all() -> [ObjectAction; 6] {
        [
            ObjectAction::Approve,
            ObjectAction::Edit,
            ObjectAction::Delete,
            ObjectAction::NewVersion,
            ObjectAction::Inactivate,
            ObjectAction::Reactivate,
        ]
    }
}

impl fmt::Display for ObjectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ObjectAction {
    type Err = String;

    /// Accepts both `new_version` and `new-version` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "approve" => Ok(ObjectAction::Approve),
            "edit" => Ok(ObjectAction::Edit),
            "delete" => Ok(ObjectAction::Delete),
            "new_version" | "newversion" => Ok(ObjectAction::NewVersion),
            "inactivate" => Ok(ObjectAction::Inactivate),
            "reactivate" => Ok(ObjectAction::Reactivate),
            _ => Err(format!("Unknown object action: {s}")),
        }
    }
}

/// Kinds of concepts known to the repository.
///
/// Aggregate kinds are versioned library items stored in a repository.
/// Reference kinds are maintained outside the versioning core and are only
/// ever looked up by uid or name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConceptKind {
    CtTermName,
    ActivityGroup,
    ActivitySubGroup,
    SyntaxTemplate,
    SponsorModel,
    CtCodelist,
    TemplateParameter,
    DataModelIg,
}

impl ConceptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConceptKind::CtTermName => "ct-term-name",
            ConceptKind::ActivityGroup => "activity-group",
            ConceptKind::ActivitySubGroup => "activity-sub-group",
            ConceptKind::SyntaxTemplate => "syntax-template",
            ConceptKind::SponsorModel => "sponsor-model",
            ConceptKind::CtCodelist => "ct-codelist",
            ConceptKind::TemplateParameter => "template-parameter",
            ConceptKind::DataModelIg => "data-model-ig",
        }
    }

    /// Human-readable resource name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ConceptKind::CtTermName => "CT Term Name",
            ConceptKind::ActivityGroup => "Activity Group",
            ConceptKind::ActivitySubGroup => "Activity Sub Group",
            ConceptKind::SyntaxTemplate => "Syntax Template",
            ConceptKind::SponsorModel => "Sponsor Model",
            ConceptKind::CtCodelist => "CT Codelist",
            ConceptKind::TemplateParameter => "Template Parameter",
            ConceptKind::DataModelIg => "Data Model IG",
        }
    }

    /// Prefix used when generating uids for this kind.
    pub fn uid_prefix(&self) -> &'static str {
        match self {
            ConceptKind::CtTermName => "CTTerm",
            ConceptKind::ActivityGroup => "ActivityGroup",
            ConceptKind::ActivitySubGroup => "ActivitySubGroup",
            ConceptKind::SyntaxTemplate => "SyntaxTemplate",
            ConceptKind::SponsorModel => "SponsorModel",
            ConceptKind::CtCodelist => "CTCodelist",
            ConceptKind::TemplateParameter => "TemplateParameter",
            ConceptKind::DataModelIg => "DataModelIG",
        }
    }

    /// Returns true for kinds stored as versioned aggregates.
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            ConceptKind::CtTermName
                | ConceptKind::ActivityGroup
                | ConceptKind::ActivitySubGroup
                | ConceptKind::SyntaxTemplate
                | ConceptKind::SponsorModel
        )
    }

    pub fn all() -> [ConceptKind; 8] {
        [
            ConceptKind::CtTermName,
            ConceptKind::ActivityGroup,
            ConceptKind::ActivitySubGroup,
            ConceptKind::SyntaxTemplate,
            ConceptKind::SponsorModel,
            ConceptKind::CtCodelist,
            ConceptKind::TemplateParameter,
            ConceptKind::DataModelIg,
        ]
    }
}

impl fmt::Display for ConceptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConceptKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        ConceptKind::all()
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("Unknown concept kind: {s}"))
    }
}
