//! Concept value objects of the metadata repository.
//!
//! Each type implements [`mdr_versioning::ConceptValue`] and is stored as a
//! [`mdr_versioning::LibraryItem`]. Validation only reads through a
//! [`mdr_versioning::ReferenceResolver`]; nothing here touches storage.

pub mod activity;
pub mod ct_term_name;
pub mod sponsor_model;
pub mod syntax_template;

pub use activity::{ActivityGroup, ActivitySubGroup};
pub use ct_term_name::CtTermName;
pub use sponsor_model::SponsorModel;
pub use syntax_template::{SyntaxTemplate, extract_parameters};

use mdr_model::MdrError;

/// Rejects blank required text fields.
pub(crate) fn require_text(resource: &str, field: &str, value: &str) -> Result<(), MdrError> {
    if value.trim().is_empty() {
        return Err(MdrError::invalid_value(resource, field, value));
    }
    Ok(())
}
