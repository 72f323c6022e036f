//! Sponsor data models derived from a CDISC implementation guide.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use mdr_model::{ConceptKind, MdrError, Uid};
use mdr_versioning::{
    ConceptValue, ReferenceResolver, SingleMajorVersioning, VersioningStrategy, ensure_reference,
    ensure_unique_name,
};

use crate::require_text;

/// A sponsor model. Versions are released whole, so there are no drafts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SponsorModel {
    pub name: String,
    pub ig_uid: Uid,
    #[serde(default)]
    pub description: Option<String>,
}

impl ConceptValue for SponsorModel {
    const KIND: ConceptKind = ConceptKind::SponsorModel;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(
        &self,
        resolver: &dyn ReferenceResolver,
        previous: Option<&Self>,
    ) -> Result<(), MdrError> {
        require_text(Self::KIND.label(), "name", &self.name)?;
        ensure_reference(
            resolver,
            Self::KIND,
            ConceptKind::DataModelIg,
            &self.ig_uid,
            false,
        )?;
        ensure_unique_name(
            resolver,
            Self::KIND,
            &self.name,
            previous.map(|p| p.name.as_str()),
        )
    }

    fn versioning_strategy() -> Arc<dyn VersioningStrategy> {
        Arc::new(SingleMajorVersioning)
    }
}
