//! Activity groups and sub-groups.

use serde::{Deserialize, Serialize};

use mdr_model::{ConceptKind, MdrError, Uid};
use mdr_versioning::{ConceptValue, ReferenceResolver, ensure_reference, ensure_unique_name};

use crate::require_text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityGroup {
    pub name: String,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
}

impl ConceptValue for ActivityGroup {
    const KIND: ConceptKind = ConceptKind::ActivityGroup;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(
        &self,
        resolver: &dyn ReferenceResolver,
        previous: Option<&Self>,
    ) -> Result<(), MdrError> {
        require_text(Self::KIND.label(), "name", &self.name)?;
        ensure_unique_name(
            resolver,
            Self::KIND,
            &self.name,
            previous.map(|p| p.name.as_str()),
        )
    }
}

/// A sub-group linked to one or more FINAL activity groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySubGroup {
    pub name: String,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub activity_groups: Vec<Uid>,
}

impl ConceptValue for ActivitySubGroup {
    const KIND: ConceptKind = ConceptKind::ActivitySubGroup;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(
        &self,
        resolver: &dyn ReferenceResolver,
        previous: Option<&Self>,
    ) -> Result<(), MdrError> {
        require_text(Self::KIND.label(), "name", &self.name)?;
        for group in &self.activity_groups {
            ensure_reference(resolver, Self::KIND, ConceptKind::ActivityGroup, group, true)?;
        }
        ensure_unique_name(
            resolver,
            Self::KIND,
            &self.name,
            previous.map(|p| p.name.as_str()),
        )
    }
}
