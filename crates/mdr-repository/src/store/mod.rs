//! JSON store file.
//!
//! ```text
//! {
//!   "format": "mdr-store",
//!   "schema_version": 1,
//!   "saved_at": "2026-01-01T00:00:00Z",
//!   "libraries": [...],
//!   "references": [...],
//!   "ct_term_names": { "next_uid": 3, "items": [...] },
//!   ...
//! }
//! ```
//!
//! Every item keeps all of its snapshots, oldest first. Files are written to a
//! temp file and renamed into place.

mod load;
mod save;

pub use load::load_store;
pub use save::save_store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mdr_concepts::{ActivityGroup, ActivitySubGroup, CtTermName, SponsorModel, SyntaxTemplate};
use mdr_model::{Library, MdrError};

use crate::catalog::{Catalog, ReferenceRecord};
use crate::repository::{InMemoryRepository, RepositoryState};

/// Value of the `format` header field.
pub const STORE_FORMAT: &str = "mdr-store";

/// Current store schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Root of a store file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreFile {
    pub format: String,
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default)]
    pub references: Vec<ReferenceRecord>,
    #[serde(default)]
    pub ct_term_names: RepositoryState<CtTermName>,
    #[serde(default)]
    pub activity_groups: RepositoryState<ActivityGroup>,
    #[serde(default)]
    pub activity_sub_groups: RepositoryState<ActivitySubGroup>,
    #[serde(default)]
    pub syntax_templates: RepositoryState<SyntaxTemplate>,
    #[serde(default)]
    pub sponsor_models: RepositoryState<SponsorModel>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            format: STORE_FORMAT.to_string(),
            schema_version: CURRENT_SCHEMA_VERSION,
            saved_at: Utc::now(),
            libraries: Vec::new(),
            references: Vec::new(),
            ct_term_names: RepositoryState::default(),
            activity_groups: RepositoryState::default(),
            activity_sub_groups: RepositoryState::default(),
            syntax_templates: RepositoryState::default(),
            sponsor_models: RepositoryState::default(),
        }
    }
}

impl StoreFile {
    pub fn touch(&mut self) {
        self.saved_at = Utc::now();
    }

    /// Snapshot of everything in `catalog`.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            libraries: catalog.libraries.values().cloned().collect(),
            references: catalog.references.clone(),
            ct_term_names: catalog.ct_term_names.to_state(),
            activity_groups: catalog.activity_groups.to_state(),
            activity_sub_groups: catalog.activity_sub_groups.to_state(),
            syntax_templates: catalog.syntax_templates.to_state(),
            sponsor_models: catalog.sponsor_models.to_state(),
            ..Self::default()
        }
    }

    /// Rebuilds a catalog, revalidating every stored snapshot.
    pub fn into_catalog(self) -> Result<Catalog, MdrError> {
        let mut catalog = Catalog {
            references: self.references,
            ct_term_names: InMemoryRepository::from_state(self.ct_term_names)?,
            activity_groups: InMemoryRepository::from_state(self.activity_groups)?,
            activity_sub_groups: InMemoryRepository::from_state(self.activity_sub_groups)?,
            syntax_templates: InMemoryRepository::from_state(self.syntax_templates)?,
            sponsor_models: InMemoryRepository::from_state(self.sponsor_models)?,
            ..Catalog::default()
        };
        for library in self.libraries {
            catalog.add_library(library);
        }
        Ok(catalog)
    }
}
