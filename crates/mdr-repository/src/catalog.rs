//! All repositories of a store plus the libraries and external references
//! their items point at.
//!
//! The catalog is the [`ReferenceResolver`] handed to concept validation:
//! aggregate kinds are answered from their repository, reference kinds
//! (codelists, template parameters, implementation guides) from the
//! reference registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use mdr_concepts::{ActivityGroup, ActivitySubGroup, CtTermName, SponsorModel, SyntaxTemplate};
use mdr_model::{AuthorId, ConceptKind, Library, MdrError, Uid};
use mdr_versioning::{ConceptValue, LibraryItem, ReferenceResolver};

use crate::cache::ItemCache;
use crate::query::{StatusCounts, VersionSelector};
use crate::repository::{InMemoryRepository, LibraryItemRepository};

/// A concept maintained outside the versioning core, known by uid and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub kind: ConceptKind,
    pub uid: Uid,
    pub name: String,
}

/// Generic access to the repository of one concept kind.
pub trait HasRepository<C: ConceptValue> {
    fn repository(&self) -> &InMemoryRepository<C>;
    fn repository_mut(&mut self) -> &mut InMemoryRepository<C>;
}

#[derive(Debug, Default)]
pub struct Catalog {
    pub(crate) libraries: BTreeMap<String, Library>,
    pub(crate) references: Vec<ReferenceRecord>,
    pub(crate) ct_term_names: InMemoryRepository<CtTermName>,
    pub(crate) activity_groups: InMemoryRepository<ActivityGroup>,
    pub(crate) activity_sub_groups: InMemoryRepository<ActivitySubGroup>,
    pub(crate) syntax_templates: InMemoryRepository<SyntaxTemplate>,
    pub(crate) sponsor_models: InMemoryRepository<SponsorModel>,
}

macro_rules! impl_has_repository {
    ($($concept:ty => $field:ident),* $(,)?) => {
        $(
            impl HasRepository<$concept> for Catalog {
                fn repository(&self) -> &InMemoryRepository<$concept> {
                    &self.$field
                }

                fn repository_mut(&mut self) -> &mut InMemoryRepository<$concept> {
                    &mut self.$field
                }
            }
        )*
    };
}

impl_has_repository! {
    CtTermName => ct_term_names,
    ActivityGroup => activity_groups,
    ActivitySubGroup => activity_sub_groups,
    SyntaxTemplate => syntax_templates,
    SponsorModel => sponsor_models,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes every repository's lookups through `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: &Arc<ItemCache>) -> Self {
        self.ct_term_names = self.ct_term_names.with_cache(Arc::clone(cache));
        self.activity_groups = self.activity_groups.with_cache(Arc::clone(cache));
        self.activity_sub_groups = self.activity_sub_groups.with_cache(Arc::clone(cache));
        self.syntax_templates = self.syntax_templates.with_cache(Arc::clone(cache));
        self.sponsor_models = self.sponsor_models.with_cache(Arc::clone(cache));
        self
    }

    pub fn items<C: ConceptValue>(&self) -> &InMemoryRepository<C>
    where
        Self: HasRepository<C>,
    {
        HasRepository::<C>::repository(self)
    }

    pub fn items_mut<C: ConceptValue>(&mut self) -> &mut InMemoryRepository<C>
    where
        Self: HasRepository<C>,
    {
        HasRepository::<C>::repository_mut(self)
    }

    /// Registers or updates a library.
    pub fn add_library(&mut self, library: Library) {
        info!(library = %library.name, editable = library.is_editable, "registered library");
        self.libraries.insert(library.name.clone(), library);
    }

    pub fn libraries(&self) -> impl Iterator<Item = &Library> {
        self.libraries.values()
    }

    /// Looks up a library by name, failing if it is unknown.
    pub fn library(&self, name: &str) -> Result<Library, MdrError> {
        Library::from_input_values(name, |n| self.is_library_editable(n))
    }

    /// Registers an external reference concept and returns its uid.
    pub fn add_reference(&mut self, kind: ConceptKind, name: &str) -> Result<Uid, MdrError> {
        if kind.is_aggregate() {
            return Err(MdrError::validation(format!(
                "{} is a library item kind, not a reference kind.",
                kind.label()
            )));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(MdrError::invalid_value(kind.label(), "name", name));
        }
        if self.find_uid_by_name(kind, name).is_some() {
            return Err(MdrError::already_exists(kind.label(), "Name", name));
        }
        let counter = self.references.iter().filter(|r| r.kind == kind).count() as u64 + 1;
        let uid = Uid::from_counter(kind.uid_prefix(), counter);
        info!(kind = %kind, uid = %uid, name, "registered reference");
        self.references.push(ReferenceRecord {
            kind,
            uid: uid.clone(),
            name: name.to_string(),
        });
        Ok(uid)
    }

    pub fn references(&self) -> &[ReferenceRecord] {
        &self.references
    }

    /// Creates and saves a new item in `library_name`.
    pub fn create<C: ConceptValue>(
        &mut self,
        author_id: AuthorId,
        concept: C,
        library_name: &str,
    ) -> Result<LibraryItem<C>, MdrError>
    where
        Self: HasRepository<C>,
    {
        let library = self.library(library_name)?;
        let repository = self.items::<C>();
        let mut item = LibraryItem::from_input_values(
            author_id,
            concept,
            library,
            || Some(repository.generate_uid()),
            &*self,
        )?;
        self.items_mut::<C>().save(&mut item)?;
        Ok(item)
    }

    /// Loads the latest version of `uid`, applies `change` and saves the result.
    ///
    /// Nothing is saved when `change` fails.
    pub fn update<C, T, F>(&mut self, uid: &Uid, change: F) -> Result<(LibraryItem<C>, T), MdrError>
    where
        C: ConceptValue,
        Self: HasRepository<C>,
        F: FnOnce(&mut LibraryItem<C>, &dyn ReferenceResolver) -> Result<T, MdrError>,
    {
        let mut item = self.items::<C>().find_by_uid(uid, VersionSelector::Latest)?;
        let outcome = change(&mut item, &*self)?;
        self.items_mut::<C>().save(&mut item)?;
        Ok((item, outcome))
    }

    /// Per-kind status counts, in [`ConceptKind::all`] order.
    pub fn status_counts(&self) -> Vec<(ConceptKind, StatusCounts)> {
        vec![
            (CtTermName::KIND, self.ct_term_names.status_counts()),
            (ActivityGroup::KIND, self.activity_groups.status_counts()),
            (ActivitySubGroup::KIND, self.activity_sub_groups.status_counts()),
            (SyntaxTemplate::KIND, self.syntax_templates.status_counts()),
            (SponsorModel::KIND, self.sponsor_models.status_counts()),
        ]
    }

    fn reference(&self, kind: ConceptKind, uid: &Uid) -> Option<&ReferenceRecord> {
        self.references
            .iter()
            .find(|r| r.kind == kind && &r.uid == uid)
    }
}

impl ReferenceResolver for Catalog {
    fn exists(&self, kind: ConceptKind, uid: &Uid) -> bool {
        match kind {
            ConceptKind::CtTermName => self.ct_term_names.exists(uid),
            ConceptKind::ActivityGroup => self.activity_groups.exists(uid),
            ConceptKind::ActivitySubGroup => self.activity_sub_groups.exists(uid),
            ConceptKind::SyntaxTemplate => self.syntax_templates.exists(uid),
            ConceptKind::SponsorModel => self.sponsor_models.exists(uid),
            ConceptKind::CtCodelist | ConceptKind::TemplateParameter | ConceptKind::DataModelIg => {
                self.reference(kind, uid).is_some()
            }
        }
    }

    fn is_final(&self, kind: ConceptKind, uid: &Uid) -> bool {
        match kind {
            ConceptKind::CtTermName => self.ct_term_names.is_final(uid),
            ConceptKind::ActivityGroup => self.activity_groups.is_final(uid),
            ConceptKind::ActivitySubGroup => self.activity_sub_groups.is_final(uid),
            ConceptKind::SyntaxTemplate => self.syntax_templates.is_final(uid),
            ConceptKind::SponsorModel => self.sponsor_models.is_final(uid),
            ConceptKind::CtCodelist | ConceptKind::TemplateParameter | ConceptKind::DataModelIg => {
                self.reference(kind, uid).is_some()
            }
        }
    }

    fn find_uid_by_name(&self, kind: ConceptKind, name: &str) -> Option<Uid> {
        match kind {
            ConceptKind::CtTermName => self.ct_term_names.find_uid_by_name(name),
            ConceptKind::ActivityGroup => self.activity_groups.find_uid_by_name(name),
            ConceptKind::ActivitySubGroup => self.activity_sub_groups.find_uid_by_name(name),
            ConceptKind::SyntaxTemplate => self.syntax_templates.find_uid_by_name(name),
            ConceptKind::SponsorModel => self.sponsor_models.find_uid_by_name(name),
            ConceptKind::CtCodelist | ConceptKind::TemplateParameter | ConceptKind::DataModelIg => {
                self.references
                    .iter()
                    .find(|r| r.kind == kind && r.name == name)
                    .map(|r| r.uid.clone())
            }
        }
    }

    fn is_library_editable(&self, name: &str) -> Option<bool> {
        self.libraries.get(name).map(|library| library.is_editable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> AuthorId {
        AuthorId::new("jdoe").unwrap()
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.add_library(Library::from_repository_values("Sponsor", true));
        catalog.add_library(Library::from_repository_values("CDISC", false));
        catalog
    }

    #[test]
    fn references_are_registered_once() {
        let mut catalog = catalog();
        let uid = catalog
            .add_reference(ConceptKind::CtCodelist, "No Yes Response")
            .unwrap();
        assert_eq!(uid.as_str(), "CTCodelist_000001");
        assert!(catalog.exists(ConceptKind::CtCodelist, &uid));
        assert!(catalog.is_final(ConceptKind::CtCodelist, &uid));

        let err = catalog
            .add_reference(ConceptKind::CtCodelist, "No Yes Response")
            .unwrap_err();
        assert_eq!(err.status_code(), 409);

        let err = catalog
            .add_reference(ConceptKind::ActivityGroup, "Labs")
            .unwrap_err();
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn unknown_library_is_rejected() {
        let mut catalog = catalog();
        let group = ActivityGroup {
            name: "Labs".into(),
            definition: None,
            abbreviation: None,
        };
        let err = catalog.create(author(), group, "Nowhere").unwrap_err();
        assert!(err.message().contains("Nowhere"));
        assert!(catalog.items::<ActivityGroup>().is_empty());
    }

    #[test]
    fn create_and_update_through_catalog() {
        let mut catalog = catalog();
        let group = ActivityGroup {
            name: "Labs".into(),
            definition: None,
            abbreviation: None,
        };
        let item = catalog.create(author(), group, "Sponsor").unwrap();
        let uid = item.uid().cloned().unwrap();
        assert_eq!(uid.as_str(), "ActivityGroup_000001");
        assert!(catalog.exists_by_name(ConceptKind::ActivityGroup, "Labs"));

        let (item, ()) = catalog
            .update::<ActivityGroup, _, _>(&uid, |item, _| item.approve(author(), None))
            .unwrap();
        assert_eq!(item.metadata().version_string(), "1.0");
        assert!(catalog.is_final(ConceptKind::ActivityGroup, &uid));

        let err = catalog
            .update::<ActivityGroup, _, _>(&uid, |item, _| item.approve(author(), None))
            .unwrap_err();
        assert_eq!(err.code(), "invalid_status_non_draft");
    }
}
