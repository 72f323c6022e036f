//! The versioned aggregate root.

use std::collections::BTreeSet;
use std::mem;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use mdr_model::{
    AuthorId, ChangeLabel, ItemMetadata, Library, LibraryItemStatus, MdrError, ObjectAction, Uid,
};

use crate::concept::{ConceptValue, ReferenceResolver};
use crate::strategy::{ItemState, VersioningStrategy};

/// One closed version of an item: the concept as it was and its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot<C> {
    pub concept: C,
    pub metadata: ItemMetadata,
}

/// A library item: uid, library, current concept value and current metadata.
///
/// Every successful transition closes the current metadata, records it in
/// [`LibraryItem::history`] together with the concept it described, and
/// installs the successor. A failed transition leaves the item untouched.
#[derive(Debug, Clone)]
pub struct LibraryItem<C: ConceptValue> {
    uid: Option<Uid>,
    library: Library,
    concept: C,
    metadata: ItemMetadata,
    history: Vec<VersionSnapshot<C>>,
    deleted: bool,
    read_only: bool,
    strategy: Arc<dyn VersioningStrategy>,
}

impl<C: ConceptValue> LibraryItem<C> {
    /// Creates a new item using the concept kind's versioning strategy.
    pub fn from_input_values<F>(
        author_id: AuthorId,
        concept: C,
        library: Library,
        generate_uid: F,
        resolver: &dyn ReferenceResolver,
    ) -> Result<Self, MdrError>
    where
        F: FnOnce() -> Option<Uid>,
    {
        Self::create_with_strategy(
            C::versioning_strategy(),
            author_id,
            concept,
            library,
            generate_uid,
            resolver,
        )
    }

    /// Creates a new item with an explicit versioning strategy.
    ///
    /// The uid callback runs only after all checks passed, so no uid is
    /// consumed by a rejected creation.
    pub fn create_with_strategy<F>(
        strategy: Arc<dyn VersioningStrategy>,
        author_id: AuthorId,
        concept: C,
        library: Library,
        generate_uid: F,
        resolver: &dyn ReferenceResolver,
    ) -> Result<Self, MdrError>
    where
        F: FnOnce() -> Option<Uid>,
    {
        if !library.is_editable {
            return Err(MdrError::business_logic(format!(
                "The library with the name='{}' does not allow to create objects.",
                library.name
            )));
        }
        concept.validate(resolver, None)?;

        let state = strategy.initial_state();
        let metadata = ItemMetadata::initial_with(state.status, state.version, author_id, None);
        let uid = generate_uid();
        debug!(
            kind = %C::KIND,
            uid = ?uid.as_ref().map(Uid::as_str),
            strategy = strategy.name(),
            status = %state.status,
            version = %state.version,
            "created library item"
        );
        Ok(Self {
            uid,
            library,
            concept,
            metadata,
            history: Vec::new(),
            deleted: false,
            read_only: false,
            strategy,
        })
    }

    /// Rebuilds an item from persisted values without any validation.
    pub fn from_repository_values(
        uid: Uid,
        concept: C,
        library: Library,
        metadata: ItemMetadata,
    ) -> Self {
        Self {
            uid: Some(uid),
            library,
            concept,
            metadata,
            history: Vec::new(),
            deleted: false,
            read_only: false,
            strategy: C::versioning_strategy(),
        }
    }

    /// Marks the item as a historical view that rejects every transition.
    #[must_use]
    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Assigns the uid of an item created without one.
    pub fn set_uid(&mut self, uid: Uid) -> Result<(), MdrError> {
        self.ensure_not_deleted()?;
        if self.uid.is_some() {
            return Err(MdrError::business_logic("Cannot modify existing uid."));
        }
        self.uid = Some(uid);
        Ok(())
    }

    pub fn uid(&self) -> Option<&Uid> {
        self.uid.as_ref()
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn concept(&self) -> &C {
        &self.concept
    }

    pub fn metadata(&self) -> &ItemMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        self.concept.name()
    }

    /// Versions closed by transitions on this instance, oldest first.
    pub fn history(&self) -> &[VersionSnapshot<C>] {
        &self.history
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn strategy(&self) -> &dyn VersioningStrategy {
        self.strategy.as_ref()
    }

    pub fn state(&self) -> ItemState {
        ItemState::new(self.metadata.status(), self.metadata.version())
    }

    /// Actions legal right now. Deleted and read-only items have none.
    pub fn possible_actions(&self) -> BTreeSet<ObjectAction> {
        if self.deleted || self.read_only {
            return BTreeSet::new();
        }
        self.strategy.possible_actions(self.state())
    }

    /// Replaces the concept of a draft.
    ///
    /// Returns `false` without recording anything when `concept` equals the
    /// current value.
    pub fn edit_draft(
        &mut self,
        author_id: AuthorId,
        change_description: &str,
        concept: C,
        resolver: &dyn ReferenceResolver,
    ) -> Result<bool, MdrError> {
        let next = self.plan(ObjectAction::Edit)?;
        concept.validate(resolver, Some(&self.concept))?;
        concept.check_edit(&self.concept, &self.metadata)?;
        if concept == self.concept {
            debug!(kind = %C::KIND, uid = ?self.uid_str(), "edit is a no-op");
            return Ok(false);
        }
        self.commit(
            ObjectAction::Edit,
            next,
            author_id,
            change_description.to_string(),
            Some(concept),
        );
        Ok(true)
    }

    pub fn approve(
        &mut self,
        author_id: AuthorId,
        change_description: Option<&str>,
    ) -> Result<(), MdrError> {
        let next = self.plan(ObjectAction::Approve)?;
        let description = change_description.unwrap_or(ChangeLabel::Approved.as_str());
        self.commit(
            ObjectAction::Approve,
            next,
            author_id,
            description.to_string(),
            None,
        );
        Ok(())
    }

    /// Opens the next version with the current concept.
    pub fn create_new_version(
        &mut self,
        author_id: AuthorId,
        change_description: Option<&str>,
    ) -> Result<(), MdrError> {
        let next = self.plan(ObjectAction::NewVersion)?;
        let description = change_description.unwrap_or_else(|| new_version_label(next));
        self.commit(
            ObjectAction::NewVersion,
            next,
            author_id,
            description.to_string(),
            None,
        );
        Ok(())
    }

    /// Opens the next version with a replacement concept.
    pub fn create_new_version_with(
        &mut self,
        author_id: AuthorId,
        change_description: &str,
        concept: C,
        resolver: &dyn ReferenceResolver,
    ) -> Result<(), MdrError> {
        let next = self.plan(ObjectAction::NewVersion)?;
        concept.validate(resolver, Some(&self.concept))?;
        concept.check_edit(&self.concept, &self.metadata)?;
        self.commit(
            ObjectAction::NewVersion,
            next,
            author_id,
            change_description.to_string(),
            Some(concept),
        );
        Ok(())
    }

    pub fn inactivate(
        &mut self,
        author_id: AuthorId,
        change_description: Option<&str>,
    ) -> Result<(), MdrError> {
        let next = self.plan(ObjectAction::Inactivate)?;
        let description = change_description.unwrap_or(ChangeLabel::Inactivated.as_str());
        self.commit(
            ObjectAction::Inactivate,
            next,
            author_id,
            description.to_string(),
            None,
        );
        Ok(())
    }

    pub fn reactivate(
        &mut self,
        author_id: AuthorId,
        change_description: Option<&str>,
    ) -> Result<(), MdrError> {
        let next = self.plan(ObjectAction::Reactivate)?;
        let description = change_description.unwrap_or(ChangeLabel::Reactivated.as_str());
        self.commit(
            ObjectAction::Reactivate,
            next,
            author_id,
            description.to_string(),
            None,
        );
        Ok(())
    }

    /// Marks a never-approved draft as deleted. The repository drops it on save.
    pub fn soft_delete(&mut self) -> Result<(), MdrError> {
        self.plan(ObjectAction::Delete)?;
        self.deleted = true;
        debug!(kind = %C::KIND, uid = ?self.uid_str(), "deleted library item");
        Ok(())
    }

    fn uid_str(&self) -> Option<&str> {
        self.uid.as_ref().map(Uid::as_str)
    }

    fn ensure_not_deleted(&self) -> Result<(), MdrError> {
        if self.deleted {
            return Err(MdrError::business_logic("Cannot use deleted object."));
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), MdrError> {
        self.ensure_not_deleted()?;
        if self.read_only {
            let uid = self.uid_str().unwrap_or("<unassigned>");
            return Err(MdrError::business_logic(format!(
                "Cannot modify a historical version of {uid}."
            )));
        }
        Ok(())
    }

    fn ensure_library_editable(&self) -> Result<(), MdrError> {
        if !self.library.is_editable && !C::EDITABLE_IN_LOCKED_LIBRARY {
            return Err(MdrError::versioning_with(
                "Library is not editable.",
                "library_not_editable",
                403,
            ));
        }
        Ok(())
    }

    /// Computes the state after `action` without touching the item.
    fn plan(&self, action: ObjectAction) -> Result<ItemState, MdrError> {
        let current = self.state();
        let planned = self
            .ensure_writable()
            .and_then(|()| self.strategy.transition(current, action))
            .and_then(|next| self.ensure_library_editable().map(|()| next));
        if let Err(err) = &planned {
            warn!(
                kind = %C::KIND,
                uid = ?self.uid_str(),
                action = %action,
                state = %current,
                error = %err,
                "rejected transition"
            );
        }
        planned
    }

    fn commit(
        &mut self,
        action: ObjectAction,
        next: ItemState,
        author_id: AuthorId,
        change_description: String,
        concept: Option<C>,
    ) {
        let successor = self.metadata.successor(
            next.status,
            next.version,
            author_id,
            change_description,
            Utc::now(),
        );
        let end = successor.start_date();
        let previous_metadata = mem::replace(&mut self.metadata, successor).closed_at(end);
        let previous_concept = match concept {
            Some(concept) => mem::replace(&mut self.concept, concept),
            None => self.concept.clone(),
        };
        debug!(
            kind = %C::KIND,
            uid = ?self.uid_str(),
            action = %action,
            from = %previous_metadata.status(),
            to = %next.status,
            version = %next.version,
            "applied transition"
        );
        self.history.push(VersionSnapshot {
            concept: previous_concept,
            metadata: previous_metadata,
        });
    }
}

fn new_version_label(next: ItemState) -> &'static str {
    match next.status {
        LibraryItemStatus::Draft => ChangeLabel::NewDraft.as_str(),
        _ => ChangeLabel::Approved.as_str(),
    }
}
