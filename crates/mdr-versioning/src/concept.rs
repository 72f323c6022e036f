//! Concept value contract and the reference-lookup capability.

use std::fmt::Debug;
use std::sync::Arc;

use mdr_model::{ConceptKind, ItemMetadata, MdrError, Uid};

use crate::strategy::{StandardVersioning, VersioningStrategy};

/// Lookups a concept needs to validate its references and uniqueness.
///
/// Implemented by the repository layer. All methods are synchronous
/// predicates over the current state of the store.
pub trait ReferenceResolver {
    /// True if an item or reference of `kind` with `uid` exists.
    fn exists(&self, kind: ConceptKind, uid: &Uid) -> bool;

    /// True if the latest version of `uid` is FINAL.
    ///
    /// Reference kinds without a lifecycle are always final once registered.
    fn is_final(&self, kind: ConceptKind, uid: &Uid) -> bool;

    /// Uid of the item of `kind` whose latest version carries `name`.
    fn find_uid_by_name(&self, kind: ConceptKind, name: &str) -> Option<Uid>;

    fn exists_by_name(&self, kind: ConceptKind, name: &str) -> bool {
        self.find_uid_by_name(kind, name).is_some()
    }

    /// `None` if the library is unknown.
    fn is_library_editable(&self, name: &str) -> Option<bool>;
}

/// Resolver for contexts without a store: nothing exists and every library is editable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferences;

impl ReferenceResolver for NoReferences {
    fn exists(&self, _kind: ConceptKind, _uid: &Uid) -> bool {
        false
    }

    fn is_final(&self, _kind: ConceptKind, _uid: &Uid) -> bool {
        false
    }

    fn find_uid_by_name(&self, _kind: ConceptKind, _name: &str) -> Option<Uid> {
        None
    }

    fn is_library_editable(&self, _name: &str) -> Option<bool> {
        Some(true)
    }
}

/// Immutable payload of a library item.
///
/// Equality is structural and decides whether an edit is a no-op.
pub trait ConceptValue: Clone + PartialEq + Debug + Send + Sync + 'static {
    const KIND: ConceptKind;

    /// Items of this kind may still transition inside a non-editable library.
    const EDITABLE_IN_LOCKED_LIBRARY: bool = false;

    /// Name used for uniqueness checks and listings.
    fn name(&self) -> &str;

    /// Checks references and uniqueness.
    ///
    /// `previous` is the value being replaced on edit, `None` on creation,
    /// so that an unchanged name does not collide with itself.
    fn validate(
        &self,
        resolver: &dyn ReferenceResolver,
        previous: Option<&Self>,
    ) -> Result<(), MdrError>;

    /// Extra rules for replacing `previous` given the item's current metadata.
    fn check_edit(&self, _previous: &Self, _current: &ItemMetadata) -> Result<(), MdrError> {
        Ok(())
    }

    fn versioning_strategy() -> Arc<dyn VersioningStrategy> {
        Arc::new(StandardVersioning)
    }
}

/// Fails with `AlreadyExists` if another item of `kind` already uses `name`.
///
/// Keeping the previous name is never a collision.
pub fn ensure_unique_name(
    resolver: &dyn ReferenceResolver,
    kind: ConceptKind,
    name: &str,
    previous_name: Option<&str>,
) -> Result<(), MdrError> {
    if previous_name == Some(name) {
        return Ok(());
    }
    if resolver.exists_by_name(kind, name) {
        return Err(MdrError::already_exists(kind.label(), "Name", name));
    }
    Ok(())
}

/// Fails with `BusinessLogic` if `uid` does not resolve to an item of `kind`,
/// or, with `require_final`, if it is not FINAL.
pub fn ensure_reference(
    resolver: &dyn ReferenceResolver,
    owner: ConceptKind,
    kind: ConceptKind,
    uid: &Uid,
    require_final: bool,
) -> Result<(), MdrError> {
    if !resolver.exists(kind, uid) {
        return Err(MdrError::business_logic(format!(
            "{} tried to connect to non-existent {} with UID '{uid}'.",
            owner.label(),
            kind.label()
        )));
    }
    if require_final && !resolver.is_final(kind, uid) {
        return Err(MdrError::business_logic(format!(
            "{} tried to connect to {} with UID '{uid}' that is not in Final status.",
            owner.label(),
            kind.label()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneOfEach;

    impl ReferenceResolver for OneOfEach {
        fn exists(&self, kind: ConceptKind, uid: &Uid) -> bool {
            kind == ConceptKind::ActivityGroup && uid.as_str().starts_with("ActivityGroup_")
        }

        fn is_final(&self, _kind: ConceptKind, uid: &Uid) -> bool {
            uid.as_str() == "ActivityGroup_000001"
        }

        fn find_uid_by_name(&self, kind: ConceptKind, name: &str) -> Option<Uid> {
            (kind == ConceptKind::ActivityGroup && name == "Taken")
                .then(|| Uid::from_counter("ActivityGroup", 1))
        }

        fn is_library_editable(&self, _name: &str) -> Option<bool> {
            None
        }
    }

    #[test]
    fn unique_name_allows_keeping_previous() {
        let kind = ConceptKind::ActivityGroup;
        assert!(ensure_unique_name(&OneOfEach, kind, "Free", None).is_ok());
        assert!(ensure_unique_name(&OneOfEach, kind, "Taken", Some("Taken")).is_ok());

        let err = ensure_unique_name(&OneOfEach, kind, "Taken", Some("Other")).unwrap_err();
        assert_eq!(err.status_code(), 409);
        insta::assert_snapshot!(err.to_string(), @"Activity Group with Name 'Taken' already exists.");
    }

    #[test]
    fn reference_must_exist_and_optionally_be_final() {
        let owner = ConceptKind::ActivitySubGroup;
        let kind = ConceptKind::ActivityGroup;
        let final_uid = Uid::from_counter("ActivityGroup", 1);
        let draft_uid = Uid::from_counter("ActivityGroup", 2);
        let missing = Uid::new("Nope_1").unwrap();

        assert!(ensure_reference(&OneOfEach, owner, kind, &final_uid, true).is_ok());
        assert!(ensure_reference(&OneOfEach, owner, kind, &draft_uid, false).is_ok());

        let err = ensure_reference(&OneOfEach, owner, kind, &draft_uid, true).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.message().contains("not in Final status"));

        let err = ensure_reference(&OneOfEach, owner, kind, &missing, false).unwrap_err();
        assert_eq!(
            err.message(),
            "Activity Sub Group tried to connect to non-existent Activity Group with UID 'Nope_1'."
        );
    }

    #[test]
    fn no_references_knows_nothing() {
        let uid = Uid::from_counter("CTCodelist", 1);
        assert!(!NoReferences.exists(ConceptKind::CtCodelist, &uid));
        assert!(!NoReferences.exists_by_name(ConceptKind::CtTermName, "x"));
        assert_eq!(NoReferences.is_library_editable("Sponsor"), Some(true));
    }
}
