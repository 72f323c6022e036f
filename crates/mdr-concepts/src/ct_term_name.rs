//! Names of controlled terminology terms.

use serde::{Deserialize, Serialize};

use mdr_model::{ConceptKind, MdrError, Uid};
use mdr_versioning::{ConceptValue, ReferenceResolver, ensure_reference, ensure_unique_name};

use crate::require_text;

/// Submission-facing and sentence-case names of a CT term within a codelist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtTermName {
    pub codelist_uid: Uid,
    pub name: String,
    pub name_sentence_case: String,
}

impl ConceptValue for CtTermName {
    const KIND: ConceptKind = ConceptKind::CtTermName;
    /// Sponsor preferred names are maintained on terms of locked CDISC libraries too.
    const EDITABLE_IN_LOCKED_LIBRARY: bool = true;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(
        &self,
        resolver: &dyn ReferenceResolver,
        previous: Option<&Self>,
    ) -> Result<(), MdrError> {
        let label = Self::KIND.label();
        require_text(label, "name", &self.name)?;
        require_text(label, "name_sentence_case", &self.name_sentence_case)?;
        if self.name.to_lowercase() != self.name_sentence_case.to_lowercase() {
            return Err(MdrError::validation(format!(
                "Lowercase versions of '{}' and '{}' must be equal",
                self.name, self.name_sentence_case
            )));
        }
        ensure_reference(
            resolver,
            Self::KIND,
            ConceptKind::CtCodelist,
            &self.codelist_uid,
            false,
        )?;
        ensure_unique_name(
            resolver,
            Self::KIND,
            &self.name,
            previous.map(|p| p.name.as_str()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdr_versioning::NoReferences;

    struct Codelists;

    impl ReferenceResolver for Codelists {
        fn exists(&self, kind: ConceptKind, uid: &Uid) -> bool {
            kind == ConceptKind::CtCodelist && uid.as_str() == "CTCodelist_000001"
        }

        fn is_final(&self, _kind: ConceptKind, _uid: &Uid) -> bool {
            true
        }

        fn find_uid_by_name(&self, kind: ConceptKind, name: &str) -> Option<Uid> {
            (kind == ConceptKind::CtTermName && name == "Yes")
                .then(|| Uid::from_counter("CTTerm", 1))
        }

        fn is_library_editable(&self, _name: &str) -> Option<bool> {
            Some(true)
        }
    }

    fn term(name: &str, sentence: &str) -> CtTermName {
        CtTermName {
            codelist_uid: Uid::from_counter("CTCodelist", 1),
            name: name.to_string(),
            name_sentence_case: sentence.to_string(),
        }
    }

    #[test]
    fn sentence_case_must_match_ignoring_case() {
        assert!(term("NO", "no").validate(&Codelists, None).is_ok());

        let err = term("No", "Nope").validate(&Codelists, None).unwrap_err();
        assert_eq!(err.status_code(), 422);
        insta::assert_snapshot!(err.to_string(), @"Lowercase versions of 'No' and 'Nope' must be equal");
    }

    #[test]
    fn codelist_must_exist() {
        let err = term("No", "no").validate(&NoReferences, None).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.message().contains("CT Codelist"));
    }

    #[test]
    fn name_is_unique_unless_unchanged() {
        let err = term("Yes", "yes").validate(&Codelists, None).unwrap_err();
        assert_eq!(err.message(), "CT Term Name with Name 'Yes' already exists.");

        let previous = term("Yes", "Yes");
        assert!(
            term("Yes", "yes")
                .validate(&Codelists, Some(&previous))
                .is_ok()
        );
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = term(" ", " ").validate(&Codelists, None).unwrap_err();
        assert_eq!(err.message(), "Provided name ' ' is invalid for CT Term Name.");
    }
}
