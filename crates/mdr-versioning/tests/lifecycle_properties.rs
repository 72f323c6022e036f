//! Property tests for the standard lifecycle.

use std::collections::BTreeSet;

use mdr_model::{
    AuthorId, ConceptKind, Library, LibraryItemStatus, MdrError, ObjectAction, Uid, Version,
};
use mdr_versioning::{
    ConceptValue, LibraryItem, NoReferences, ReferenceResolver, StandardVersioning,
    VersioningStrategy, possible_actions,
};
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Label(String);

impl ConceptValue for Label {
    const KIND: ConceptKind = ConceptKind::ActivityGroup;

    fn name(&self) -> &str {
        &self.0
    }

    fn validate(
        &self,
        _resolver: &dyn ReferenceResolver,
        _previous: Option<&Self>,
    ) -> Result<(), MdrError> {
        Ok(())
    }
}

fn author() -> AuthorId {
    AuthorId::new("tester").unwrap()
}

fn new_item() -> LibraryItem<Label> {
    LibraryItem::from_input_values(
        author(),
        Label("start".into()),
        Library::from_repository_values("Sponsor", true),
        || Some(Uid::from_counter("ActivityGroup", 1)),
        &NoReferences,
    )
    .unwrap()
}

fn apply(item: &mut LibraryItem<Label>, action: ObjectAction, step: usize) -> Result<(), MdrError> {
    match action {
        ObjectAction::Approve => item.approve(author(), None),
        ObjectAction::Edit => item
            .edit_draft(author(), "edit", Label(format!("step {step}")), &NoReferences)
            .map(|_| ()),
        ObjectAction::Delete => item.soft_delete(),
        ObjectAction::NewVersion => item.create_new_version(author(), None),
        ObjectAction::Inactivate => item.inactivate(author(), None),
        ObjectAction::Reactivate => item.reactivate(author(), None),
    }
}

fn any_action() -> impl Strategy<Value = ObjectAction> {
    prop::sample::select(ObjectAction::all().to_vec())
}

fn any_status() -> impl Strategy<Value = LibraryItemStatus> {
    prop::sample::select(LibraryItemStatus::all().to_vec())
}

proptest! {
    #[test]
    fn possible_actions_are_total(status in any_status(), major in 0u32..50) {
        let actions = possible_actions(status, major);
        let expected: BTreeSet<ObjectAction> = match (status, major) {
            (LibraryItemStatus::Draft, 0) => {
                [ObjectAction::Approve, ObjectAction::Edit, ObjectAction::Delete].into()
            }
            (LibraryItemStatus::Draft, _) => [ObjectAction::Approve, ObjectAction::Edit].into(),
            (LibraryItemStatus::Final, _) => {
                [ObjectAction::NewVersion, ObjectAction::Inactivate].into()
            }
            (LibraryItemStatus::Retired, _) => [ObjectAction::Reactivate].into(),
        };
        prop_assert_eq!(actions, expected);
    }

    #[test]
    fn legal_actions_always_succeed(status in any_status(), major in 1u32..20, minor in 0u32..20) {
        let strategy = StandardVersioning;
        let minor = if status == LibraryItemStatus::Draft { minor + 1 } else { 0 };
        let current = mdr_versioning::ItemState::new(status, Version::new(major, minor));
        for action in ObjectAction::all() {
            let legal = strategy.possible_actions(current).contains(&action);
            prop_assert_eq!(strategy.transition(current, action).is_ok(), legal);
        }
    }

    #[test]
    fn random_walks_keep_invariants(actions in prop::collection::vec(any_action(), 1..40)) {
        let mut item = new_item();
        let mut last = item.metadata().version();

        for (step, action) in actions.into_iter().enumerate() {
            if item.is_deleted() {
                break;
            }
            let before = item.metadata().clone();
            let history_len = item.history().len();
            let legal = item.possible_actions().contains(&action);

            match apply(&mut item, action, step) {
                Ok(()) => {
                    prop_assert!(legal);
                    let now = item.metadata().version();
                    match action {
                        ObjectAction::Approve | ObjectAction::Edit | ObjectAction::NewVersion => {
                            prop_assert!(now > last, "{action}: {last} -> {now}");
                        }
                        _ => prop_assert_eq!(now, last),
                    }
                    last = now;
                }
                Err(_) => {
                    prop_assert!(!legal);
                    prop_assert_eq!(item.metadata(), &before);
                    prop_assert_eq!(item.history().len(), history_len);
                }
            }

            let status = item.metadata().status();
            prop_assert_eq!(
                status == LibraryItemStatus::Final || status == LibraryItemStatus::Retired,
                item.metadata().version().is_round()
            );
        }

        // Closed snapshots chain without gaps and start dates strictly increase.
        let history = item.history();
        for pair in history.windows(2) {
            prop_assert_eq!(pair[0].metadata.end_date(), Some(pair[1].metadata.start_date()));
            prop_assert!(pair[0].metadata.start_date() < pair[1].metadata.start_date());
            prop_assert!(pair[0].metadata.version() <= pair[1].metadata.version());
        }
    }
}

#[test]
fn concrete_scenarios() {
    let mut item = new_item();
    assert_eq!(item.metadata().version_string(), "0.1");

    assert!(
        !item
            .edit_draft(author(), "same", Label("start".into()), &NoReferences)
            .unwrap()
    );
    assert_eq!(item.metadata().version_string(), "0.1");
    assert!(item.history().is_empty());

    let steps: [(ObjectAction, &str, &str); 6] = [
        (ObjectAction::Approve, "Final", "1.0"),
        (ObjectAction::NewVersion, "Draft", "1.1"),
        (ObjectAction::Approve, "Final", "2.0"),
        (ObjectAction::Inactivate, "Retired", "2.0"),
        (ObjectAction::Reactivate, "Final", "2.0"),
        (ObjectAction::NewVersion, "Draft", "2.1"),
    ];
    for (step, (action, status, version)) in steps.into_iter().enumerate() {
        apply(&mut item, action, step).unwrap();
        assert_eq!(item.metadata().status().as_str(), status);
        assert_eq!(item.metadata().version_string(), version);
    }
}
