//! End-to-end lifecycle through the catalog and the store file.

use std::sync::Arc;

use mdr_concepts::{ActivityGroup, ActivitySubGroup, CtTermName, SponsorModel, SyntaxTemplate};
use mdr_model::{AuthorId, ConceptKind, Library, LibraryItemStatus, Uid, Version};
use mdr_repository::{
    CacheConfig, Catalog, ItemCache, ItemFilter, LibraryItemRepository, StoreFile, VersionSelector,
    load_store, save_store,
};
use mdr_versioning::ReferenceResolver;
use tempfile::tempdir;

fn author() -> AuthorId {
    AuthorId::new("jdoe").unwrap()
}

fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.add_library(Library::from_repository_values("Sponsor", true));
    catalog.add_library(Library::from_repository_values("CDISC", false));
    catalog
        .add_reference(ConceptKind::CtCodelist, "No Yes Response")
        .unwrap();
    catalog
        .add_reference(ConceptKind::TemplateParameter, "Indication")
        .unwrap();
    catalog
        .add_reference(ConceptKind::DataModelIg, "SDTMIG 3.4")
        .unwrap();
    catalog
}

fn group(name: &str) -> ActivityGroup {
    ActivityGroup {
        name: name.to_string(),
        definition: None,
        abbreviation: None,
    }
}

#[test]
fn sub_group_needs_final_group() {
    let mut catalog = catalog();
    let labs = catalog.create(author(), group("Labs"), "Sponsor").unwrap();
    let labs_uid = labs.uid().cloned().unwrap();

    let sub_group = ActivitySubGroup {
        name: "Chemistry".into(),
        definition: None,
        activity_groups: vec![labs_uid.clone()],
    };
    let err = catalog
        .create(author(), sub_group.clone(), "Sponsor")
        .unwrap_err();
    assert!(err.message().contains("not in Final status"));

    catalog
        .update::<ActivityGroup, _, _>(&labs_uid, |item, _| item.approve(author(), None))
        .unwrap();
    let created = catalog.create(author(), sub_group, "Sponsor").unwrap();
    assert_eq!(created.metadata().version_string(), "0.1");
}

#[test]
fn ct_term_names_in_locked_library() {
    let mut catalog = catalog();
    let codelist = Uid::from_counter("CTCodelist", 1);
    let term = CtTermName {
        codelist_uid: codelist,
        name: "Yes".into(),
        name_sentence_case: "yes".into(),
    };

    // Creating inside a locked library is never allowed.
    let err = catalog.create(author(), term.clone(), "CDISC").unwrap_err();
    assert!(err.message().contains("does not allow to create objects"));

    let created = catalog.create(author(), term.clone(), "Sponsor").unwrap();
    let uid = created.uid().cloned().unwrap();

    // Duplicate name.
    let err = catalog.create(author(), term, "Sponsor").unwrap_err();
    assert_eq!(err.status_code(), 409);

    catalog
        .update::<CtTermName, _, _>(&uid, |item, _| item.approve(author(), None))
        .unwrap();
    assert!(catalog.is_final(ConceptKind::CtTermName, &uid));
}

#[test]
fn syntax_template_parameters_freeze_after_approval() {
    let mut catalog = catalog();
    let template = SyntaxTemplate {
        name: "Patients with [Indication]".into(),
        guidance_text: None,
    };
    let uid = catalog
        .create(author(), template, "Sponsor")
        .unwrap()
        .uid()
        .cloned()
        .unwrap();

    let err = catalog
        .update::<SyntaxTemplate, _, _>(&uid, |item, resolver| {
            let concept = SyntaxTemplate {
                name: "Patients with [Dose]".into(),
                guidance_text: None,
            };
            item.edit_draft(author(), "typo", concept, resolver)
        })
        .unwrap_err();
    assert_eq!(err.message(), "Unknown parameter name in template string: Dose");

    catalog
        .update::<SyntaxTemplate, _, _>(&uid, |item, _| {
            item.approve(author(), None)?;
            item.create_new_version(author(), None)
        })
        .unwrap();

    let err = catalog
        .update::<SyntaxTemplate, _, _>(&uid, |item, resolver| {
            let concept = SyntaxTemplate {
                name: "Adults without parameters".into(),
                guidance_text: None,
            };
            item.edit_draft(author(), "drop parameter", concept, resolver)
        })
        .unwrap_err();
    assert_eq!(
        err.message(),
        "You cannot change number or order of template parameters."
    );

    let (item, changed) = catalog
        .update::<SyntaxTemplate, _, _>(&uid, |item, resolver| {
            let concept = SyntaxTemplate {
                name: "Adult patients with [Indication]".into(),
                guidance_text: Some("Use the primary indication.".into()),
            };
            item.edit_draft(author(), "reword", concept, resolver)
        })
        .unwrap();
    assert!(changed);
    assert_eq!(item.metadata().version_string(), "1.2");
}

#[test]
fn store_round_trip_keeps_history() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mdr-store.json");

    let mut catalog = catalog();
    let uid = catalog
        .create(author(), group("Labs"), "Sponsor")
        .unwrap()
        .uid()
        .cloned()
        .unwrap();
    catalog
        .update::<ActivityGroup, _, _>(&uid, |item, _| {
            item.approve(author(), None)?;
            item.create_new_version(author(), None)?;
            item.approve(author(), None)?;
            item.inactivate(author(), None)
        })
        .unwrap();
    let model = SponsorModel {
        name: "Sponsor SDTM".into(),
        ig_uid: Uid::from_counter("DataModelIG", 1),
        description: None,
    };
    catalog.create(author(), model, "Sponsor").unwrap();

    let mut store = StoreFile::from_catalog(&catalog);
    save_store(&mut store, &path).unwrap();
    let loaded = load_store(&path).unwrap();

    let mut reloaded = StoreFile::from_catalog(&loaded);
    reloaded.saved_at = store.saved_at;
    assert_eq!(reloaded, store);

    let groups = loaded.items::<ActivityGroup>();
    let versions: Vec<String> = groups
        .get_all_versions(&uid)
        .unwrap()
        .iter()
        .map(|s| format!("{} {}", s.metadata.status(), s.metadata.version()))
        .collect();
    insta::assert_snapshot!(versions.join("\n"), @r"
    Retired 2.0
    Final 2.0
    Draft 1.1
    Final 1.0
    Draft 0.1
    ");

    let first_release = groups
        .find_by_uid(&uid, VersionSelector::Version(Version::new(1, 0)))
        .unwrap();
    let at_release = groups
        .find_by_uid(
            &uid,
            VersionSelector::AtDate(first_release.metadata().start_date()),
        )
        .unwrap();
    assert_eq!(at_release.metadata(), first_release.metadata());
    assert!(at_release.is_read_only());

    let retired = groups.find_all(&ItemFilter::default().with_status(LibraryItemStatus::Retired));
    assert_eq!(retired.len(), 1);

    let models = loaded.items::<SponsorModel>();
    let model = models
        .find_by_uid(&Uid::from_counter("SponsorModel", 1), VersionSelector::Latest)
        .unwrap();
    assert_eq!(model.metadata().status(), LibraryItemStatus::Final);
    assert_eq!(model.metadata().version_string(), "1.0");
}

#[test]
fn cached_catalog_sees_its_own_writes() {
    let cache = ItemCache::shared(CacheConfig::default());
    let mut catalog = catalog().with_cache(&cache);
    let uid = catalog
        .create(author(), group("Labs"), "Sponsor")
        .unwrap()
        .uid()
        .cloned()
        .unwrap();

    for _ in 0..3 {
        catalog
            .items::<ActivityGroup>()
            .find_by_uid(&uid, VersionSelector::Latest)
            .unwrap();
    }
    assert_eq!(cache.stats().hits, 2);

    let (item, ()) = catalog
        .update::<ActivityGroup, _, _>(&uid, |item, _| item.approve(author(), None))
        .unwrap();
    assert_eq!(item.metadata().version_string(), "1.0");
    let latest = catalog
        .items::<ActivityGroup>()
        .find_by_uid(&uid, VersionSelector::Latest)
        .unwrap();
    assert_eq!(latest.metadata().status(), LibraryItemStatus::Final);
    assert_eq!(Arc::strong_count(&cache), 6);
}
