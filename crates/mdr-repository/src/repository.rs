//! Versioned storage of library items.
//!
//! A repository keeps every snapshot of every item. Saving an aggregate
//! merges its closed history and its current version into the stored
//! sequence, keyed by `(status, version, start_date)`, so saving the same
//! aggregate twice is harmless. Reading reconstructs a fresh aggregate from
//! the selected snapshot; anything but the current snapshot comes back
//! read-only.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mdr_model::{ItemMetadata, Library, LibraryItemStatus, MdrError, Uid, Version};
use mdr_versioning::{ConceptValue, LibraryItem, VersionSnapshot};

use crate::cache::{CacheKey, ItemCache};
use crate::query::{AuditEntry, AuditPage, ItemFilter, StatusCounts, VersionSelector};
use crate::uid::UidGenerator;

/// Persistence operations for one concept kind.
pub trait LibraryItemRepository<C: ConceptValue> {
    /// Allocates a uid for a new item.
    fn generate_uid(&self) -> Uid;

    /// Persists the aggregate, assigning a uid if it has none.
    ///
    /// A soft-deleted aggregate is removed together with its history.
    fn save(&mut self, item: &mut LibraryItem<C>) -> Result<(), MdrError>;

    fn find_by_uid(
        &self,
        uid: &Uid,
        selector: VersionSelector,
    ) -> Result<LibraryItem<C>, MdrError>;

    /// Every snapshot of `uid`, newest first.
    fn get_all_versions(&self, uid: &Uid) -> Result<Vec<VersionSnapshot<C>>, MdrError>;

    /// Latest version of every item matching `filter`, ordered by uid.
    fn find_all(&self, filter: &ItemFilter) -> Vec<LibraryItem<C>>;

    /// Snapshots of all items ordered by start date descending.
    ///
    /// `page_number` is 1-based; a `page_size` of 0 returns everything.
    fn retrieve_audit_trail(
        &self,
        page_number: usize,
        page_size: usize,
        total_count: bool,
    ) -> AuditPage<C>;

    fn exists(&self, uid: &Uid) -> bool;

    /// True if the latest version of `uid` is FINAL.
    fn is_final(&self, uid: &Uid) -> bool;

    fn find_uid_by_name(&self, name: &str) -> Option<Uid>;

    fn exists_by_name(&self, name: &str) -> bool {
        self.find_uid_by_name(name).is_some()
    }

    fn status_counts(&self) -> StatusCounts;
}

/// Everything stored for one uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord<C> {
    pub uid: Uid,
    pub library: Library,
    /// Oldest first; only the last one is current.
    pub snapshots: Vec<VersionSnapshot<C>>,
}

impl<C> ItemRecord<C> {
    fn latest(&self) -> Option<&VersionSnapshot<C>> {
        self.snapshots.last()
    }
}

/// Serializable state of a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryState<C> {
    pub next_uid: u64,
    #[serde(default = "Vec::new")]
    pub items: Vec<ItemRecord<C>>,
}

impl<C> Default for RepositoryState<C> {
    fn default() -> Self {
        Self {
            next_uid: 1,
            items: Vec::new(),
        }
    }
}

type SnapshotKey = (LibraryItemStatus, Version, DateTime<Utc>);

fn snapshot_key(metadata: &ItemMetadata) -> SnapshotKey {
    (metadata.status(), metadata.version(), metadata.start_date())
}

/// Repository holding all snapshots in memory.
#[derive(Debug)]
pub struct InMemoryRepository<C: ConceptValue> {
    items: BTreeMap<Uid, ItemRecord<C>>,
    uids: UidGenerator,
    cache: Option<Arc<ItemCache>>,
}

impl<C: ConceptValue> Default for InMemoryRepository<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ConceptValue> InMemoryRepository<C> {
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            uids: UidGenerator::new(C::KIND),
            cache: None,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ItemCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rebuilds a repository from persisted state, revalidating every snapshot.
    pub fn from_state(state: RepositoryState<C>) -> Result<Self, MdrError> {
        let mut items = BTreeMap::new();
        for record in state.items {
            validate_record(&record)?;
            if items.contains_key(&record.uid) {
                return Err(MdrError::already_exists(
                    C::KIND.label(),
                    "UID",
                    &record.uid,
                ));
            }
            items.insert(record.uid.clone(), record);
        }
        Ok(Self {
            items,
            uids: UidGenerator::starting_at(C::KIND, state.next_uid),
            cache: None,
        })
    }

    pub fn to_state(&self) -> RepositoryState<C> {
        RepositoryState {
            next_uid: self.uids.peek(),
            items: self.items.values().cloned().collect(),
        }
    }

    fn record(&self, uid: &Uid) -> Result<&ItemRecord<C>, MdrError> {
        self.items
            .get(uid)
            .ok_or_else(|| MdrError::not_found(C::KIND.label(), "UID", uid))
    }

    fn invalidate(&self, uid: &Uid) {
        if let Some(cache) = &self.cache {
            cache.invalidate(C::KIND, uid);
        }
    }

    /// Closed history followed by the current snapshot.
    fn snapshots_of(item: &LibraryItem<C>) -> Vec<VersionSnapshot<C>> {
        item.history()
            .iter()
            .cloned()
            .chain(std::iter::once(VersionSnapshot {
                concept: item.concept().clone(),
                metadata: item.metadata().clone(),
            }))
            .collect()
    }

    fn rebuild(record: &ItemRecord<C>, snapshot: &VersionSnapshot<C>) -> LibraryItem<C> {
        let item = LibraryItem::from_repository_values(
            record.uid.clone(),
            snapshot.concept.clone(),
            record.library.clone(),
            snapshot.metadata.clone(),
        );
        if snapshot.metadata.is_current() {
            item
        } else {
            item.into_read_only()
        }
    }
}

/// Rejects a write whose aggregate never saw the stored current version,
/// i.e. one read before another writer saved.
fn ensure_fresh<C: ConceptValue>(
    existing: &ItemRecord<C>,
    incoming: &[VersionSnapshot<C>],
) -> Result<(), MdrError> {
    let Some(stored) = existing.latest() else {
        return Ok(());
    };
    let stored_key = snapshot_key(&stored.metadata);
    if incoming
        .iter()
        .any(|s| snapshot_key(&s.metadata) == stored_key)
    {
        return Ok(());
    }
    Err(MdrError::business_logic(format!(
        "{} {} was modified since it was read.",
        C::KIND.label(),
        existing.uid
    )))
}

/// Rejects records whose snapshots break the versioning invariants.
fn validate_record<C>(record: &ItemRecord<C>) -> Result<(), MdrError> {
    let Some(last) = record.snapshots.last() else {
        return Err(MdrError::validation(format!(
            "Item {} has no versions.",
            record.uid
        )));
    };
    for snapshot in &record.snapshots {
        let metadata = &snapshot.metadata;
        ItemMetadata::from_repository_values(
            metadata.status(),
            metadata.version(),
            metadata.author_id().clone(),
            metadata.change_description(),
            metadata.start_date(),
            metadata.end_date(),
        )?;
    }
    let open = record
        .snapshots
        .iter()
        .filter(|s| s.metadata.is_current())
        .count();
    if open != 1 || !last.metadata.is_current() {
        return Err(MdrError::validation(format!(
            "Item {} must have exactly one current version, and it must be the latest.",
            record.uid
        )));
    }
    for pair in record.snapshots.windows(2) {
        if pair[1].metadata.start_date() <= pair[0].metadata.start_date()
            || pair[1].metadata.version() < pair[0].metadata.version()
        {
            return Err(MdrError::validation(format!(
                "Versions of item {} are out of order at {}.",
                record.uid,
                pair[1].metadata.version()
            )));
        }
    }
    Ok(())
}

impl<C: ConceptValue> LibraryItemRepository<C> for InMemoryRepository<C> {
    fn generate_uid(&self) -> Uid {
        self.uids.next_uid()
    }

    fn save(&mut self, item: &mut LibraryItem<C>) -> Result<(), MdrError> {
        if item.is_deleted() {
            if let Some(uid) = item.uid() {
                if let Some(existing) = self.items.get(uid) {
                    ensure_fresh(existing, &Self::snapshots_of(item))?;
                }
                self.items.remove(uid);
                self.invalidate(uid);
                info!(kind = %C::KIND, uid = %uid, "removed deleted library item");
            }
            return Ok(());
        }
        if item.is_read_only() {
            let uid = item.uid().map_or("<unassigned>", Uid::as_str);
            return Err(MdrError::business_logic(format!(
                "Cannot modify a historical version of {uid}."
            )));
        }
        if item.uid().is_none() {
            item.set_uid(self.generate_uid())?;
        }
        let Some(uid) = item.uid().cloned() else {
            return Err(MdrError::business_logic("Library item has no uid."));
        };

        let incoming = Self::snapshots_of(item);

        let record = match self.items.get(&uid) {
            Some(existing) => {
                ensure_fresh(existing, &incoming)?;
                let mut merged: BTreeMap<SnapshotKey, VersionSnapshot<C>> = existing
                    .snapshots
                    .iter()
                    .map(|s| (snapshot_key(&s.metadata), s.clone()))
                    .collect();
                for snapshot in incoming {
                    merged.insert(snapshot_key(&snapshot.metadata), snapshot);
                }
                let mut snapshots: Vec<_> = merged.into_values().collect();
                snapshots.sort_by_key(|s| s.metadata.start_date());
                ItemRecord {
                    uid: uid.clone(),
                    library: item.library().clone(),
                    snapshots,
                }
            }
            None => ItemRecord {
                uid: uid.clone(),
                library: item.library().clone(),
                snapshots: incoming,
            },
        };

        let versions = record.snapshots.len();
        self.items.insert(uid.clone(), record);
        self.invalidate(&uid);
        info!(
            kind = %C::KIND,
            uid = %uid,
            status = %item.metadata().status(),
            version = %item.metadata().version(),
            versions,
            "saved library item"
        );
        Ok(())
    }

    fn find_by_uid(
        &self,
        uid: &Uid,
        selector: VersionSelector,
    ) -> Result<LibraryItem<C>, MdrError> {
        let key = CacheKey::new(C::KIND, uid.clone(), selector);
        if let Some(item) = self
            .cache
            .as_ref()
            .and_then(|cache| cache.get::<LibraryItem<C>>(&key))
        {
            return Ok(item);
        }

        let record = self.record(uid)?;
        let snapshot = record
            .snapshots
            .iter()
            .rev()
            .find(|s| selector.matches(&s.metadata))
            .ok_or_else(|| {
                MdrError::not_found_with(format!(
                    "{} with UID '{uid}' has no {selector}.",
                    C::KIND.label()
                ))
            })?;
        let item = Self::rebuild(record, snapshot);
        debug!(kind = %C::KIND, uid = %uid, selector = %selector, "loaded library item");

        if let Some(cache) = &self.cache {
            cache.insert(key, item.clone());
        }
        Ok(item)
    }

    fn get_all_versions(&self, uid: &Uid) -> Result<Vec<VersionSnapshot<C>>, MdrError> {
        let record = self.record(uid)?;
        Ok(record.snapshots.iter().rev().cloned().collect())
    }

    fn find_all(&self, filter: &ItemFilter) -> Vec<LibraryItem<C>> {
        self.items
            .values()
            .filter_map(|record| {
                let latest = record.latest()?;
                filter
                    .matches(&record.library.name, &latest.metadata)
                    .then(|| Self::rebuild(record, latest))
            })
            .collect()
    }

    fn retrieve_audit_trail(
        &self,
        page_number: usize,
        page_size: usize,
        total_count: bool,
    ) -> AuditPage<C> {
        let mut entries: Vec<(&Uid, &VersionSnapshot<C>)> = self
            .items
            .values()
            .flat_map(|record| record.snapshots.iter().map(move |s| (&record.uid, s)))
            .collect();
        entries.sort_by(|a, b| {
            b.1.metadata
                .start_date()
                .cmp(&a.1.metadata.start_date())
                .then_with(|| a.0.cmp(b.0))
        });
        let total = entries.len();

        let skip = if page_size == 0 {
            0
        } else {
            page_number.saturating_sub(1).saturating_mul(page_size)
        };
        let take = if page_size == 0 { total } else { page_size };
        let items = entries
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|(uid, snapshot)| AuditEntry {
                uid: uid.clone(),
                snapshot: snapshot.clone(),
            })
            .collect();

        AuditPage {
            items,
            total: total_count.then_some(total),
        }
    }

    fn exists(&self, uid: &Uid) -> bool {
        self.items.contains_key(uid)
    }

    fn is_final(&self, uid: &Uid) -> bool {
        self.items
            .get(uid)
            .and_then(ItemRecord::latest)
            .is_some_and(|s| s.metadata.status() == LibraryItemStatus::Final)
    }

    fn find_uid_by_name(&self, name: &str) -> Option<Uid> {
        self.items
            .values()
            .find(|record| record.latest().is_some_and(|s| s.concept.name() == name))
            .map(|record| record.uid.clone())
    }

    fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for latest in self.items.values().filter_map(ItemRecord::latest) {
            counts.record(latest.metadata.status());
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use mdr_model::{AuthorId, ConceptKind};
    use mdr_versioning::{NoReferences, ReferenceResolver};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Group(String);

    impl ConceptValue for Group {
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
        AuthorId::new("jdoe").unwrap()
    }

    fn new_item(name: &str) -> LibraryItem<Group> {
        LibraryItem::from_input_values(
            author(),
            Group(name.into()),
            Library::from_repository_values("Sponsor", true),
            || None,
            &NoReferences,
        )
        .unwrap()
    }

    #[test]
    fn save_assigns_uid_and_is_idempotent() {
        let mut repo = InMemoryRepository::<Group>::new();
        let mut item = new_item("Labs");
        repo.save(&mut item).unwrap();
        assert_eq!(item.uid().map(Uid::as_str), Some("ActivityGroup_000001"));

        item.approve(author(), None).unwrap();
        repo.save(&mut item).unwrap();
        repo.save(&mut item).unwrap();

        let uid = item.uid().cloned().unwrap();
        let versions = repo.get_all_versions(&uid).unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].metadata.version_string(), "1.0");
        assert!(versions[0].metadata.is_current());
        assert_eq!(versions[1].metadata.version_string(), "0.1");
        assert!(!versions[1].metadata.is_current());
    }

    #[test]
    fn find_by_uid_selectors() {
        let mut repo = InMemoryRepository::<Group>::new();
        let mut item = new_item("Labs");
        item.approve(author(), None).unwrap();
        item.create_new_version(author(), None).unwrap();
        item.edit_draft(author(), "rename", Group("Laboratory".into()), &NoReferences)
            .unwrap();
        repo.save(&mut item).unwrap();
        let uid = item.uid().cloned().unwrap();

        let latest = repo.find_by_uid(&uid, VersionSelector::Latest).unwrap();
        assert_eq!(latest.metadata().version_string(), "1.2");
        assert!(!latest.is_read_only());

        let released = repo
            .find_by_uid(&uid, VersionSelector::LatestWithStatus(LibraryItemStatus::Final))
            .unwrap();
        assert_eq!(released.metadata().version_string(), "1.0");
        assert_eq!(released.concept(), &Group("Labs".into()));
        assert!(released.is_read_only());

        let err = repo
            .find_by_uid(&uid, VersionSelector::LatestWithStatus(LibraryItemStatus::Retired))
            .unwrap_err();
        assert_eq!(err.status_code(), 404);

        let err = repo
            .find_by_uid(&Uid::from_counter("ActivityGroup", 99), VersionSelector::Latest)
            .unwrap_err();
        assert_eq!(
            err.message(),
            "Activity Group with UID 'ActivityGroup_000099' doesn't exist."
        );
    }

    #[test]
    fn stale_aggregate_is_rejected() {
        let mut repo = InMemoryRepository::<Group>::new();
        let mut item = new_item("Labs");
        repo.save(&mut item).unwrap();
        let uid = item.uid().cloned().unwrap();

        let mut first = repo.find_by_uid(&uid, VersionSelector::Latest).unwrap();
        let mut second = repo.find_by_uid(&uid, VersionSelector::Latest).unwrap();
        first.approve(author(), None).unwrap();
        repo.save(&mut first).unwrap();

        second
            .edit_draft(author(), "late", Group("Late".into()), &NoReferences)
            .unwrap();
        let err = repo.save(&mut second).unwrap_err();
        assert!(err.message().contains("modified since it was read"));
    }

    #[test]
    fn stale_delete_keeps_the_approved_item() {
        let mut repo = InMemoryRepository::<Group>::new();
        let mut item = new_item("Labs");
        repo.save(&mut item).unwrap();
        let uid = item.uid().cloned().unwrap();

        let mut writer = repo.find_by_uid(&uid, VersionSelector::Latest).unwrap();
        let mut stale = repo.find_by_uid(&uid, VersionSelector::Latest).unwrap();
        writer.approve(author(), None).unwrap();
        repo.save(&mut writer).unwrap();

        stale.soft_delete().unwrap();
        let err = repo.save(&mut stale).unwrap_err();
        assert!(err.message().contains("modified since it was read"));
        assert!(repo.is_final(&uid));
        assert_eq!(repo.get_all_versions(&uid).unwrap().len(), 2);
    }

    #[test]
    fn deleted_item_is_removed() {
        let mut repo = InMemoryRepository::<Group>::new();
        let mut item = new_item("Labs");
        repo.save(&mut item).unwrap();
        let uid = item.uid().cloned().unwrap();

        item.soft_delete().unwrap();
        repo.save(&mut item).unwrap();
        assert!(!repo.exists(&uid));
        assert!(repo.find_by_uid(&uid, VersionSelector::Latest).is_err());
    }

    #[test]
    fn read_only_items_cannot_be_saved() {
        let mut repo = InMemoryRepository::<Group>::new();
        let mut item = new_item("Labs");
        item.approve(author(), None).unwrap();
        repo.save(&mut item).unwrap();
        let uid = item.uid().cloned().unwrap();

        let mut old = repo
            .find_by_uid(&uid, VersionSelector::Version(Version::new(0, 1)))
            .unwrap();
        assert!(repo.save(&mut old).is_err());
    }

    #[test]
    fn listing_counts_and_names() {
        let mut repo = InMemoryRepository::<Group>::new();
        for name in ["A", "B", "C"] {
            let mut item = new_item(name);
            if name != "A" {
                item.approve(author(), None).unwrap();
            }
            if name == "C" {
                item.inactivate(author(), None).unwrap();
            }
            repo.save(&mut item).unwrap();
        }

        let counts = repo.status_counts();
        assert_eq!(
            (counts.count_draft, counts.count_final, counts.count_retired),
            (1, 1, 1)
        );
        assert_eq!(counts.count_total(), 3);

        let finals = repo.find_all(&ItemFilter::default().with_status(LibraryItemStatus::Final));
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].name(), "B");
        assert!(repo.find_all(&ItemFilter::default().with_library("CDISC")).is_empty());

        assert_eq!(
            repo.find_uid_by_name("C").map(|u| u.to_string()),
            Some("ActivityGroup_000003".to_string())
        );
        assert!(!repo.exists_by_name("D"));
        assert!(repo.is_final(&Uid::from_counter("ActivityGroup", 2)));
        assert!(!repo.is_final(&Uid::from_counter("ActivityGroup", 3)));
    }

    #[test]
    fn audit_trail_pages_newest_first() {
        let mut repo = InMemoryRepository::<Group>::new();
        let mut item = new_item("Labs");
        item.approve(author(), None).unwrap();
        item.create_new_version(author(), None).unwrap();
        repo.save(&mut item).unwrap();

        let all = repo.retrieve_audit_trail(1, 0, true);
        assert_eq!(all.total, Some(3));
        let versions: Vec<String> = all
            .items
            .iter()
            .map(|e| e.snapshot.metadata.version_string())
            .collect();
        assert_eq!(versions, vec!["1.1", "1.0", "0.1"]);

        let page = repo.retrieve_audit_trail(2, 2, false);
        assert_eq!(page.total, None);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].snapshot.metadata.version_string(), "0.1");
    }

    #[test]
    fn cache_is_used_and_invalidated_on_save() {
        let cache = ItemCache::shared(CacheConfig::default());
        let mut repo = InMemoryRepository::<Group>::new().with_cache(Arc::clone(&cache));
        let mut item = new_item("Labs");
        repo.save(&mut item).unwrap();
        let uid = item.uid().cloned().unwrap();

        repo.find_by_uid(&uid, VersionSelector::Latest).unwrap();
        repo.find_by_uid(&uid, VersionSelector::Latest).unwrap();
        assert_eq!(cache.stats().hits, 1);

        item.approve(author(), None).unwrap();
        repo.save(&mut item).unwrap();
        let fresh = repo.find_by_uid(&uid, VersionSelector::Latest).unwrap();
        assert_eq!(fresh.metadata().version_string(), "1.0");
    }

    #[test]
    fn state_round_trip_and_validation() {
        let mut repo = InMemoryRepository::<Group>::new();
        let mut item = new_item("Labs");
        item.approve(author(), None).unwrap();
        repo.save(&mut item).unwrap();

        let state = repo.to_state();
        assert_eq!(state.next_uid, 2);
        let restored = InMemoryRepository::from_state(state.clone()).unwrap();
        assert_eq!(restored.to_state(), state);
        assert_eq!(restored.generate_uid().as_str(), "ActivityGroup_000002");

        let mut broken = state;
        broken.items[0].snapshots.reverse();
        assert!(InMemoryRepository::from_state(broken).is_err());
    }

    #[test]
    fn state_without_items_loads_empty() {
        let state: RepositoryState<Group> = serde_json::from_str(r#"{"next_uid": 4}"#).unwrap();
        assert!(state.items.is_empty());
        let repo = InMemoryRepository::from_state(state).unwrap();
        assert!(repo.is_empty());
        assert_eq!(repo.generate_uid().as_str(), "ActivityGroup_000004");
    }
}
