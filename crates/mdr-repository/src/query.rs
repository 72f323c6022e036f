//! Query vocabulary shared by repositories and the item cache.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use mdr_model::{ItemMetadata, LibraryItemStatus, Uid, Version};
use mdr_versioning::VersionSnapshot;

/// Which version of an item a lookup returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VersionSelector {
    /// The current version.
    #[default]
    Latest,
    /// The most recent snapshot carrying this version number.
    Version(Version),
    /// The most recent snapshot with this status.
    LatestWithStatus(LibraryItemStatus),
    /// The snapshot effective at this instant.
    AtDate(DateTime<Utc>),
}

impl VersionSelector {
    pub fn matches(&self, metadata: &ItemMetadata) -> bool {
        match self {
            Self::Latest => metadata.is_current(),
            Self::Version(version) => metadata.version() == *version,
            Self::LatestWithStatus(status) => metadata.status() == *status,
            Self::AtDate(at) => {
                metadata.start_date() <= *at && metadata.end_date().is_none_or(|end| end > *at)
            }
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Version(version) => write!(f, "version {version}"),
            Self::LatestWithStatus(status) => write!(f, "latest {status}"),
            Self::AtDate(at) => write!(f, "at {}", at.to_rfc3339()),
        }
    }
}

/// Filter for listing the latest version of every item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub status: Option<LibraryItemStatus>,
    pub library: Option<String>,
}

impl ItemFilter {
    pub fn with_status(mut self, status: LibraryItemStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    pub fn matches(&self, library: &str, metadata: &ItemMetadata) -> bool {
        self.status.is_none_or(|s| s == metadata.status())
            && self.library.as_deref().is_none_or(|l| l == library)
    }
}

/// One snapshot in the audit trail of a repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry<C> {
    pub uid: Uid,
    #[serde(flatten)]
    pub snapshot: VersionSnapshot<C>,
}

/// A page of the audit trail, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditPage<C> {
    pub items: Vec<AuditEntry<C>>,
    /// Total number of snapshots, when requested.
    pub total: Option<usize>,
}

/// Number of items per status of their latest version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub count_draft: usize,
    pub count_final: usize,
    pub count_retired: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: LibraryItemStatus) {
        match status {
            LibraryItemStatus::Draft => self.count_draft += 1,
            LibraryItemStatus::Final => self.count_final += 1,
            LibraryItemStatus::Retired => self.count_retired += 1,
        }
    }

    pub fn count_total(&self) -> usize {
        self.count_draft + self.count_final + self.count_retired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mdr_model::AuthorId;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn closed(status: LibraryItemStatus, major: u32, minor: u32) -> ItemMetadata {
        ItemMetadata::from_repository_values(
            status,
            Version::new(major, minor),
            AuthorId::new("jdoe").unwrap(),
            "x",
            at(10),
            Some(at(20)),
        )
        .unwrap()
    }

    #[test]
    fn selector_matching() {
        let metadata = closed(LibraryItemStatus::Final, 1, 0);
        assert!(!VersionSelector::Latest.matches(&metadata));
        assert!(VersionSelector::Version(Version::new(1, 0)).matches(&metadata));
        assert!(VersionSelector::LatestWithStatus(LibraryItemStatus::Final).matches(&metadata));
        assert!(VersionSelector::AtDate(at(10)).matches(&metadata));
        assert!(VersionSelector::AtDate(at(15)).matches(&metadata));
        assert!(!VersionSelector::AtDate(at(20)).matches(&metadata));
        assert!(!VersionSelector::AtDate(at(5)).matches(&metadata));
    }

    #[test]
    fn filter_matching() {
        let metadata = closed(LibraryItemStatus::Draft, 0, 2);
        assert!(ItemFilter::default().matches("Sponsor", &metadata));
        assert!(
            ItemFilter::default()
                .with_status(LibraryItemStatus::Draft)
                .with_library("Sponsor")
                .matches("Sponsor", &metadata)
        );
        assert!(
            !ItemFilter::default()
                .with_library("CDISC")
                .matches("Sponsor", &metadata)
        );
    }

    #[test]
    fn selector_display() {
        assert_eq!(VersionSelector::Latest.to_string(), "latest");
        assert_eq!(
            VersionSelector::Version(Version::new(2, 1)).to_string(),
            "version 2.1"
        );
        assert_eq!(
            VersionSelector::LatestWithStatus(LibraryItemStatus::Retired).to_string(),
            "latest Retired"
        );
    }
}
