//! Versioning metadata of a single library item snapshot.
//!
//! An item's history is an append-only sequence of [`ItemMetadata`]
//! snapshots. Exactly one of them, the current one, has no `end_date`;
//! every transition closes it and appends a successor.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuthorId, LibraryItemStatus, MdrError, Version};

/// Default change descriptions recorded by lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeLabel {
    Initial,
    NewDraft,
    Approved,
    Inactivated,
    Reactivated,
}

impl ChangeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeLabel::Initial => "Initial version",
            ChangeLabel::NewDraft => "New draft created",
            ChangeLabel::Approved => "Approved version",
            ChangeLabel::Inactivated => "Inactivated version",
            ChangeLabel::Reactivated => "Reactivated version",
        }
    }
}

/// Status, version and authorship of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    status: LibraryItemStatus,
    version: Version,
    author_id: AuthorId,
    change_description: String,
    start_date: DateTime<Utc>,
    #[serde(default)]
    end_date: Option<DateTime<Utc>>,
}

impl ItemMetadata {
    /// Metadata of a newly created draft: DRAFT 0.1.
    pub fn initial(author_id: AuthorId, start_date: Option<DateTime<Utc>>) -> Self {
        Self::initial_with(
            LibraryItemStatus::Draft,
            Version::INITIAL_DRAFT,
            author_id,
            start_date,
        )
    }

    /// Initial metadata for versioning schemes that do not start as a draft.
    pub fn initial_with(
        status: LibraryItemStatus,
        version: Version,
        author_id: AuthorId,
        start_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            status,
            version,
            author_id,
            change_description: ChangeLabel::Initial.as_str().to_string(),
            start_date: start_date.unwrap_or_else(Utc::now),
            end_date: None,
        }
    }

    /// Rebuilds metadata read back from storage, rejecting impossible tuples.
    pub fn from_repository_values(
        status: LibraryItemStatus,
        version: Version,
        author_id: AuthorId,
        change_description: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Self, MdrError> {
        if version == Version::new(0, 0) {
            return Err(MdrError::invalid_value("item metadata", "version", version));
        }
        let is_draft = status == LibraryItemStatus::Draft;
        if is_draft == version.is_round() {
            return Err(MdrError::validation(format!(
                "Version {version} is not valid for status {status}."
            )));
        }
        if let Some(end) = end_date
            && end < start_date
        {
            return Err(MdrError::validation(format!(
                "End date {end} precedes start date {start_date}."
            )));
        }
        Ok(Self {
            status,
            version,
            author_id,
            change_description: change_description.into(),
            start_date,
            end_date,
        })
    }

    pub fn status(&self) -> LibraryItemStatus {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn major_version(&self) -> u32 {
        self.version.major
    }

    pub fn minor_version(&self) -> u32 {
        self.version.minor
    }

    /// Rendered `"{major}.{minor}"` form.
    pub fn version_string(&self) -> String {
        self.version.to_string()
    }

    pub fn author_id(&self) -> &AuthorId {
        &self.author_id
    }

    pub fn change_description(&self) -> &str {
        &self.change_description
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    /// True while this snapshot is the effective one.
    pub fn is_current(&self) -> bool {
        self.end_date.is_none()
    }

    /// Builds the snapshot that supersedes this one.
    ///
    /// Start dates strictly increase along the history, so the successor
    /// starts at `now` or one microsecond after this snapshot, whichever is later.
    #[must_use]
    pub fn successor(
        &self,
        status: LibraryItemStatus,
        version: Version,
        author_id: AuthorId,
        change_description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let earliest = self.start_date + Duration::microseconds(1);
        Self {
            status,
            version,
            author_id,
            change_description: change_description.into(),
            start_date: now.max(earliest),
            end_date: None,
        }
    }

    /// Returns this snapshot closed at `end_date`.
    #[must_use]
    pub fn closed_at(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }
}
