//! Version transition strategies.
//!
//! A [`VersioningStrategy`] is a pure function of the current `(status, version)`
//! pair and the requested [`ObjectAction`]. Strategies are selected per concept
//! kind when an item is constructed and never change afterwards.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use mdr_model::{LibraryItemStatus, MdrError, ObjectAction, Version};

/// The part of an item's metadata a strategy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemState {
    pub status: LibraryItemStatus,
    pub version: Version,
}

impl ItemState {
    pub const fn new(status: LibraryItemStatus, version: Version) -> Self {
        Self { status, version }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.version)
    }
}

/// Computes status and version changes for lifecycle actions.
pub trait VersioningStrategy: fmt::Debug + Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// State of a newly created item.
    fn initial_state(&self) -> ItemState;

    /// Actions that are legal from `current`.
    fn possible_actions(&self, current: ItemState) -> BTreeSet<ObjectAction>;

    /// Status after `action`. Only meaningful for legal actions.
    fn next_status(&self, current: ItemState, action: ObjectAction) -> LibraryItemStatus;

    /// Version after `action`. Only meaningful for legal actions.
    ///
    /// Fails when the version number that would change is already at its limit.
    fn next_version(&self, current: ItemState, action: ObjectAction) -> Result<Version, MdrError>;

    /// Error reported when `action` is not legal from `current`.
    fn illegal_transition(&self, current: ItemState, action: ObjectAction) -> MdrError {
        illegal_transition_error(current, action)
    }

    /// Checks legality and computes the resulting state.
    ///
    /// `Delete` leaves the state unchanged; removing the item is up to the caller.
    fn transition(&self, current: ItemState, action: ObjectAction) -> Result<ItemState, MdrError> {
        if !self.possible_actions(current).contains(&action) {
            return Err(self.illegal_transition(current, action));
        }
        Ok(ItemState::new(
            self.next_status(current, action),
            self.next_version(current, action)?,
        ))
    }
}

fn version_exhausted(current: ItemState, action: ObjectAction) -> MdrError {
    MdrError::validation(format!(
        "Version {} cannot be advanced by '{action}'.",
        current.version
    ))
}

/// Possible actions under the standard scheme, a pure function of status and major version.
pub fn possible_actions(status: LibraryItemStatus, major_version: u32) -> BTreeSet<ObjectAction> {
    let actions: &[ObjectAction] = match status {
        LibraryItemStatus::Draft if major_version == 0 => &[
            ObjectAction::Approve,
            ObjectAction::Edit,
            ObjectAction::Delete,
        ],
        LibraryItemStatus::Draft => &[ObjectAction::Approve, ObjectAction::Edit],
        LibraryItemStatus::Final => &[ObjectAction::NewVersion, ObjectAction::Inactivate],
        LibraryItemStatus::Retired => &[ObjectAction::Reactivate],
    };
    actions.iter().copied().collect()
}

fn illegal_transition_error(current: ItemState, action: ObjectAction) -> MdrError {
    match action {
        ObjectAction::Approve => MdrError::versioning_with(
            "Only DRAFT version can be approved.",
            "invalid_status_non_draft",
            403,
        ),
        ObjectAction::NewVersion => MdrError::versioning_with(
            "New draft version can be created only for FINAL versions.",
            "invalid_status_non_final",
            403,
        ),
        ObjectAction::Edit => MdrError::versioning("The object is not in draft status."),
        ObjectAction::Inactivate => MdrError::versioning("Only FINAL version can be inactivated."),
        ObjectAction::Reactivate => {
            MdrError::versioning("Only RETIRED version can be reactivated.")
        }
        ObjectAction::Delete if current.version.is_released() => {
            MdrError::versioning("Object has been accepted")
        }
        ObjectAction::Delete => MdrError::versioning("Only DRAFT version can be deleted."),
    }
}

/// DRAFT/FINAL/RETIRED scheme with major and minor versions.
///
/// | action      | from    | to      | version          |
/// |-------------|---------|---------|------------------|
/// | create      | -       | DRAFT   | 0.1              |
/// | approve     | DRAFT   | FINAL   | (major + 1).0    |
/// | edit        | DRAFT   | DRAFT   | major.(minor + 1)|
/// | new version | FINAL   | DRAFT   | major.(minor + 1)|
/// | inactivate  | FINAL   | RETIRED | unchanged        |
/// | reactivate  | RETIRED | FINAL   | unchanged        |
/// | delete      | DRAFT 0.x | -     | -                |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardVersioning;

impl VersioningStrategy for StandardVersioning {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn initial_state(&self) -> ItemState {
        ItemState::new(LibraryItemStatus::Draft, Version::INITIAL_DRAFT)
    }

    fn possible_actions(&self, current: ItemState) -> BTreeSet<ObjectAction> {
        possible_actions(current.status, current.version.major)
    }

    fn next_status(&self, current: ItemState, action: ObjectAction) -> LibraryItemStatus {
        match action {
            ObjectAction::Approve | ObjectAction::Reactivate => LibraryItemStatus::Final,
            ObjectAction::Edit | ObjectAction::NewVersion => LibraryItemStatus::Draft,
            ObjectAction::Inactivate => LibraryItemStatus::Retired,
            ObjectAction::Delete => current.status,
        }
    }

    fn next_version(&self, current: ItemState, action: ObjectAction) -> Result<Version, MdrError> {
        let next = match action {
            ObjectAction::Approve => current.version.next_major(),
            ObjectAction::Edit | ObjectAction::NewVersion => current.version.next_minor(),
            ObjectAction::Inactivate | ObjectAction::Reactivate | ObjectAction::Delete => {
                Some(current.version)
            }
        };
        next.ok_or_else(|| version_exhausted(current, action))
    }
}

/// Scheme without a minor version: every version is released as FINAL.
///
/// Used by model-style concepts (sponsor models) whose versions are cut as a
/// whole. Creation yields FINAL 1.0, a new version yields FINAL (major + 1).0,
/// and there is nothing to approve, edit or delete.
///
/// The minor number is always 0. A new version bumps the major number so that
/// successive releases stay distinct in the stored history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleMajorVersioning;

impl VersioningStrategy for SingleMajorVersioning {
    fn name(&self) -> &'static str {
        "single-major"
    }

    fn initial_state(&self) -> ItemState {
        ItemState::new(LibraryItemStatus::Final, Version::new(1, 0))
    }

    fn possible_actions(&self, current: ItemState) -> BTreeSet<ObjectAction> {
        let actions: &[ObjectAction] = match current.status {
            LibraryItemStatus::Final => &[ObjectAction::NewVersion, ObjectAction::Inactivate],
            LibraryItemStatus::Retired => &[ObjectAction::Reactivate],
            LibraryItemStatus::Draft => &[],
        };
        actions.iter().copied().collect()
    }

    fn next_status(&self, current: ItemState, action: ObjectAction) -> LibraryItemStatus {
        match action {
            ObjectAction::NewVersion | ObjectAction::Reactivate => LibraryItemStatus::Final,
            ObjectAction::Inactivate => LibraryItemStatus::Retired,
            ObjectAction::Approve | ObjectAction::Edit | ObjectAction::Delete => current.status,
        }
    }

    fn next_version(&self, current: ItemState, action: ObjectAction) -> Result<Version, MdrError> {
        let major = current.version.major;
        let next = match action {
            ObjectAction::NewVersion => current.version.next_major(),
            ObjectAction::Inactivate
            | ObjectAction::Reactivate
            | ObjectAction::Approve
            | ObjectAction::Edit
            | ObjectAction::Delete => Some(Version::new(major, 0)),
        };
        next.ok_or_else(|| version_exhausted(current, action))
    }

    fn illegal_transition(&self, current: ItemState, action: ObjectAction) -> MdrError {
        match action {
            ObjectAction::Approve | ObjectAction::Edit | ObjectAction::Delete => {
                MdrError::versioning(format!(
                    "Action '{action}' is not available for items without draft versions."
                ))
            }
            _ => illegal_transition_error(current, action),
        }
    }
}
