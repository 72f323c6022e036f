//! Core types for the clinical metadata repository (MDR).
//!
//! Every library item (CT term names, activity groupings, syntax templates,
//! sponsor models, ...) shares the same versioning vocabulary: a status, a
//! `major.minor` version, and an append-only sequence of [`ItemMetadata`]
//! snapshots that doubles as the audit trail.

pub mod enums;
pub mod error;
pub mod ids;
pub mod library;
pub mod metadata;
pub mod version;

pub use enums::{ConceptKind, LibraryItemStatus, ObjectAction};
pub use error::{ErrorKind, MdrError, Result};
pub use ids::{AuthorId, Uid};
pub use library::Library;
pub use metadata::{ChangeLabel, ItemMetadata};
pub use version::Version;
