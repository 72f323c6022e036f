//! Versioning state machine shared by every library item.
//!
//! - [`strategy`] computes the next status and version for a transition and
//!   answers the possible-actions query. The standard scheme walks
//!   DRAFT 0.1 → FINAL 1.0 → DRAFT 1.1 → FINAL 2.0; the single-major scheme
//!   has no drafts at all.
//! - [`concept`] is the contract for the immutable payload of an item and the
//!   capability used to check references and uniqueness.
//! - [`item`] is the aggregate root orchestrating both.
//!
//! The state machine is synchronous and performs no locking; callers must
//! serialize read-modify-write cycles per uid.

pub mod concept;
pub mod item;
pub mod strategy;

pub use concept::{
    ConceptValue, NoReferences, ReferenceResolver, ensure_reference, ensure_unique_name,
};
pub use item::{LibraryItem, VersionSnapshot};
pub use strategy::{
    ItemState, SingleMajorVersioning, StandardVersioning, VersioningStrategy, possible_actions,
};
