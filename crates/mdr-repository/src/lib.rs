//! Persistence for library items.
//!
//! - [`repository`]: the [`LibraryItemRepository`] contract and an in-memory
//!   implementation keeping the full version history of every item.
//! - [`cache`]: a caller-owned, TTL and capacity bounded lookup cache.
//! - [`catalog`]: one repository per concept kind plus libraries and external
//!   references; implements [`mdr_versioning::ReferenceResolver`].
//! - [`store`]: the JSON store file with atomic save.
//!
//! Repositories are not synchronized. Callers serialize read-modify-write
//! cycles per uid; a save built from a stale read is rejected.

pub mod cache;
pub mod catalog;
mod error;
pub mod query;
pub mod repository;
pub mod store;
mod uid;

pub use cache::{CacheConfig, CacheKey, CacheStats, ItemCache};
pub use catalog::{Catalog, HasRepository, ReferenceRecord};
pub use error::{Result, StoreError};
pub use query::{AuditEntry, AuditPage, ItemFilter, StatusCounts, VersionSelector};
pub use repository::{InMemoryRepository, ItemRecord, LibraryItemRepository, RepositoryState};
pub use store::{CURRENT_SCHEMA_VERSION, STORE_FORMAT, StoreFile, load_store, save_store};
pub use uid::UidGenerator;
