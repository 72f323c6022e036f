use std::sync::atomic::{AtomicU64, Ordering};

use mdr_model::{ConceptKind, Uid};

/// Allocates `{Prefix}_{counter:06}` uids for one concept kind.
///
/// Allocation takes `&self` so that a uid can be drawn while the owning
/// repository is also borrowed for reference checks.
#[derive(Debug)]
pub struct UidGenerator {
    prefix: &'static str,
    next: AtomicU64,
}

impl UidGenerator {
    pub fn new(kind: ConceptKind) -> Self {
        Self::starting_at(kind, 1)
    }

    pub fn starting_at(kind: ConceptKind, next: u64) -> Self {
        Self {
            prefix: kind.uid_prefix(),
            next: AtomicU64::new(next.max(1)),
        }
    }

    pub fn next_uid(&self) -> Uid {
        let counter = self.next.fetch_add(1, Ordering::Relaxed);
        Uid::from_counter(self.prefix, counter)
    }

    /// Counter value the next allocation will use.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
