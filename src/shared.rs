//! Snapshot publication for a trie that may be rebuilt while it is being read.
//!
//! A [`Trie`] is never mutated once shared. To change the index, build a new
//! trie privately and [`SharedIndex::publish`] it; readers holding an older
//! snapshot keep using it until they drop it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::{NodeRef, Trie};

pub struct SharedIndex {
    current: RwLock<Arc<Trie>>,
    generation: AtomicU64,
}

impl SharedIndex {
    pub fn new(trie: Trie) -> Self {
        Self {
            current: RwLock::new(Arc::new(trie)),
            generation: AtomicU64::new(0),
        }
    }

    /// The latest published trie. The read lock is held only for the clone.
    pub fn snapshot(&self) -> Arc<Trie> {
        Arc::clone(&*self.current.read())
    }

    /// Replaces the published trie and returns the previous one.
    pub fn publish(&self, trie: Trie) -> Arc<Trie> {
        let next = Arc::new(trie);
        let previous = {
            let mut current = self.current.write();
            std::mem::replace(&mut *current, next)
        };
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(generation, "published query index");
        previous
    }

    /// Number of publishes since construction.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Runs `f` against the node for `prefix` in the current snapshot.
    pub fn with_lookup<R>(&self, prefix: &str, f: impl FnOnce(Option<NodeRef<'_>>) -> R) -> R {
        let snapshot = self.snapshot();
        f(snapshot.lookup_prefix(prefix))
    }
}

impl Default for SharedIndex {
    fn default() -> Self {
        Self::new(Trie::new())
    }
}
