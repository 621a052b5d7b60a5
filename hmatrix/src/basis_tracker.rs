//! Shared-basis trackers
//!
//! Two tracking concerns exist, with different keys:
//!
//! - during shared-basis construction, the canonical column basis of a
//!   block row (resp. row basis of a block column) is cached under its
//!   [IndexRange] so every admissible block in that row reuses it;
//! - during a Hierarchical copy, each source buffer (identified by its
//!   data pointer and extent) is copied once, so bases shared in the
//!   source stay shared in the copy.
//!
//! Trackers are cleared at phase boundaries: end of construction, end of
//! copy, and on abort of a composite operation.

use crate::cluster::IndexRange;
use crate::dense::Dense;
use std::collections::HashMap;

/// Content-addressable store of canonical bases.
pub struct BasisTracker<K: std::hash::Hash + Eq> {
    bases: HashMap<K, Dense>,
}

impl<K: std::hash::Hash + Eq> BasisTracker<K> {
    pub fn new() -> Self {
        BasisTracker {
            bases: HashMap::new(),
        }
    }

    pub fn has_basis(&self, key: &K) -> bool {
        self.bases.contains_key(key)
    }

    /// Shared handle onto the tracked basis.
    pub fn get(&self, key: &K) -> &Dense {
        &self.bases[key]
    }

    pub fn insert(&mut self, key: K, basis: Dense) {
        self.bases.insert(key, basis);
    }

    pub fn clear(&mut self) {
        self.bases.clear();
    }
}

impl<K: std::hash::Hash + Eq> Default for BasisTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a basis buffer: first-element address plus extent. The
/// tracked handle keeps the buffer alive, so the address stays valid for
/// the tracker's lifetime.
pub type BasisKey = (usize, usize, usize);

pub fn basis_key(a: &Dense) -> BasisKey {
    a.buffer_key()
}

/// Tracker used by sharing-preserving Hierarchical copies.
pub type CopyTracker = BasisTracker<BasisKey>;

/// Copy `a` through the tracker: the first occurrence of a buffer is
/// deep-copied, later occurrences share that copy.
pub fn tracked_dense_copy(a: &Dense, tracker: &mut CopyTracker) -> Dense {
    let key = basis_key(a);
    if !tracker.has_basis(&key) {
        tracker.insert(key, a.clone());
    }
    tracker.get(&key).share()
}

/// Replace a shared basis with a private deep copy so it can be mutated
/// without touching its other holders.
pub fn decouple_basis(basis: &mut Dense) {
    if basis.is_shared() {
        *basis = basis.clone();
    }
}

pub type RangeTracker = BasisTracker<IndexRange>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_copies_stay_shared() {
        let a = Dense::new(4, 2);
        let b = a.share();
        let mut tracker = CopyTracker::new();
        let ca = tracked_dense_copy(&a, &mut tracker);
        let cb = tracked_dense_copy(&b, &mut tracker);
        assert!(ca.is_shared_with(&cb));
        assert!(!ca.is_shared_with(&a));
    }

    #[test]
    fn decouple_detaches_shared_handles() {
        let a = Dense::new(3, 3);
        let mut b = a.share();
        decouple_basis(&mut b);
        assert!(!b.is_shared_with(&a));
        let mut lone = Dense::new(2, 2);
        let key = basis_key(&lone);
        decouple_basis(&mut lone);
        assert_eq!(basis_key(&lone), key);
    }
}
