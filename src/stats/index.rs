//! Sorted fingerprint index
//!
//! Fingerprints are kept in ascending numeric order. A similarity query only
//! compares against the few neighbours around the query's insertion point,
//! which catches near-duplicates that differ in low-order bits and misses
//! ones that differ in high-order bits.

use super::simhash::Fingerprint;

/// Entries inspected on each side of the insertion point
pub const NEIGHBOR_WINDOW: usize = 5;

/// Sorted set of page fingerprints
#[derive(Debug, Default, Clone)]
pub struct FingerprintIndex {
    entries: Vec<u64>,
}

impl FingerprintIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a neighbour lies within `threshold` bits of `fp`
    pub fn similar(&self, fp: Fingerprint, threshold: u32) -> bool {
        let pos = self.entries.partition_point(|&x| x < fp.0);
        let lo = pos.saturating_sub(NEIGHBOR_WINDOW);
        let hi = (pos + NEIGHBOR_WINDOW).min(self.entries.len());

        self.entries[lo..hi]
            .iter()
            .any(|&other| fp.hamming(Fingerprint(other)) <= threshold)
    }

    /// Inserts a fingerprint, keeping the index sorted
    pub fn insert(&mut self, fp: Fingerprint) {
        let pos = self.entries.partition_point(|&x| x < fp.0);
        self.entries.insert(pos, fp.0);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
