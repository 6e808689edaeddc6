//! 64-bit simhash fingerprints
//!
//! Each distinct word is hashed once with SHA-256 and weighted by how often
//! it occurs, so two pages with nearly the same word multiset end up a few
//! bit flips apart.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

/// Number of bits in a fingerprint
pub const FINGERPRINT_BITS: u32 = 64;

/// A 64-bit simhash of a page's words
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Number of differing bits between two fingerprints
    ///
    /// ```
    /// use sieve_crawler::Fingerprint;
    ///
    /// assert_eq!(Fingerprint(0b1011).hamming(Fingerprint(0b0001)), 2);
    /// ```
    pub fn hamming(self, other: Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    pub fn bits(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Stable 64-bit hash of a word: the first 8 bytes of its SHA-256, little-endian
pub fn word_hash(word: &str) -> u64 {
    let digest = Sha256::digest(word.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Computes the simhash of a word sequence
///
/// For every bit position the weights of words whose hash has that bit set
/// are added and the others subtracted; the fingerprint bit is set when the
/// total is non-negative. An empty sequence therefore yields all ones.
pub fn compute_fingerprint<S: AsRef<str>>(words: &[S]) -> Fingerprint {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for word in words {
        *counts.entry(word.as_ref()).or_insert(0) += 1;
    }

    let mut sums = [0i64; FINGERPRINT_BITS as usize];
    for (word, count) in counts {
        let hash = word_hash(word);
        for (bit, sum) in sums.iter_mut().enumerate() {
            if hash >> bit & 1 == 1 {
                *sum += count;
            } else {
                *sum -= count;
            }
        }
    }

    let bits = sums
        .iter()
        .enumerate()
        .filter(|(_, sum)| **sum >= 0)
        .fold(0u64, |acc, (bit, _)| acc | 1 << bit);
    Fingerprint(bits)
}
