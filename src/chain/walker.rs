//! Hash-Chain Walker
//!
//! Steps backward through a hash chain one game at a time, from a caller
//! supplied hash down to the epoch boundary. The walk is lazy and holds
//! only the current link, so callers can stop after a handful of games or
//! grind all the way to the terminal hash without buffering millions of
//! digests.

use super::epoch::Epoch;
use super::hash::GameHash;

/// Lazy backward iterator over one epoch's hash chain.
///
/// The first item is `(start_index, start_hash)` unchanged: the hash a
/// caller holds for game `n` *is* game `n`'s hash. Every later item is
/// derived from its predecessor via the epoch's hashing convention, with
/// indices strictly decreasing down to `epoch.boundary` inclusive. A start
/// index below the boundary yields nothing.
pub struct HashChainWalker<'a> {
    hash: GameHash,
    index: u64,
    epoch: &'a Epoch,
    exhausted: bool,
}

impl<'a> HashChainWalker<'a> {
    /// Create a walker starting at `(start_index, start_hash)`.
    pub fn new(start_hash: GameHash, start_index: u64, epoch: &'a Epoch) -> Self {
        Self {
            hash: start_hash,
            index: start_index,
            epoch,
            exhausted: start_index < epoch.boundary,
        }
    }
}

impl Iterator for HashChainWalker<'_> {
    type Item = (u64, GameHash);

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let item = (self.index, self.hash);

        if self.index == self.epoch.boundary {
            self.exhausted = true;
        } else {
            self.hash = self.epoch.convention.step(&self.hash);
            self.index -= 1;
        }

        Some(item)
    }
}
