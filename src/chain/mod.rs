//! Hash-chain primitives.
//!
//! A crash game's outcomes are committed to in advance as a chain of SHA-256
//! digests: each game's hash is the hash of its successor, and the chain's
//! final element was published before any game was played. These modules
//! cover the hash type itself, the two epoch descriptors (the chain was
//! re-seeded once, with different hashing rules on each side of the cut),
//! and the walker that steps backward through the chain.

pub mod epoch;
pub mod hash;
pub mod walker;

// Re-export chain types
pub use epoch::{Epoch, EpochSchedule, HashingConvention, SeedSource};
pub use hash::{hash_bytes, parse_game_hash, GameHash};
pub use walker::HashChainWalker;
