//! Chain Epochs
//!
//! The game's hash chain was seeded twice. Games before the re-seeding
//! event belong to the legacy chain, which hashed the *hex text* of each
//! digest and salted every game with one fixed secret. Games from the
//! re-seeding onward belong to the current chain, which hashes the raw
//! digest bytes and salts each game with a per-game Vx oracle signature.
//!
//! An [`Epoch`] bundles everything that differs between the two chains;
//! [`EpochSchedule`] picks the epoch governing a given game number. Both
//! are fixed at construction and never change during a run.

use super::hash::{hash_bytes, GameHash};

/// How one chain link is derived from its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashingConvention {
    /// SHA-256 over the successor's raw 32-byte digest (current chain).
    Binary,
    /// SHA-256 over the successor's lowercase hex text (legacy chain).
    HexText,
}

impl HashingConvention {
    /// Derive the previous game's hash from `hash`.
    pub fn step(&self, hash: &GameHash) -> GameHash {
        match self {
            HashingConvention::Binary => hash_bytes(hash),
            HashingConvention::HexText => hash_bytes(hex::encode(hash).as_bytes()),
        }
    }
}

/// Where the per-game randomness seed comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    /// One Vx attestation per game; its signature bytes are the seed.
    /// `client_seed` is the public salt mixed into the attested message.
    Oracle {
        /// Public client seed committed to at the seeding event.
        client_seed: String,
    },
    /// A fixed salt; its ASCII bytes seed every game in the epoch.
    /// Games seeded this way can never be oracle-verified.
    Static {
        /// Public salt committed to at the seeding event.
        salt: String,
    },
}

/// Immutable descriptor of one chain epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Epoch {
    /// First game index belonging to this epoch.
    pub boundary: u64,
    /// How hashes are derived within this epoch.
    pub convention: HashingConvention,
    /// Per-game seed source for this epoch.
    pub seed: SeedSource,
    /// Published terminal hash a full walk must reproduce.
    pub commitment: GameHash,
}

/// The two epochs and the rule for selecting between them.
///
/// Selection is a pure function of the game number against the current
/// epoch's boundary: the boundary game itself is the first game of the
/// current chain.
#[derive(Debug, Clone)]
pub struct EpochSchedule {
    legacy: Epoch,
    current: Epoch,
}

impl EpochSchedule {
    /// Build a schedule from the two epoch descriptors.
    pub fn new(legacy: Epoch, current: Epoch) -> Self {
        Self { legacy, current }
    }

    /// The epoch governing `game_number`.
    pub fn epoch_for(&self, game_number: u64) -> &Epoch {
        if game_number >= self.current.boundary {
            &self.current
        } else {
            &self.legacy
        }
    }

    /// The legacy epoch.
    pub fn legacy(&self) -> &Epoch {
        &self.legacy
    }

    /// The current epoch.
    pub fn current(&self) -> &Epoch {
        &self.current
    }
}
