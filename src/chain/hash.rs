//! Game Hash Type
//!
//! A game hash is a 32-byte SHA-256 digest identifying one game's outcome
//! seed. Hashes arrive from callers as 64-character hex strings and are
//! derived from each other by rehashing (see `walker`).

use sha2::{Digest, Sha256};

/// Hash output type (256 bits / 32 bytes)
pub type GameHash = [u8; 32];

/// Compute the SHA-256 digest of arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> GameHash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Parse a 64-character hex string into a [`GameHash`].
///
/// Returns `None` if the string is not valid hex or does not decode to
/// exactly 32 bytes.
pub fn parse_game_hash(s: &str) -> Option<GameHash> {
    let bytes = hex::decode(s).ok()?;
    bytes.try_into().ok()
}
