//! Crash-Point Derivation
//!
//! Maps a `(seed, game hash)` pair to the multiplier at which the game
//! crashed. The seed is the Vx signature for current-chain games and the
//! fixed legacy salt's ASCII bytes for legacy-chain games; either way the
//! derivation is a pure function, so anyone can recompute a game's
//! outcome from public data.
//!
//! The house edge lives in the `99 / (1 - X)` term: one game in a hundred
//! busts instantly at 1.00x.

use sha2::{Digest, Sha256};

use crate::chain::hash::GameHash;

/// Bits of the HMAC digest that drive the outcome.
const N_BITS: u32 = 52;

/// Derive the crash point for one game.
///
/// Computes `HMAC-SHA256(key = game_hash, message = seed)`, takes the top
/// 52 bits as a uniform `X` in `[0, 1)`, and returns
/// `max(1.00, floor(99 / (1 - X)) / 100)`.
pub fn crash_point(seed: &[u8], game_hash: &GameHash) -> f64 {
    let digest = hmac_sha256(game_hash, seed);

    // Top 52 bits = the first 13 hex characters of the digest.
    let mut r: u64 = 0;
    for &byte in &digest[..7] {
        r = (r << 8) | u64::from(byte);
    }
    r >>= 56 - N_BITS;

    let x = r as f64 / (1u64 << N_BITS) as f64;
    let result = (99.0 / (1.0 - x)).floor();
    (result / 100.0).max(1.0)
}

fn hmac_sha256(secret: &[u8], message: &[u8]) -> [u8; 32] {
    const BLOCK_SIZE: usize = 64;
    let mut key_block = [0u8; BLOCK_SIZE];
    if secret.len() > BLOCK_SIZE {
        let digest = Sha256::digest(secret);
        key_block[..digest.len()].copy_from_slice(&digest);
    } else {
        key_block[..secret.len()].copy_from_slice(secret);
    }

    let mut o_key_pad = [0u8; BLOCK_SIZE];
    let mut i_key_pad = [0u8; BLOCK_SIZE];
    for i in 0..BLOCK_SIZE {
        o_key_pad[i] = key_block[i] ^ 0x5c;
        i_key_pad[i] = key_block[i] ^ 0x36;
    }

    let mut inner = Sha256::new();
    inner.update(i_key_pad);
    inner.update(message);
    let inner_hash = inner.finalize();

    let mut outer = Sha256::new();
    outer.update(o_key_pad);
    outer.update(inner_hash);
    outer.finalize().into()
}
