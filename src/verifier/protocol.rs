//! Engine Protocol
//!
//! Requests into the engine and events streamed back out. Events are
//! tagged JSON objects so a consumer can match on `type` without
//! guessing at the payload shape.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::hash::{parse_game_hash, GameHash};

/// Upper bound on results one run may produce.
pub const MAX_ITERATIONS: u64 = 1000;

/// A verification request as submitted by a caller.
///
/// Fields arrive untrusted and are checked by [`VerificationRequest::validate`]
/// before the engine does any work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRequest {
    /// Hex hash of the game to start from.
    pub game_hash: String,
    /// Number of the game `game_hash` belongs to.
    pub game_number: u64,
    /// How many games to verify, walking backward from `game_number`.
    pub iterations: u64,
    /// Continue the walk past the verified games all the way to the
    /// epoch boundary and report the terminating hash.
    pub verify_chain: bool,
}

/// Rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The game hash did not decode to 32 bytes.
    #[error("game hash must be 64 hex characters")]
    InvalidGameHash,
    /// Game numbering starts at 1.
    #[error("game number must be at least 1")]
    InvalidGameNumber,
    /// Iteration count outside the accepted range.
    #[error("iterations must be between 1 and {MAX_ITERATIONS}")]
    InvalidIterations,
}

/// A request that has passed validation, with the hash decoded.
#[derive(Debug, Clone)]
pub(crate) struct ValidRequest {
    pub start_hash: GameHash,
    pub game_number: u64,
    pub iterations: u64,
    pub verify_chain: bool,
}

impl VerificationRequest {
    /// Check the request and decode the game hash.
    pub(crate) fn validate(&self) -> Result<ValidRequest, RequestError> {
        let start_hash = parse_game_hash(&self.game_hash).ok_or(RequestError::InvalidGameHash)?;
        if self.game_number == 0 {
            return Err(RequestError::InvalidGameNumber);
        }
        if !(1..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(RequestError::InvalidIterations);
        }
        Ok(ValidRequest {
            start_hash,
            game_number: self.game_number,
            iterations: self.iterations,
            verify_chain: self.verify_chain,
        })
    }
}

/// One verified game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    /// Game number.
    pub id: u64,
    /// Crash multiplier, e.g. `1.98`.
    pub crash_point: f64,
    /// Whether the oracle attestation for this game checked out.
    /// Always `false` for games seeded from the static salt era.
    pub verified: bool,
    /// Hex hash of this game.
    pub hash: String,
}

/// Events streamed from a verification run, in order: zero or more
/// `Result`s, then `Done`, then either `TerminatingHash` or `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VerifierEvent {
    /// One game's outcome.
    Result(GameResult),
    /// The per-game portion of the run finished.
    Done,
    /// The hash reached at the epoch boundary after continuing the walk.
    TerminatingHash {
        /// Hex hash at the boundary game.
        hash: String,
    },
    /// The run could not complete; no terminating hash will follow.
    Failed,
}
