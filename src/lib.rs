//! # Surge Verifier
//!
//! Commitment-chain verification engine for Surge crash games, so players can
//! check for themselves that game outcomes were decided fairly.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SURGE VERIFIER                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  chain/          - Hash-chain primitives                     │
//! │  ├── hash.rs     - Game hash type and SHA-256 helpers        │
//! │  ├── epoch.rs    - Epoch descriptors and chain selection     │
//! │  └── walker.rs   - Backward hash-chain walker                │
//! │                                                              │
//! │  vx/             - Vx attestation oracle                     │
//! │  ├── client.rs   - GraphQL lookup of per-game attestations   │
//! │  └── signature.rs- BLS12-381 signature verification          │
//! │                                                              │
//! │  verifier/       - Verification runs                         │
//! │  ├── protocol.rs - Requests, results, streamed events        │
//! │  └── engine.rs   - Run lifecycle and event emission          │
//! │                                                              │
//! │  config.rs       - Published chain constants and overrides   │
//! │  outcome.rs      - Crash-point derivation                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Verification Model
//!
//! Every game hash is one link in a precomputed hash chain whose final
//! element (the terminal hash) was published in advance as a commitment.
//! Walking the chain backward from any game's hash must reproduce that
//! commitment, which proves the operator fixed every outcome before the
//! first game was played. Games in the current chain additionally carry a
//! BLS signature from the Vx oracle, mixed into each outcome, so not even
//! the operator could predict results ahead of time.
//!
//! A verification run streams one [`GameResult`] per game in descending
//! order, then `Done`, then (when requested) the terminating hash for
//! comparison against the published commitment.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod chain;
pub mod config;
pub mod outcome;
pub mod verifier;
pub mod vx;

// Re-export commonly used types
pub use chain::epoch::{Epoch, EpochSchedule, HashingConvention, SeedSource};
pub use chain::hash::GameHash;
pub use chain::walker::HashChainWalker;
pub use config::{ConfigError, VerifierConfig};
pub use verifier::engine::Verifier;
pub use verifier::protocol::{GameResult, RequestError, VerificationRequest, VerifierEvent};
pub use vx::client::{AttestationSource, VxAttestation, VxClient, VxError};
pub use vx::signature::VerifiedSeed;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
