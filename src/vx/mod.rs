//! Vx Attestation Oracle
//!
//! Games in the current chain mix a per-game BLS signature from the Vx
//! oracle into their outcome. The oracle signs `sha256(gameHash)` plus the
//! public client seed for every game index, and publishes the signature
//! and signed message for anyone to look up.
//!
//! `client` fetches one attestation per game index over GraphQL; the
//! [`AttestationSource`] trait sits in front of it so verification runs
//! can be driven by a stub in tests. `signature` reconstructs the
//! expected message and checks the oracle's signature against the
//! compiled-in public key via a BLS12-381 pairing.

pub mod client;
pub mod signature;

// Re-export oracle types
pub use client::{AttestationSource, VxAttestation, VxClient, VxError};
pub use signature::{expected_message, verify_attestation, verify_bls_signature, VerifiedSeed};
