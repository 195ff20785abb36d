//! Verification Engine
//!
//! The orchestration layer. [`protocol`] defines the request and event
//! types that cross the engine boundary; [`engine`] owns the background
//! run that walks the chain, consults the oracle, and streams results.

pub mod engine;
pub mod protocol;

pub use engine::Verifier;
pub use protocol::{GameResult, RequestError, VerificationRequest, VerifierEvent};
