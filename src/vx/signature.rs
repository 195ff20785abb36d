//! Vx Signature Verification
//!
//! Checks that an attestation really is the oracle's word. The oracle
//! signs with the BLS min-pubkey scheme: 48-byte compressed G1 public
//! keys, 96-byte compressed G2 signatures, messages hashed to G2 with the
//! standard ciphersuite. A signature `sig` over message `m` from public
//! key `pk` satisfies `e(g1, sig) == e(pk, H(m))`.
//!
//! The message is recomputed locally from the game hash and the public
//! client seed; the oracle's reported message is only *compared* against
//! it, never trusted as the thing to verify.

use bls12_381::hash_to_curve::{ExpandMsgXmd, HashToCurve};
use bls12_381::{pairing, G1Affine, G2Affine, G2Projective};

use super::client::{VxAttestation, VxError};
use crate::chain::hash::{hash_bytes, GameHash};

/// Domain separation tag of the BLS signature ciphersuite the oracle
/// signs under (G2 signatures, SHA-256 expansion, proof of possession).
pub const BLS_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Outcome of verifying one attestation.
///
/// The signature bytes double as the game's randomness seed, whether or
/// not they verified; `verified` records the oracle check separately so
/// a consumer can flag unverifiable games without discarding them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSeed {
    /// Raw signature bytes, fed to the crash formula as the seed.
    pub signature: Vec<u8>,
    /// True only if the message matched and the pairing check passed.
    pub verified: bool,
}

/// The message the oracle must have signed for this game:
/// `sha256(game_hash) || client_seed`.
pub fn expected_message(game_hash: &GameHash, client_seed: &str) -> Vec<u8> {
    let mut message = Vec::with_capacity(32 + client_seed.len());
    message.extend_from_slice(&hash_bytes(game_hash));
    message.extend_from_slice(client_seed.as_bytes());
    message
}

/// Verify a compressed G2 signature over `message` against a G1 public
/// key. Anything that is not a well-formed point in the right subgroup
/// fails closed.
pub fn verify_bls_signature(public_key: &G1Affine, signature: &[u8], message: &[u8]) -> bool {
    let Ok(bytes) = <&[u8; 96]>::try_from(signature) else {
        return false;
    };
    let signature = match Option::<G2Affine>::from(G2Affine::from_compressed(bytes)) {
        Some(point) => point,
        None => return false,
    };

    let hashed = <G2Projective as HashToCurve<ExpandMsgXmd<sha2_09::Sha256>>>::hash_to_curve(
        message, BLS_DST,
    );

    pairing(&G1Affine::generator(), &signature) == pairing(public_key, &G2Affine::from(hashed))
}

/// Verify one attestation and produce the per-game seed.
///
/// A signature that is not even hex is an error (there is no seed to
/// derive an outcome from); everything else that fails, fails soft into
/// `verified: false`. The pairing check runs against the *recomputed*
/// message, so a forged `message` field cannot make a bad signature look
/// good.
pub fn verify_attestation(
    public_key: &G1Affine,
    attestation: &VxAttestation,
    game_hash: &GameHash,
    client_seed: &str,
    index: u64,
) -> Result<VerifiedSeed, VxError> {
    let signature = hex::decode(&attestation.vx_signature)
        .map_err(|_| VxError::MalformedSignature { index })?;

    let expected = expected_message(game_hash, client_seed);
    let message_matches = match hex::decode(&attestation.message) {
        Ok(reported) => reported == expected,
        Err(_) => false,
    };

    let verified = message_matches && verify_bls_signature(public_key, &signature, &expected);

    Ok(VerifiedSeed { signature, verified })
}
