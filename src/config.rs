//! Verifier Configuration
//!
//! All the published facts a verification needs: the two seeding events'
//! salts and terminal commitments, the oracle endpoint and its BLS public
//! key. Defaults are the compiled-in constants; `from_env` lets a deployment
//! point at a different oracle without rebuilding.

use std::time::Duration;

use bls12_381::G1Affine;
use thiserror::Error;

use crate::chain::epoch::{Epoch, EpochSchedule, HashingConvention, SeedSource};
use crate::chain::hash::parse_game_hash;

/// GraphQL endpoint of the Vx attestation oracle.
pub const VX_URL: &str = "https://server.actuallyfair.com/graphql";

/// Application slug the oracle files these attestations under.
pub const APP_SLUG: &str = "bustabit";

// Current seeding event: https://bitcointalk.org/index.php?topic=5485695

/// Public client seed mixed into every current-era game.
pub const GAME_SALT: &str = "000000000000000000011f6e135efe67d7463dfe7bb955663ef88b1243b2deea";

/// Published terminal hash of the current chain.
pub const COMMITMENT: &str = "567a98370fb7545137ddb53687723cf0b8a1f5e93b1f76f4a1da29416930fa59";

/// Compressed G1 public key the oracle signs attestations with.
pub const VX_PUB_KEY: &str =
    "b40c94495f6e6e73619aeb54ec2fc84c5333f7a88ace82923946fc5b6c8635b08f9130888dd96e1749a1d5aab00020e4";

// Previous seeding event: https://bitcointalk.org/index.php?topic=2807542

/// Length of the previous chain; the current era starts at this game number.
pub const PREV_CHAIN_LENGTH: u64 = 10_000_000;

/// Static salt every previous-era game was seeded with.
pub const PREV_GAME_SALT: &str =
    "0000000000000000004d6ec16dafe9d8370958664c1dc422f452892264c59526";

/// Published terminal hash of the previous chain.
pub const PREV_COMMITMENT: &str =
    "86728f5fc3bd99db94d3cdaf105d67788194e9701bf95d049ad0e1ee3d004277";

/// Configuration the verifier runs against.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Oracle GraphQL endpoint.
    pub oracle_url: String,
    /// Timeout for each oracle round-trip.
    pub oracle_timeout: Duration,
    /// Application slug sent with every oracle query.
    pub app_slug: String,
    /// Client seed of the current era.
    pub game_salt: String,
    /// Terminal commitment of the current chain, hex.
    pub commitment: String,
    /// First game number of the current era.
    pub chain_boundary: u64,
    /// Static salt of the previous era.
    pub prev_game_salt: String,
    /// Terminal commitment of the previous chain, hex.
    pub prev_commitment: String,
    /// Oracle BLS public key, hex-encoded compressed G1.
    pub vx_public_key: String,
}

/// Configuration that cannot produce a working verifier.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A chain commitment failed to parse.
    #[error("commitment must be 64 hex characters")]
    InvalidCommitment,
    /// The oracle public key failed to parse.
    #[error("vx public key must be a compressed 48-byte G1 point")]
    InvalidPublicKey,
    /// The HTTP client could not be built.
    #[error("http client: {0}")]
    HttpClient(String),
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            oracle_url: VX_URL.to_string(),
            oracle_timeout: Duration::from_secs(10),
            app_slug: APP_SLUG.to_string(),
            game_salt: GAME_SALT.to_string(),
            commitment: COMMITMENT.to_string(),
            chain_boundary: PREV_CHAIN_LENGTH,
            prev_game_salt: PREV_GAME_SALT.to_string(),
            prev_commitment: PREV_COMMITMENT.to_string(),
            vx_public_key: VX_PUB_KEY.to_string(),
        }
    }
}

impl VerifierConfig {
    /// Create config from environment variables, falling back to the
    /// compiled-in defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("SURGE_VX_URL") {
            config.oracle_url = url;
        }
        if let Some(ms) = std::env::var("SURGE_VX_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.oracle_timeout = Duration::from_millis(ms);
        }
        config
    }

    /// Build the two-epoch schedule from the configured constants.
    pub fn epoch_schedule(&self) -> Result<EpochSchedule, ConfigError> {
        let legacy = Epoch {
            boundary: 1,
            convention: HashingConvention::HexText,
            seed: SeedSource::Static {
                salt: self.prev_game_salt.clone(),
            },
            commitment: parse_game_hash(&self.prev_commitment)
                .ok_or(ConfigError::InvalidCommitment)?,
        };
        let current = Epoch {
            boundary: self.chain_boundary,
            convention: HashingConvention::Binary,
            seed: SeedSource::Oracle {
                client_seed: self.game_salt.clone(),
            },
            commitment: parse_game_hash(&self.commitment)
                .ok_or(ConfigError::InvalidCommitment)?,
        };
        Ok(EpochSchedule::new(legacy, current))
    }

    /// Parse the configured oracle public key.
    pub fn public_key(&self) -> Result<G1Affine, ConfigError> {
        let bytes = hex::decode(&self.vx_public_key).map_err(|_| ConfigError::InvalidPublicKey)?;
        let bytes: [u8; 48] = bytes
            .try_into()
            .map_err(|_| ConfigError::InvalidPublicKey)?;
        Option::<G1Affine>::from(G1Affine::from_compressed(&bytes))
            .ok_or(ConfigError::InvalidPublicKey)
    }
}
