//! Verification Runs
//!
//! One [`Verifier`] owns at most one background run at a time. A run walks
//! the hash chain from the requested game, resolves each game's seed (oracle
//! attestation in the current epoch, static salt before it), computes the
//! crash point, and streams events back over a channel. Submitting a new
//! request supersedes the active run: the old task is aborted and awaited
//! before the new one spawns.

use std::sync::Arc;

use bls12_381::G1Affine;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::chain::epoch::{Epoch, EpochSchedule, SeedSource};
use crate::chain::hash::GameHash;
use crate::chain::walker::HashChainWalker;
use crate::config::{ConfigError, VerifierConfig};
use crate::outcome::crash_point;
use crate::verifier::protocol::{
    GameResult, RequestError, ValidRequest, VerificationRequest, VerifierEvent,
};
use crate::vx::client::{AttestationSource, VxClient, VxError};
use crate::vx::signature::{verify_attestation, VerifiedSeed};

/// Outbound event channel capacity.
const EVENT_BUFFER: usize = 64;

/// Chain-walk steps between yields back to the scheduler. The verify-chain
/// continuation has no natural await points, so it must hand control back
/// periodically for a superseding abort to land.
const YIELD_INTERVAL: u64 = 4096;

/// Drives verification runs against the configured epochs and oracle.
pub struct Verifier {
    schedule: EpochSchedule,
    public_key: G1Affine,
    source: Arc<dyn AttestationSource>,
    active_run: Option<JoinHandle<()>>,
}

impl Verifier {
    /// Build a verifier backed by the live Vx oracle endpoint.
    pub fn new(config: &VerifierConfig) -> Result<Self, ConfigError> {
        let source =
            VxClient::new(config).map_err(|err| ConfigError::HttpClient(err.to_string()))?;
        Self::with_source(config, Arc::new(source))
    }

    /// Build a verifier over a caller-supplied attestation source.
    pub fn with_source(
        config: &VerifierConfig,
        source: Arc<dyn AttestationSource>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            schedule: config.epoch_schedule()?,
            public_key: config.public_key()?,
            source,
            active_run: None,
        })
    }

    /// The epoch a game number falls in.
    pub fn epoch_for(&self, game_number: u64) -> &Epoch {
        self.schedule.epoch_for(game_number)
    }

    /// Start a verification run and return the event stream.
    ///
    /// The request is checked before any work starts; a structurally bad
    /// request never supersedes the active run. Otherwise the active run is
    /// aborted and awaited, and the new run spawns in its place. Events
    /// arrive in order: `Result`s in strictly decreasing game order, then
    /// `Done`, then at most one of `TerminatingHash` or `Failed`.
    pub async fn verify(
        &mut self,
        request: &VerificationRequest,
    ) -> Result<mpsc::Receiver<VerifierEvent>, RequestError> {
        let valid = request.validate()?;

        if let Some(run) = self.active_run.take() {
            run.abort();
            let _ = run.await;
        }

        let epoch = self.schedule.epoch_for(valid.game_number).clone();
        let source = Arc::clone(&self.source);
        let public_key = self.public_key;
        let (sender, receiver) = mpsc::channel(EVENT_BUFFER);

        info!(
            "Starting verification of game {} ({} iterations)",
            valid.game_number, valid.iterations
        );
        self.active_run = Some(tokio::spawn(async move {
            run_verification(valid, epoch, source, public_key, sender).await;
        }));

        Ok(receiver)
    }
}

impl Drop for Verifier {
    fn drop(&mut self) {
        if let Some(run) = self.active_run.take() {
            run.abort();
        }
    }
}

/// One run, start to finish. Every exit path has already emitted its
/// terminal events; a failed send means the receiver is gone and the run
/// just stops.
async fn run_verification(
    request: ValidRequest,
    epoch: Epoch,
    source: Arc<dyn AttestationSource>,
    public_key: G1Affine,
    sender: mpsc::Sender<VerifierEvent>,
) {
    let mut walker = HashChainWalker::new(request.start_hash, request.game_number, &epoch);
    let mut terminal = (request.game_number, request.start_hash);
    let mut produced = 0u64;

    while produced < request.iterations {
        let Some((index, hash)) = walker.next() else {
            break;
        };
        terminal = (index, hash);
        produced += 1;

        let seed = match &epoch.seed {
            SeedSource::Static { salt } => VerifiedSeed {
                signature: salt.as_bytes().to_vec(),
                verified: false,
            },
            SeedSource::Oracle { client_seed } => {
                match fetch_and_verify(source.as_ref(), &public_key, &hash, client_seed, index)
                    .await
                {
                    Ok(seed) => seed,
                    Err(err) => {
                        error!("Vx attestation for game {} unavailable: {}", index, err);
                        let _ = sender.send(VerifierEvent::Done).await;
                        let _ = sender.send(VerifierEvent::Failed).await;
                        return;
                    }
                }
            }
        };

        let result = GameResult {
            id: index,
            crash_point: crash_point(&seed.signature, &hash),
            verified: seed.verified,
            hash: hex::encode(hash),
        };
        if sender.send(VerifierEvent::Result(result)).await.is_err() {
            debug!("Event receiver dropped; stopping run");
            return;
        }
    }

    if sender.send(VerifierEvent::Done).await.is_err() {
        return;
    }
    if !request.verify_chain {
        debug!("Verified {} games from {}", produced, request.game_number);
        return;
    }

    // Continue the walk to the epoch boundary. No oracle calls and no
    // further results; only the final hash matters from here on.
    let mut steps = 0u64;
    for (index, hash) in walker {
        terminal = (index, hash);
        steps += 1;
        if steps % YIELD_INTERVAL == 0 {
            tokio::task::yield_now().await;
        }
    }

    info!(
        "Chain walk terminated at game {} after {} extra steps",
        terminal.0, steps
    );
    let _ = sender
        .send(VerifierEvent::TerminatingHash {
            hash: hex::encode(terminal.1),
        })
        .await;
}

/// Fetch one attestation and verify it against the game hash.
async fn fetch_and_verify(
    source: &dyn AttestationSource,
    public_key: &G1Affine,
    game_hash: &GameHash,
    client_seed: &str,
    index: u64,
) -> Result<VerifiedSeed, VxError> {
    let attestation = source.fetch_attestation(index).await?;
    verify_attestation(public_key, &attestation, game_hash, client_seed, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::epoch::HashingConvention;
    use crate::vx::client::VxAttestation;
    use crate::vx::signature::{expected_message, BLS_DST};
    use async_trait::async_trait;
    use bls12_381::hash_to_curve::{ExpandMsgXmd, HashToCurve};
    use bls12_381::{G1Projective, G2Affine, G2Projective, Scalar};
    use std::collections::BTreeMap;

    /// Oracle serving a fixed set of attestations.
    struct StubOracle {
        records: BTreeMap<u64, VxAttestation>,
    }

    #[async_trait]
    impl AttestationSource for StubOracle {
        async fn fetch_attestation(&self, index: u64) -> Result<VxAttestation, VxError> {
            self.records
                .get(&index)
                .cloned()
                .ok_or(VxError::MissingRecord { index })
        }
    }

    /// Oracle that never answers.
    struct ParkedOracle;

    #[async_trait]
    impl AttestationSource for ParkedOracle {
        async fn fetch_attestation(&self, _index: u64) -> Result<VxAttestation, VxError> {
            std::future::pending().await
        }
    }

    fn keypair() -> (Scalar, G1Affine) {
        let sk = Scalar::from(0x5eed_u64);
        let pk = G1Affine::from(G1Projective::generator() * sk);
        (sk, pk)
    }

    fn sign(sk: &Scalar, message: &[u8]) -> Vec<u8> {
        let hashed = <G2Projective as HashToCurve<ExpandMsgXmd<sha2_09::Sha256>>>::hash_to_curve(
            message, BLS_DST,
        );
        G2Affine::from(hashed * sk).to_compressed().to_vec()
    }

    fn test_config(public_key: &G1Affine) -> VerifierConfig {
        VerifierConfig {
            vx_public_key: hex::encode(public_key.to_compressed()),
            ..VerifierConfig::default()
        }
    }

    /// Hash of every game from `start_index` down to `floor`, walking the
    /// chain the same way the verifier will.
    fn chain_hashes(
        start: GameHash,
        start_index: u64,
        floor: u64,
        convention: HashingConvention,
    ) -> BTreeMap<u64, GameHash> {
        let mut hashes = BTreeMap::new();
        let mut hash = start;
        let mut index = start_index;
        loop {
            hashes.insert(index, hash);
            if index == floor {
                return hashes;
            }
            hash = convention.step(&hash);
            index -= 1;
        }
    }

    /// Honest attestations for every game in `hashes`.
    fn honest_oracle(
        sk: &Scalar,
        hashes: &BTreeMap<u64, GameHash>,
        client_seed: &str,
    ) -> StubOracle {
        let records = hashes
            .iter()
            .map(|(&index, hash)| {
                let message = expected_message(hash, client_seed);
                let attestation = VxAttestation {
                    message: hex::encode(&message),
                    vx_signature: hex::encode(sign(sk, &message)),
                };
                (index, attestation)
            })
            .collect();
        StubOracle { records }
    }

    fn request(
        start: GameHash,
        game_number: u64,
        iterations: u64,
        verify_chain: bool,
    ) -> VerificationRequest {
        VerificationRequest {
            game_hash: hex::encode(start),
            game_number,
            iterations,
            verify_chain,
        }
    }

    async fn drain(mut receiver: mpsc::Receiver<VerifierEvent>) -> Vec<VerifierEvent> {
        let mut events = Vec::new();
        while let Some(event) = receiver.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_build_from_default_config() {
        assert!(Verifier::new(&VerifierConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_streams_results_in_decreasing_order_then_done() {
        let (sk, pk) = keypair();
        let config = test_config(&pk);
        let start: GameHash = [0x11; 32];
        let top = 10_000_012;

        let hashes = chain_hashes(start, top, 10_000_010, HashingConvention::Binary);
        let oracle = honest_oracle(&sk, &hashes, &config.game_salt);
        let mut verifier = Verifier::with_source(&config, Arc::new(oracle)).unwrap();

        let events = drain(
            verifier
                .verify(&request(start, top, 3, false))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(events.len(), 4);
        for (offset, event) in events[..3].iter().enumerate() {
            let id = top - offset as u64;
            let hash = hashes[&id];
            let VerifierEvent::Result(result) = event else {
                panic!("expected a result, got {:?}", event);
            };
            assert_eq!(result.id, id);
            assert_eq!(result.hash, hex::encode(hash));
            assert!(result.verified);
            assert!(result.crash_point >= 1.0);
        }
        assert_eq!(events[3], VerifierEvent::Done);
    }

    #[tokio::test]
    async fn test_verify_chain_reports_boundary_hash_without_oracle_calls() {
        let (sk, pk) = keypair();
        let config = test_config(&pk);
        let start: GameHash = [0x22; 32];
        let top = 10_000_006;

        let hashes = chain_hashes(start, top, 10_000_000, HashingConvention::Binary);
        // Only the two requested games are attested. The walk below them
        // must not touch the oracle, or the run would fail.
        let mut window = BTreeMap::new();
        window.insert(top, hashes[&top]);
        window.insert(top - 1, hashes[&(top - 1)]);
        let oracle = honest_oracle(&sk, &window, &config.game_salt);
        let mut verifier = Verifier::with_source(&config, Arc::new(oracle)).unwrap();

        let events = drain(
            verifier
                .verify(&request(start, top, 2, true))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(events.len(), 4);
        assert_eq!(events[2], VerifierEvent::Done);
        assert_eq!(
            events[3],
            VerifierEvent::TerminatingHash {
                hash: hex::encode(hashes[&10_000_000]),
            }
        );
    }

    #[tokio::test]
    async fn test_boundary_truncates_iteration_budget() {
        let (sk, pk) = keypair();
        let config = test_config(&pk);
        let start: GameHash = [0xaa; 32];
        let top = 10_000_002;

        // Ten iterations requested, but only three games separate the
        // start from the epoch boundary.
        let hashes = chain_hashes(start, top, 10_000_000, HashingConvention::Binary);
        let oracle = honest_oracle(&sk, &hashes, &config.game_salt);
        let mut verifier = Verifier::with_source(&config, Arc::new(oracle)).unwrap();

        let events = drain(
            verifier
                .verify(&request(start, top, 10, true))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(events.len(), 5);
        for (offset, event) in events[..3].iter().enumerate() {
            let id = top - offset as u64;
            let VerifierEvent::Result(result) = event else {
                panic!("expected a result, got {:?}", event);
            };
            assert_eq!(result.id, id);
            assert!(result.verified);
        }
        assert_eq!(events[3], VerifierEvent::Done);
        assert_eq!(
            events[4],
            VerifierEvent::TerminatingHash {
                hash: hex::encode(hashes[&10_000_000]),
            }
        );
    }

    #[tokio::test]
    async fn test_missing_attestation_fails_after_done() {
        let (sk, pk) = keypair();
        let config = test_config(&pk);
        let start: GameHash = [0x33; 32];
        let top = 10_000_009;

        let hashes = chain_hashes(start, top, 10_000_000, HashingConvention::Binary);
        // Attest the first game only; the second lookup comes up empty.
        let mut window = BTreeMap::new();
        window.insert(top, hashes[&top]);
        let oracle = honest_oracle(&sk, &window, &config.game_salt);
        let mut verifier = Verifier::with_source(&config, Arc::new(oracle)).unwrap();

        let events = drain(
            verifier
                .verify(&request(start, top, 3, true))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], VerifierEvent::Result(result) if result.id == top));
        assert_eq!(events[1], VerifierEvent::Done);
        assert_eq!(events[2], VerifierEvent::Failed);
    }

    #[tokio::test]
    async fn test_forged_attestation_is_reported_unverified() {
        let (sk, pk) = keypair();
        let config = test_config(&pk);
        let start: GameHash = [0x44; 32];
        let top = 10_000_003;

        let hashes = chain_hashes(start, top, top, HashingConvention::Binary);
        let mut oracle = honest_oracle(&sk, &hashes, &config.game_salt);
        // Re-sign the record with a key that is not the oracle's.
        let rogue = Scalar::from(1234u64);
        let record = oracle.records.get_mut(&top).unwrap();
        let message = hex::decode(&record.message).unwrap();
        record.vx_signature = hex::encode(sign(&rogue, &message));
        let mut verifier = Verifier::with_source(&config, Arc::new(oracle)).unwrap();

        let events = drain(
            verifier
                .verify(&request(start, top, 1, false))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(events.len(), 2);
        let VerifierEvent::Result(result) = &events[0] else {
            panic!("expected a result, got {:?}", events[0]);
        };
        assert!(!result.verified);
        assert_eq!(events[1], VerifierEvent::Done);
    }

    #[tokio::test]
    async fn test_legacy_games_seed_from_static_salt() {
        let (_, pk) = keypair();
        let config = test_config(&pk);
        let start: GameHash = [0x55; 32];

        // An empty oracle: any lookup would fail the run, so a clean
        // finish proves the legacy path never asked.
        let oracle = StubOracle {
            records: BTreeMap::new(),
        };
        let mut verifier = Verifier::with_source(&config, Arc::new(oracle)).unwrap();

        let events = drain(verifier.verify(&request(start, 500, 2, false)).await.unwrap()).await;

        let hashes = chain_hashes(start, 500, 499, HashingConvention::HexText);
        assert_eq!(events.len(), 3);
        for (offset, event) in events[..2].iter().enumerate() {
            let id = 500 - offset as u64;
            let VerifierEvent::Result(result) = event else {
                panic!("expected a result, got {:?}", event);
            };
            assert_eq!(result.id, id);
            assert!(!result.verified);
            assert_eq!(result.hash, hex::encode(hashes[&id]));
            assert_eq!(
                result.crash_point,
                crash_point(config.prev_game_salt.as_bytes(), &hashes[&id])
            );
        }
        assert_eq!(events[2], VerifierEvent::Done);
    }

    #[tokio::test]
    async fn test_legacy_chain_terminates_at_game_one() {
        let (_, pk) = keypair();
        let config = test_config(&pk);
        let start: GameHash = [0x66; 32];

        let oracle = StubOracle {
            records: BTreeMap::new(),
        };
        let mut verifier = Verifier::with_source(&config, Arc::new(oracle)).unwrap();

        let events = drain(verifier.verify(&request(start, 40, 5, true)).await.unwrap()).await;

        let hashes = chain_hashes(start, 40, 1, HashingConvention::HexText);
        assert_eq!(events.len(), 7);
        assert_eq!(events[5], VerifierEvent::Done);
        assert_eq!(
            events[6],
            VerifierEvent::TerminatingHash {
                hash: hex::encode(hashes[&1]),
            }
        );
    }

    #[tokio::test]
    async fn test_new_request_supersedes_parked_run() {
        let (_, pk) = keypair();
        let config = test_config(&pk);
        let mut verifier = Verifier::with_source(&config, Arc::new(ParkedOracle)).unwrap();

        // First run parks inside the oracle call and never produces.
        let mut first = verifier
            .verify(&request([0x77; 32], 10_000_001, 1, false))
            .await
            .unwrap();

        // Superseding it with a legacy run aborts the parked task; the
        // legacy run never consults the oracle and finishes cleanly.
        let second = drain(
            verifier
                .verify(&request([0x88; 32], 300, 1, false))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(first.recv().await, None);
        assert_eq!(second.len(), 2);
        assert!(matches!(&second[0], VerifierEvent::Result(result) if result.id == 300));
        assert_eq!(second[1], VerifierEvent::Done);
    }

    #[tokio::test]
    async fn test_dropped_receiver_stops_run() {
        let (_, pk) = keypair();
        let config = test_config(&pk);
        let oracle = StubOracle {
            records: BTreeMap::new(),
        };
        let mut verifier = Verifier::with_source(&config, Arc::new(oracle)).unwrap();

        // More results than the channel buffers, so the run can only
        // finish if the closed channel stops it.
        let receiver = verifier
            .verify(&request([0x99; 32], 2000, 1000, false))
            .await
            .unwrap();
        drop(receiver);

        let run = verifier.active_run.take().unwrap();
        run.await.unwrap();
    }
}
