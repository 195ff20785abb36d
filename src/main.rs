//! Surge Verifier CLI
//!
//! Verifies crash game outcomes against the published commitment chains
//! and the Vx attestation oracle, streaming one row per game.

use anyhow::bail;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use surge_verifier::{VerificationRequest, Verifier, VerifierConfig, VerifierEvent, VERSION};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Hex hash of the game to start from.
    #[arg(long)]
    game_hash: String,

    /// Game number the hash belongs to.
    #[arg(long)]
    game_number: u64,

    /// How many games to verify, walking backward.
    #[arg(long, default_value_t = 10)]
    iterations: u64,

    /// Walk the rest of the chain and check the terminating hash against
    /// the published commitment.
    #[arg(long)]
    verify_chain: bool,

    /// Override the oracle GraphQL endpoint.
    #[arg(long)]
    oracle_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let args = Args::parse();

    info!("Surge Verifier v{}", VERSION);

    let mut config = VerifierConfig::from_env();
    if let Some(url) = args.oracle_url {
        config.oracle_url = url;
    }

    let request = VerificationRequest {
        game_hash: args.game_hash,
        game_number: args.game_number,
        iterations: args.iterations,
        verify_chain: args.verify_chain,
    };

    let mut verifier = Verifier::new(&config)?;
    let commitment = hex::encode(verifier.epoch_for(request.game_number).commitment);
    let mut events = verifier.verify(&request).await?;

    let mut verified = 0u64;
    let mut unverified = 0u64;
    while let Some(event) = events.recv().await {
        match event {
            VerifierEvent::Result(result) => {
                let tag = if result.verified {
                    verified += 1;
                    "verified"
                } else {
                    unverified += 1;
                    "unverified"
                };
                info!(
                    "Game {}: {:.2}x ({}) hash {}",
                    result.id, result.crash_point, tag, result.hash
                );
            }
            VerifierEvent::Done => {
                info!(
                    "Checked {} game(s): {} verified, {} unverified",
                    verified + unverified,
                    verified,
                    unverified
                );
            }
            VerifierEvent::TerminatingHash { hash } => {
                if hash == commitment {
                    info!("Terminating hash matches the published commitment {}", hash);
                } else {
                    bail!(
                        "terminating hash {} does not match the published commitment {}",
                        hash,
                        commitment
                    );
                }
            }
            VerifierEvent::Failed => {
                warn!("The Vx oracle had no attestation for one of the requested games");
                bail!("verification failed; check the game hash and number and try again");
            }
        }
    }

    Ok(())
}
