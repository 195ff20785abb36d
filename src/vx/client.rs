//! Vx Attestation Lookup
//!
//! GraphQL client for the Vx oracle. One query per game index returns the
//! unique attestation (signed message plus BLS signature) recorded for
//! the app's commitment at that index.
//!
//! Every way a lookup can come up empty-handed (transport failure,
//! non-success status, GraphQL errors, no record at the index) maps to a
//! [`VxError`]. Distrusting the *content* of a returned attestation is
//! not this module's job; see `signature`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::VerifierConfig;

/// One attestation as reported by the oracle, hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VxAttestation {
    /// Hex of the message the oracle claims to have signed.
    pub message: String,
    /// Hex of the compressed BLS signature over that message.
    pub vx_signature: String,
}

/// Attestation lookup errors. Any of these is fatal to a verification
/// run: without the signature there is no seed to derive an outcome from.
#[derive(Debug, thiserror::Error)]
pub enum VxError {
    /// Request never completed (connect, timeout, decode).
    #[error("attestation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Service answered with a non-success status.
    #[error("attestation service returned status {status}")]
    Status {
        /// HTTP status code of the response.
        status: reqwest::StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },

    /// Service answered with a GraphQL-level error.
    #[error("attestation service error: {0}")]
    Service(String),

    /// No attestation recorded at the requested index.
    #[error("no attestation at index {index}")]
    MissingRecord {
        /// Game index that was queried.
        index: u64,
    },

    /// The reported signature is not valid hex, so no seed can be derived.
    #[error("attestation signature at index {index} is not valid hex")]
    MalformedSignature {
        /// Game index the attestation was for.
        index: u64,
    },
}

/// Source of per-game attestations.
///
/// Verification runs depend on this trait rather than on [`VxClient`]
/// directly, so tests can substitute canned attestations.
#[async_trait]
pub trait AttestationSource: Send + Sync {
    /// Fetch the attestation recorded at `index`.
    async fn fetch_attestation(&self, index: u64) -> Result<VxAttestation, VxError>;
}

const MESSAGES_BY_INDEX_QUERY: &str = r#"
    query AppsMessagesByIndex($appSlug: String!, $index: Int!, $commitment: String!) {
      appBySlug(slug: $appSlug) {
        id
        name
        vx {
          messagesByIndex(commitment: $commitment, index: $index) {
            vx_signature
            message
          }
        }
      }
    }
"#;

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: RequestVariables<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestVariables<'a> {
    app_slug: &'a str,
    index: u64,
    commitment: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(rename = "appBySlug")]
    app_by_slug: Option<AppRecord>,
}

#[derive(Debug, Deserialize)]
struct AppRecord {
    vx: Option<VxRecord>,
}

#[derive(Debug, Deserialize)]
struct VxRecord {
    #[serde(rename = "messagesByIndex")]
    messages_by_index: Vec<VxAttestation>,
}

/// HTTP client for the Vx oracle's GraphQL endpoint.
pub struct VxClient {
    client: reqwest::Client,
    endpoint: String,
    app_slug: String,
    commitment: String,
}

impl VxClient {
    /// Build a client from the verifier configuration.
    pub fn new(config: &VerifierConfig) -> Result<Self, VxError> {
        let client = reqwest::Client::builder()
            .timeout(config.oracle_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.oracle_url.clone(),
            app_slug: config.app_slug.clone(),
            commitment: config.commitment.clone(),
        })
    }

    /// The endpoint this client queries.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AttestationSource for VxClient {
    async fn fetch_attestation(&self, index: u64) -> Result<VxAttestation, VxError> {
        debug!("Fetching Vx attestation for game {}", index);

        let request = GraphqlRequest {
            query: MESSAGES_BY_INDEX_QUERY,
            variables: RequestVariables {
                app_slug: &self.app_slug,
                index,
                commitment: &self.commitment,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Vx lookup returned status {}: {}", status, body);
            return Err(VxError::Status { status, body });
        }

        let envelope: GraphqlResponse = response.json().await?;
        extract_attestation(envelope, index)
    }
}

/// Pull the single attestation out of a response envelope.
fn extract_attestation(envelope: GraphqlResponse, index: u64) -> Result<VxAttestation, VxError> {
    if let Some(errors) = envelope.errors {
        let message = errors
            .into_iter()
            .next()
            .map(|e| e.message)
            .unwrap_or_else(|| "unknown error".to_string());
        error!("Vx lookup failed at game {}: {}", index, message);
        return Err(VxError::Service(message));
    }

    envelope
        .data
        .and_then(|data| data.app_by_slug)
        .and_then(|app| app.vx)
        .and_then(|vx| vx.messages_by_index.into_iter().next())
        .ok_or(VxError::MissingRecord { index })
}
