//! Invoice identifier and content-hash generation.
//!
//! Candidates are checked against the registry before use. The check and the
//! later submit are not atomic: another writer can claim the same identifier
//! or hash in between. That race is accepted and surfaces as an on-chain
//! revert.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::B256;
use rand::Rng;
use thiserror::Error;

use crate::anchor::error::AnchorError;
use crate::chain::InvoiceRegistry;
use crate::config::UniquenessConfig;
use crate::observability::metrics;
use crate::resilience::Backoff;

const PREFIX: &str = "INV-";
const BLOCK_LEN: usize = 4;

/// Human-readable invoice identifier of the form `INV-XXXX-XXXX`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HumanId(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not of the form INV-XXXX-XXXX")]
pub struct InvalidHumanId(pub String);

impl HumanId {
    /// Sample two blocks from `alphabet`.
    pub fn random<R: Rng>(alphabet: &[u8], rng: &mut R) -> Self {
        let mut id = String::with_capacity(PREFIX.len() + 2 * BLOCK_LEN + 1);
        id.push_str(PREFIX);
        for block in 0..2 {
            if block == 1 {
                id.push('-');
            }
            for _ in 0..BLOCK_LEN {
                id.push(char::from(alphabet[rng.gen_range(0..alphabet.len())]));
            }
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalize loosely typed verification input.
    ///
    /// Accepts `INV-XXXX-XXXX`, `XXXX-XXXX` or eight bare characters, in any
    /// case, ignoring whitespace and punctuation other than `-`.
    pub fn normalize(input: &str) -> Result<Self, InvalidHumanId> {
        let cleaned: String = input
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let candidate = if cleaned.starts_with(PREFIX) {
            cleaned
        } else if cleaned.len() == 2 * BLOCK_LEN + 1 && cleaned.contains('-') {
            format!("{}{}", PREFIX, cleaned)
        } else if cleaned.len() == 2 * BLOCK_LEN && !cleaned.contains('-') {
            format!("{}{}-{}", PREFIX, &cleaned[..BLOCK_LEN], &cleaned[BLOCK_LEN..])
        } else {
            return Err(InvalidHumanId(input.to_string()));
        };

        candidate.parse().map_err(|_| InvalidHumanId(input.to_string()))
    }
}

impl FromStr for HumanId {
    type Err = InvalidHumanId;

    /// Strict parse: uppercase ASCII alphanumeric blocks only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let blocks = s
            .strip_prefix(PREFIX)
            .and_then(|rest| rest.split_once('-'))
            .ok_or_else(|| InvalidHumanId(s.to_string()))?;

        let valid_block = |b: &str| {
            b.len() == BLOCK_LEN
                && b.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        };
        if valid_block(blocks.0) && valid_block(blocks.1) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidHumanId(s.to_string()))
        }
    }
}

impl fmt::Display for HumanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A (human identifier, content hash) pair proposed for anchoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceCandidate {
    pub human_id: HumanId,
    pub content_hash: B256,
}

impl InvoiceCandidate {
    pub fn random<R: Rng>(alphabet: &[u8], rng: &mut R) -> Self {
        let human_id = HumanId::random(alphabet, rng);
        let mut hash = [0u8; 32];
        rng.fill(&mut hash);
        Self {
            human_id,
            content_hash: B256::from(hash),
        }
    }
}

/// Attempt ceiling, pacing and alphabet for the search.
#[derive(Debug, Clone)]
pub struct UniquenessPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub alphabet: Vec<u8>,
}

impl UniquenessPolicy {
    pub fn from_config(config: &UniquenessConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: Backoff::from_millis(config.backoff_base_ms, config.backoff_max_ms),
            alphabet: config.alphabet.as_bytes().to_vec(),
        }
    }
}

/// Find a candidate whose identifier and hash are both unused on-chain.
///
/// `rng` must be a cryptographically secure generator; the content hash is
/// taken straight from it. Any ledger error aborts the search.
pub async fn generate<R: Rng>(
    registry: &InvoiceRegistry<'_>,
    policy: &UniquenessPolicy,
    rng: &mut R,
) -> Result<InvoiceCandidate, AnchorError> {
    if policy.alphabet.is_empty() || policy.max_attempts == 0 {
        return Err(AnchorError::Config(
            "uniqueness policy needs a non-empty alphabet and at least one attempt".into(),
        ));
    }

    for attempt in 1..=policy.max_attempts {
        let candidate = InvoiceCandidate::random(&policy.alphabet, rng);

        let record = registry.get_invoice(candidate.human_id.as_str()).await?;
        let hash_taken = registry.sha_exists(candidate.content_hash).await?;
        let id_taken = record.is_anchored();

        if !id_taken && !hash_taken {
            tracing::info!(
                attempt = attempt,
                human_id = %candidate.human_id,
                content_hash = %candidate.content_hash,
                "Generated unique invoice data"
            );
            return Ok(candidate);
        }

        metrics::record_uniqueness_conflict();
        tracing::warn!(
            attempt = attempt,
            max_attempts = policy.max_attempts,
            id_taken = id_taken,
            hash_taken = hash_taken,
            "Invoice data conflict, retrying"
        );

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.backoff.delay(attempt)).await;
        }
    }

    Err(AnchorError::ExhaustedAttempts {
        attempts: policy.max_attempts,
    })
}
