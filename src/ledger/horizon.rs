//! Horizon-style HTTP ledger client

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{AccountState, Balance, LedgerApi, SubmissionResult};
use crate::error::{LookupFailure, OrchestratorError, OrchestratorResult};
use crate::tx::SignedTransaction;

/// HTTP client for the ledger API
#[derive(Clone)]
pub struct HorizonClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    id: String,
    sequence: String,
    #[serde(default)]
    balances: Vec<Balance>,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: String,
    ledger: u32,
}

#[derive(Debug, Default, Deserialize)]
struct Problem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    extras: Option<ProblemExtras>,
}

#[derive(Debug, Default, Deserialize)]
struct ProblemExtras {
    #[serde(default)]
    result_codes: Option<ResultCodes>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultCodes {
    #[serde(default)]
    transaction: Option<String>,
    #[serde(default)]
    operations: Vec<String>,
}

impl HorizonClient {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> OrchestratorResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OrchestratorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Render the network's result codes verbatim, e.g. `tx_failed [op_underfunded]`
fn rejection_reason(status: StatusCode, body: &str) -> String {
    let problem: Problem = serde_json::from_str(body).unwrap_or_default();
    match problem.extras.and_then(|e| e.result_codes) {
        Some(ResultCodes {
            transaction: Some(tx_code),
            operations,
        }) if operations.is_empty() => tx_code,
        Some(ResultCodes {
            transaction: Some(tx_code),
            operations,
        }) => format!("{} [{}]", tx_code, operations.join(", ")),
        _ => match problem.title {
            Some(title) => format!("HTTP {}: {}", status.as_u16(), title),
            None => format!("HTTP {}: {}", status.as_u16(), body.trim()),
        },
    }
}

#[async_trait]
impl LedgerApi for HorizonClient {
    async fn account(&self, address: &str) -> OrchestratorResult<AccountState> {
        let url = format!("{}/accounts/{}", self.base_url, address);
        let unreachable = |message: String| OrchestratorError::AccountLookup {
            address: address.to_string(),
            reason: LookupFailure::Unreachable(message),
        };

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(OrchestratorError::AccountLookup {
                address: address.to_string(),
                reason: LookupFailure::NotFound,
            });
        }
        if !status.is_success() {
            warn!(%address, status = status.as_u16(), "Account lookup failed");
            return Err(unreachable(format!("HTTP {}", status.as_u16())));
        }

        let body: AccountResponse = response
            .json()
            .await
            .map_err(|e| unreachable(format!("Malformed account response: {}", e)))?;
        let sequence = body
            .sequence
            .parse::<i64>()
            .map_err(|e| unreachable(format!("Malformed sequence {:?}: {}", body.sequence, e)))?;

        debug!(address = %body.id, sequence, "Fetched account");

        Ok(AccountState {
            address: body.id,
            sequence,
            balances: body.balances,
        })
    }

    async fn submit(&self, envelope: &SignedTransaction) -> OrchestratorResult<SubmissionResult> {
        let url = format!("{}/transactions", self.base_url);
        let encoded = envelope.encode()?;

        let response = self
            .http
            .post(&url)
            .form(&[("tx", encoded.as_str())])
            .send()
            .await
            .map_err(|e| OrchestratorError::Submission {
                reason: format!("Transport error: {}", e),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| OrchestratorError::Submission {
            reason: format!("Failed to read response: {}", e),
        })?;

        if !status.is_success() {
            return Err(OrchestratorError::Submission {
                reason: rejection_reason(status, &body),
            });
        }

        let accepted: SubmitResponse =
            serde_json::from_str(&body).map_err(|e| OrchestratorError::Submission {
                reason: format!("Malformed submission response: {}", e),
            })?;

        Ok(SubmissionResult {
            hash: accepted.hash,
            ledger: accepted.ledger,
        })
    }
}

impl std::fmt::Debug for HorizonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HorizonClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
