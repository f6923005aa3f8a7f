//! Ledger module - remote ledger API access and test-account funding
//!
//! This module provides:
//! - The `LedgerApi` seam the orchestrator talks through
//! - A Horizon-style HTTP implementation
//! - A faucet client for bootstrapping test accounts
//! - An opt-in retry policy for account lookups

pub mod faucet;
pub mod horizon;
pub mod retry;

pub use faucet::FaucetClient;
pub use horizon::HorizonClient;
pub use retry::RetryPolicy;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OrchestratorResult;
use crate::tx::SignedTransaction;

/// Balance line as reported by the ledger. Opaque to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_issuer: Option<String>,
    pub balance: String,
}

/// Snapshot of an account's on-ledger state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub address: String,
    /// Last sequence number used by the account
    pub sequence: i64,
    pub balances: Vec<Balance>,
}

/// Network acknowledgement of an accepted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub hash: String,
    pub ledger: u32,
}

/// Remote ledger operations the orchestrator depends on.
///
/// `account` fails with `AccountLookup`; `submit` fails with `Submission`
/// carrying the network's rejection reason verbatim.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerApi: Send + Sync {
    async fn account(&self, address: &str) -> OrchestratorResult<AccountState>;

    async fn submit(&self, envelope: &SignedTransaction) -> OrchestratorResult<SubmissionResult>;
}
