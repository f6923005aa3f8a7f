//! The shared lookup → build → sign → submit pipeline

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::OrchestratorResult;
use crate::identity::Identity;
use crate::ledger::{AccountState, LedgerApi, RetryPolicy, SubmissionResult};
use crate::metrics;
use crate::tx::{
    build_request, validate_batch, Asset, Operation, SetOptions, SignedTransaction,
    TransactionParams, Validity,
};

/// Seconds a data or option change stays valid after it is built
pub const MUTATION_TIMEOUT_SECS: u64 = 300;

/// Builds, signs and submits transactions against one network.
///
/// Holds no per-account state: every transaction starts from a fresh account
/// lookup. Submissions for the same source must be serialized by the caller,
/// concurrent ones race on the sequence number.
pub struct Orchestrator {
    /// Remote ledger
    ledger: Arc<dyn LedgerApi>,
    /// Passphrase every signature is scoped to
    passphrase: String,
    /// Applied to account lookups only
    retry: RetryPolicy,
    /// Clock used for validity windows
    now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl Orchestrator {
    /// Create an orchestrator for the network named by `passphrase`
    pub fn new(ledger: Arc<dyn LedgerApi>, passphrase: impl Into<String>) -> Self {
        Self {
            ledger,
            passphrase: passphrase.into(),
            retry: RetryPolicy::disabled(),
            now_fn: Box::new(Utc::now),
        }
    }

    /// Retry unreachable account lookups with this policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the clock (for testing)
    pub fn with_time_fn<F>(mut self, f: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.now_fn = Box::new(f);
        self
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Fetch the current state of an account
    pub async fn account(&self, address: &str) -> OrchestratorResult<AccountState> {
        let ledger = &self.ledger;
        let result = self
            .retry
            .run("Account lookup", move || ledger.account(address))
            .await;
        metrics::record_account_lookup(result.is_ok());
        result
    }

    /// Pay `amount` of `asset` to `destination`. Never expires.
    pub async fn submit_payment(
        &self,
        source: &Identity,
        destination: &str,
        asset: Asset,
        amount: &str,
    ) -> OrchestratorResult<SubmissionResult> {
        let op = Operation::payment(destination, asset, amount)?;
        self.submit(source, op).await
    }

    /// Set a data entry, or delete it when `value` is `None`
    pub async fn submit_manage_data(
        &self,
        source: &Identity,
        name: &str,
        value: Option<&[u8]>,
    ) -> OrchestratorResult<SubmissionResult> {
        let op = Operation::manage_data(name, value)?;
        self.submit(source, op).await
    }

    /// Change account options. At least one field must be set.
    pub async fn submit_set_options(
        &self,
        source: &Identity,
        options: SetOptions,
    ) -> OrchestratorResult<SubmissionResult> {
        let op = Operation::set_options(options)?;
        self.submit(source, op).await
    }

    /// Submit a single operation with the validity window its kind calls for
    pub async fn submit(
        &self,
        source: &Identity,
        operation: Operation,
    ) -> OrchestratorResult<SubmissionResult> {
        let params = TransactionParams::new(default_validity(&operation));
        self.submit_with(source, vec![operation], params).await
    }

    /// Run the full pipeline for a batch of operations
    pub async fn submit_with(
        &self,
        source: &Identity,
        operations: Vec<Operation>,
        params: TransactionParams,
    ) -> OrchestratorResult<SubmissionResult> {
        validate_batch(&operations, &params)?;
        let label = operations_label(&operations);

        let signed = self.prepare(source, operations, params).await?;

        match self.ledger.submit(&signed).await {
            Ok(result) => {
                info!(
                    source = %source.address(),
                    operation = label,
                    sequence = signed.tx.sequence,
                    hash = %result.hash,
                    ledger = result.ledger,
                    "Transaction accepted"
                );
                metrics::record_tx_submitted(label);
                Ok(result)
            }
            Err(e) => {
                warn!(
                    source = %source.address(),
                    operation = label,
                    sequence = signed.tx.sequence,
                    error = %e,
                    "Transaction rejected"
                );
                metrics::record_tx_rejected(label);
                Err(e)
            }
        }
    }

    /// Look up the source account, assemble the request and sign it
    async fn prepare(
        &self,
        source: &Identity,
        operations: Vec<Operation>,
        params: TransactionParams,
    ) -> OrchestratorResult<SignedTransaction> {
        let account = self.account(source.address()).await?;

        let request = build_request(&account, operations, params, (self.now_fn)())?;
        debug!(
            source = %request.source_account,
            sequence = request.sequence,
            fee = request.fee,
            max_time = request.time_bounds.max_time,
            "Built transaction"
        );

        request.sign(&self.passphrase, source)
    }
}

/// Long-lived setup operations never expire; data and option changes expire
/// quickly so a lost response cannot be replayed much later.
pub fn default_validity(operation: &Operation) -> Validity {
    match operation {
        Operation::ManageData { .. } | Operation::SetOptions(_) => {
            Validity::Timeout(MUTATION_TIMEOUT_SECS)
        }
        Operation::Payment { .. }
        | Operation::CreateAccount { .. }
        | Operation::ChangeTrust { .. } => Validity::Infinite,
    }
}

fn operations_label(operations: &[Operation]) -> &'static str {
    match operations {
        [single] => single.kind(),
        _ => "batch",
    }
}
