//! Transaction request assembly

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::operation::Operation;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::ledger::AccountState;

/// Minimum fee per operation, in stroops
pub const MIN_BASE_FEE: u32 = 100;

/// Most operations a single transaction may carry
pub const MAX_OPERATIONS: usize = 100;

/// Validity window policy applied when a request is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Never expires
    Infinite,
    /// Expires this many seconds after it is built
    Timeout(u64),
}

/// Validity window embedded in the transaction. `max_time == 0` means no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

impl TimeBounds {
    pub fn infinite() -> Self {
        Self {
            min_time: 0,
            max_time: 0,
        }
    }

    pub fn is_infinite(&self) -> bool {
        self.max_time == 0
    }

    fn from_policy(validity: Validity, now: DateTime<Utc>) -> Self {
        match validity {
            Validity::Infinite => Self::infinite(),
            Validity::Timeout(secs) => Self {
                min_time: 0,
                max_time: (now.timestamp().max(0) as u64).saturating_add(secs),
            },
        }
    }
}

/// An unsigned transaction ready for signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub source_account: String,
    pub sequence: i64,
    /// Total fee in stroops
    pub fee: u32,
    pub time_bounds: TimeBounds,
    pub operations: Vec<Operation>,
}

/// Submission parameters shared by every transaction
#[derive(Debug, Clone, Copy)]
pub struct TransactionParams {
    pub base_fee: u32,
    pub validity: Validity,
    pub increment_sequence: bool,
}

impl TransactionParams {
    pub fn new(validity: Validity) -> Self {
        Self {
            base_fee: MIN_BASE_FEE,
            validity,
            increment_sequence: true,
        }
    }
}

/// Check a batch and its parameters against the network's static limits.
///
/// Needs no ledger state, so callers run it before any network call.
pub fn validate_batch(operations: &[Operation], params: &TransactionParams) -> OrchestratorResult<()> {
    if operations.is_empty() {
        return Err(OrchestratorError::Validation(
            "Transaction must carry at least one operation".to_string(),
        ));
    }
    if operations.len() > MAX_OPERATIONS {
        return Err(OrchestratorError::Validation(format!(
            "Transaction carries {} operations, maximum is {}",
            operations.len(),
            MAX_OPERATIONS
        )));
    }
    if params.base_fee < MIN_BASE_FEE {
        return Err(OrchestratorError::Validation(format!(
            "Base fee {} is below the network minimum {}",
            params.base_fee, MIN_BASE_FEE
        )));
    }
    operations.iter().try_for_each(Operation::validate)
}

/// Combine a freshly fetched account with operations into a request.
///
/// The sequence number is the account's current sequence plus one; the fee is
/// the base fee times the operation count.
pub fn build_request(
    account: &AccountState,
    operations: Vec<Operation>,
    params: TransactionParams,
    now: DateTime<Utc>,
) -> OrchestratorResult<TransactionRequest> {
    validate_batch(&operations, &params)?;

    let sequence = if params.increment_sequence {
        account.sequence.checked_add(1).ok_or_else(|| {
            OrchestratorError::Validation(format!(
                "Sequence number of {} is exhausted",
                account.address
            ))
        })?
    } else {
        account.sequence
    };

    let fee = u32::try_from(operations.len())
        .ok()
        .and_then(|count| params.base_fee.checked_mul(count))
        .ok_or_else(|| OrchestratorError::Validation("Transaction fee overflows".to_string()))?;

    Ok(TransactionRequest {
        source_account: account.address.clone(),
        sequence,
        fee,
        time_bounds: TimeBounds::from_policy(params.validity, now),
        operations,
    })
}
