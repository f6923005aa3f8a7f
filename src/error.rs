//! Error types for the orchestrator

use std::fmt;
use thiserror::Error;

/// Why an account lookup failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    /// The network has no account at this address
    NotFound,
    /// The ledger API could not be reached or answered with a server error
    Unreachable(String),
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupFailure::NotFound => write!(f, "account not found"),
            LookupFailure::Unreachable(msg) => write!(f, "ledger API unreachable: {}", msg),
        }
    }
}

/// The five steps of the asset issuance flow, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceStep {
    ActivateIssuer,
    EstablishTrust,
    TransferSupply,
    LockIssuer,
    Finish,
}

impl IssuanceStep {
    /// Short label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            IssuanceStep::ActivateIssuer => "activate_issuer",
            IssuanceStep::EstablishTrust => "establish_trust",
            IssuanceStep::TransferSupply => "transfer_supply",
            IssuanceStep::LockIssuer => "lock_issuer",
            IssuanceStep::Finish => "finish",
        }
    }
}

impl fmt::Display for IssuanceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the orchestrator
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Account lookup failed for {address}: {reason}")]
    AccountLookup {
        address: String,
        reason: LookupFailure,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Transaction rejected: {reason}")]
    Submission { reason: String },

    #[error("Asset issuance failed at step {step}: {source}")]
    SagaStep {
        step: IssuanceStep,
        #[source]
        source: Box<OrchestratorError>,
    },

    #[error("Faucet could not fund {address}: {message}")]
    Faucet { address: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl OrchestratorError {
    /// Check if error is retryable.
    ///
    /// Only lookups that never reached the ledger qualify. Submissions are
    /// never retried since the first attempt may already be committed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrchestratorError::AccountLookup {
                reason: LookupFailure::Unreachable(_),
                ..
            }
        )
    }

    /// Issuance step that failed, if this error came out of the issuance flow
    pub fn failed_step(&self) -> Option<IssuanceStep> {
        match self {
            OrchestratorError::SagaStep { step, .. } => Some(*step),
            _ => None,
        }
    }

    pub(crate) fn in_step(self, step: IssuanceStep) -> Self {
        OrchestratorError::SagaStep {
            step,
            source: Box::new(self),
        }
    }
}

/// Result type for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
