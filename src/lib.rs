//! Transaction construction and submission for Diamante/Stellar-family ledgers.
//!
//! Every transaction follows the same pipeline: fetch the source account,
//! build the operations, assemble the request with the next sequence number,
//! sign it for one network passphrase, submit it and surface the result.

pub mod config;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod metrics;
pub mod orchestrator;
pub mod tx;

pub use error::{IssuanceStep, LookupFailure, OrchestratorError, OrchestratorResult};
pub use identity::{CredentialProvider, EnvCredentials, Identity, StaticCredentials};
pub use ledger::{AccountState, FaucetClient, HorizonClient, LedgerApi, SubmissionResult};
pub use orchestrator::{IssuedAsset, Orchestrator};
