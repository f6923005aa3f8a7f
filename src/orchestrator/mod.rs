//! Transaction orchestration
//!
//! The orchestrator:
//! 1. Fetches fresh account state for the source
//! 2. Builds and validates the requested operations
//! 3. Assembles, signs and submits the transaction
//! 4. Chains independent transactions into the asset issuance flow

pub mod engine;
pub mod issuance;

pub use engine::{default_validity, Orchestrator, MUTATION_TIMEOUT_SECS};
pub use issuance::{IssuedAsset, ISSUER_RESERVE};
