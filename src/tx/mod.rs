//! Transaction model: operations, request assembly and signed envelopes

mod amount;
mod builder;
mod envelope;
mod operation;
mod wire;

pub use amount::{Amount, AMOUNT_DECIMALS};
pub use builder::{
    build_request, validate_batch, TimeBounds, TransactionParams, TransactionRequest, Validity, MAX_OPERATIONS,
    MIN_BASE_FEE,
};
pub use envelope::{network_id, DecoratedSignature, SignedTransaction, MAX_SIGNATURES};
pub use operation::{
    flags, Asset, Operation, SetOptions, SignerKey, MAX_ASSET_CODE_LEN, MAX_DATA_LEN,
    MAX_HOME_DOMAIN_LEN,
};
