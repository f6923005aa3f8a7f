//! Signing, hashing and wire encoding of transactions
//!
//! A signature covers `sha256(network_id || ENVELOPE_TYPE_TX || tx)` where
//! `network_id = sha256(passphrase)` and `tx` is the XDR transaction. Binding
//! the passphrase into the payload scopes every signature to one network
//! instance. On the wire an envelope is base64 XDR.

use sha2::{Digest, Sha256};
use stellar_xdr::curr::{self as xdr, Limits, ReadXdr, WriteXdr};

use super::builder::TransactionRequest;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::identity::{verify_signature, Identity};

/// Most signatures an envelope may carry
pub const MAX_SIGNATURES: usize = 20;

/// Identifier of a network instance derived from its passphrase
pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

/// Signature plus the hint identifying which key produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedSignature {
    pub hint: [u8; 4],
    pub signature: [u8; 64],
}

/// A transaction with one or more signatures attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx: TransactionRequest,
    pub signatures: Vec<DecoratedSignature>,
}

fn signing_error(e: impl std::fmt::Display) -> OrchestratorError {
    OrchestratorError::Signing(format!("Failed to encode transaction: {}", e))
}

impl TransactionRequest {
    /// Hash that signatures cover on the network named by `passphrase`
    pub fn hash(&self, passphrase: &str) -> OrchestratorResult<[u8; 32]> {
        if passphrase.is_empty() {
            return Err(OrchestratorError::Signing(
                "Network passphrase must not be empty".to_string(),
            ));
        }
        let payload = xdr::TransactionSignaturePayload {
            network_id: xdr::Hash(network_id(passphrase)),
            tagged_transaction: xdr::TransactionSignaturePayloadTaggedTransaction::Tx(
                self.to_xdr().map_err(signing_error)?,
            ),
        };
        let bytes = payload.to_xdr(Limits::none()).map_err(signing_error)?;
        Ok(Sha256::digest(bytes).into())
    }

    /// Sign with `signer` for the network named by `passphrase`
    pub fn sign(self, passphrase: &str, signer: &Identity) -> OrchestratorResult<SignedTransaction> {
        SignedTransaction {
            tx: self,
            signatures: Vec::new(),
        }
        .add_signature(passphrase, signer)
    }
}

impl SignedTransaction {
    /// Attach another signature
    pub fn add_signature(mut self, passphrase: &str, signer: &Identity) -> OrchestratorResult<Self> {
        if self.signatures.len() >= MAX_SIGNATURES {
            return Err(OrchestratorError::Signing(format!(
                "Transaction already carries {} signatures",
                MAX_SIGNATURES
            )));
        }
        let hash = self.tx.hash(passphrase)?;
        self.signatures.push(DecoratedSignature {
            hint: signer.hint(),
            signature: signer.sign(&hash),
        });
        Ok(self)
    }

    /// Hex transaction hash as reported by the network
    pub fn hash_hex(&self, passphrase: &str) -> OrchestratorResult<String> {
        self.tx.hash(passphrase).map(hex::encode)
    }

    /// Whether `address` signed this transaction for the network named by `passphrase`
    pub fn is_signed_by(&self, address: &str, passphrase: &str) -> bool {
        let Ok(hash) = self.tx.hash(passphrase) else {
            return false;
        };
        self.signatures
            .iter()
            .any(|sig| verify_signature(address, &hash, &sig.signature))
    }

    pub fn to_xdr(&self) -> OrchestratorResult<xdr::TransactionEnvelope> {
        let signatures = self
            .signatures
            .iter()
            .map(|sig| -> OrchestratorResult<xdr::DecoratedSignature> {
                let signature = sig.signature.to_vec().try_into().map_err(signing_error)?;
                Ok(xdr::DecoratedSignature {
                    hint: xdr::SignatureHint(sig.hint),
                    signature: xdr::Signature(signature),
                })
            })
            .collect::<OrchestratorResult<Vec<_>>>()?;

        Ok(xdr::TransactionEnvelope::Tx(xdr::TransactionV1Envelope {
            tx: self.tx.to_xdr().map_err(signing_error)?,
            signatures: signatures.try_into().map_err(signing_error)?,
        }))
    }

    /// Base64 XDR envelope submitted to the ledger API
    pub fn encode(&self) -> OrchestratorResult<String> {
        self.to_xdr()?
            .to_xdr_base64(Limits::none())
            .map_err(signing_error)
    }

    pub fn decode(encoded: &str) -> OrchestratorResult<Self> {
        let malformed = |e: &dyn std::fmt::Display| {
            OrchestratorError::Validation(format!("Malformed envelope: {}", e))
        };

        let envelope = xdr::TransactionEnvelope::from_xdr_base64(encoded, Limits::none())
            .map_err(|e| malformed(&e))?;
        let xdr::TransactionEnvelope::Tx(v1) = envelope else {
            return Err(malformed(&"only v1 transaction envelopes are supported"));
        };

        let signatures = v1
            .signatures
            .iter()
            .map(|sig| -> OrchestratorResult<DecoratedSignature> {
                let signature = <[u8; 64]>::try_from(sig.signature.0.as_slice())
                    .map_err(|_| malformed(&"signature is not 64 bytes"))?;
                Ok(DecoratedSignature {
                    hint: sig.hint.0,
                    signature,
                })
            })
            .collect::<OrchestratorResult<Vec<_>>>()?;

        Ok(SignedTransaction {
            tx: TransactionRequest::from_xdr(&v1.tx)?,
            signatures,
        })
    }
}
