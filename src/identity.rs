//! Account identities and credential providers.
//!
//! # Security
//! - Seeds come from the environment or from the caller, never from literals
//! - Key material is never logged, serialized or included in `Debug` output

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use stellar_strkey::ed25519::{PrivateKey, PublicKey};

use crate::error::{OrchestratorError, OrchestratorResult};

/// A keyed account able to authorize transactions.
#[derive(Clone)]
pub struct Identity {
    signing_key: SigningKey,
    address: String,
}

impl Identity {
    /// Generate a fresh random keypair.
    pub fn random() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Parse a strkey secret seed (`S...`).
    pub fn from_secret(seed: &str) -> OrchestratorResult<Self> {
        let private = PrivateKey::from_string(seed.trim())
            .map_err(|_| OrchestratorError::Signing("Invalid secret seed".to_string()))?;
        Ok(Self::from_signing_key(SigningKey::from_bytes(&private.0)))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = PublicKey(signing_key.verifying_key().to_bytes()).to_string();
        Self {
            signing_key,
            address,
        }
    }

    /// Public account address (`G...`).
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Export the secret seed. Only for callers that need to hand the key on.
    pub fn secret_seed(&self) -> String {
        PrivateKey(self.signing_key.to_bytes()).to_string()
    }

    /// Last four bytes of the public key, used to match signatures to signers.
    pub fn hint(&self) -> [u8; 4] {
        let key = self.signing_key.verifying_key().to_bytes();
        [key[28], key[29], key[30], key[31]]
    }

    /// Sign raw bytes.
    pub fn sign(&self, payload: &[u8]) -> [u8; 64] {
        self.signing_key.sign(payload).to_bytes()
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Decode a public account address into its raw key bytes.
pub fn decode_address(address: &str) -> OrchestratorResult<[u8; 32]> {
    PublicKey::from_string(address)
        .map(|key| key.0)
        .map_err(|_| OrchestratorError::Validation(format!("Invalid account address: {}", address)))
}

/// Verify a signature made by the account at `address`.
pub fn verify_signature(address: &str, payload: &[u8], signature: &[u8; 64]) -> bool {
    let Ok(key_bytes) = decode_address(address) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    key.verify(payload, &Signature::from_bytes(signature)).is_ok()
}

/// Supplies the identity that authorizes transactions.
///
/// Injected at the composition root so that no library code embeds secrets.
pub trait CredentialProvider: Send + Sync {
    fn source_identity(&self) -> OrchestratorResult<Identity>;
}

/// Reads a secret seed from a named environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var_name: String,
}

impl EnvCredentials {
    pub fn new(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
        }
    }
}

impl CredentialProvider for EnvCredentials {
    fn source_identity(&self) -> OrchestratorResult<Identity> {
        let seed = std::env::var(&self.var_name).map_err(|_| {
            OrchestratorError::Config(format!(
                "Environment variable {} not set",
                self.var_name
            ))
        })?;
        Identity::from_secret(&seed)
    }
}

/// Hands out an identity that was already parsed.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Identity);

impl StaticCredentials {
    pub fn new(identity: Identity) -> Self {
        Self(identity)
    }
}

impl CredentialProvider for StaticCredentials {
    fn source_identity(&self) -> OrchestratorResult<Identity> {
        Ok(self.0.clone())
    }
}
