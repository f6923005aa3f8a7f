//! Ledger operations and the values they carry

use serde::{Deserialize, Serialize};
use std::fmt;

use super::amount::Amount;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::identity::decode_address;

/// Longest data entry name or value the network accepts, in bytes
pub const MAX_DATA_LEN: usize = 64;

/// Longest home domain the network accepts, in bytes
pub const MAX_HOME_DOMAIN_LEN: usize = 32;

/// Longest credit asset code
pub const MAX_ASSET_CODE_LEN: usize = 12;

/// Account authorization flags for `SetOptions`
pub mod flags {
    pub const AUTH_REQUIRED: u32 = 0x1;
    pub const AUTH_REVOCABLE: u32 = 0x2;
    pub const AUTH_IMMUTABLE: u32 = 0x4;
    pub const AUTH_CLAWBACK_ENABLED: u32 = 0x8;

    pub const ALL: u32 = AUTH_REQUIRED | AUTH_REVOCABLE | AUTH_IMMUTABLE | AUTH_CLAWBACK_ENABLED;
}

/// Asset identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Asset {
    Native,
    Credit { code: String, issuer: String },
}

impl Asset {
    /// Validated credit asset
    pub fn credit(code: &str, issuer: &str) -> OrchestratorResult<Self> {
        let asset = Asset::Credit {
            code: code.to_string(),
            issuer: issuer.to_string(),
        };
        asset.validate()?;
        Ok(asset)
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    fn validate(&self) -> OrchestratorResult<()> {
        match self {
            Asset::Native => Ok(()),
            Asset::Credit { code, issuer } => {
                if code.is_empty()
                    || code.len() > MAX_ASSET_CODE_LEN
                    || !code.bytes().all(|b| b.is_ascii_alphanumeric())
                {
                    return Err(OrchestratorError::Validation(format!(
                        "Asset code must be 1-{} alphanumeric characters, got {:?}",
                        MAX_ASSET_CODE_LEN, code
                    )));
                }
                decode_address(issuer)?;
                Ok(())
            }
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str("native"),
            Asset::Credit { code, issuer } => write!(f, "{}:{}", code, issuer),
        }
    }
}

/// Additional signer attached to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerKey {
    pub address: String,
    /// Zero removes the signer
    pub weight: u8,
}

/// Account option changes. Unset fields are left untouched on the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clear_flags: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_flags: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_weight: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_threshold: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium_threshold: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_threshold: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<SignerKey>,
}

impl SetOptions {
    /// Revoke the account's own key
    pub fn lock_master_key() -> Self {
        Self {
            master_weight: Some(0),
            ..Default::default()
        }
    }

    pub fn with_signer(address: impl Into<String>, weight: u8) -> Self {
        Self {
            signer: Some(SignerKey {
                address: address.into(),
                weight,
            }),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == SetOptions::default()
    }

    fn validate(&self) -> OrchestratorResult<()> {
        if self.is_empty() {
            return Err(OrchestratorError::Validation(
                "SetOptions must change at least one field".to_string(),
            ));
        }
        if let Some(dest) = &self.inflation_destination {
            decode_address(dest)?;
        }
        for flags in [self.set_flags, self.clear_flags].into_iter().flatten() {
            if flags & !flags::ALL != 0 {
                return Err(OrchestratorError::Validation(format!(
                    "Unknown account flags: {:#x}",
                    flags
                )));
            }
        }
        if let (Some(set), Some(clear)) = (self.set_flags, self.clear_flags) {
            if set & clear != 0 {
                return Err(OrchestratorError::Validation(
                    "The same flag cannot be both set and cleared".to_string(),
                ));
            }
        }
        if let Some(domain) = &self.home_domain {
            if domain.len() > MAX_HOME_DOMAIN_LEN {
                return Err(OrchestratorError::Validation(format!(
                    "Home domain exceeds {} bytes",
                    MAX_HOME_DOMAIN_LEN
                )));
            }
        }
        if let Some(signer) = &self.signer {
            decode_address(&signer.address)?;
        }
        Ok(())
    }
}

/// A single requested ledger action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Payment {
        destination: String,
        asset: Asset,
        amount: Amount,
    },
    /// `value: None` deletes the entry; `Some(vec![])` stores an empty value
    ManageData {
        name: String,
        value: Option<Vec<u8>>,
    },
    SetOptions(SetOptions),
    CreateAccount {
        destination: String,
        starting_balance: Amount,
    },
    ChangeTrust {
        line: Asset,
        /// `None` trusts up to the maximum amount
        limit: Option<Amount>,
    },
}

impl Operation {
    pub fn payment(destination: &str, asset: Asset, amount: &str) -> OrchestratorResult<Self> {
        let op = Operation::Payment {
            destination: destination.to_string(),
            asset,
            amount: amount.parse()?,
        };
        op.validate()?;
        Ok(op)
    }

    pub fn manage_data(name: &str, value: Option<&[u8]>) -> OrchestratorResult<Self> {
        let op = Operation::ManageData {
            name: name.to_string(),
            value: value.map(<[u8]>::to_vec),
        };
        op.validate()?;
        Ok(op)
    }

    pub fn set_options(options: SetOptions) -> OrchestratorResult<Self> {
        let op = Operation::SetOptions(options);
        op.validate()?;
        Ok(op)
    }

    pub fn create_account(destination: &str, starting_balance: &str) -> OrchestratorResult<Self> {
        let op = Operation::CreateAccount {
            destination: destination.to_string(),
            starting_balance: starting_balance.parse()?,
        };
        op.validate()?;
        Ok(op)
    }

    pub fn change_trust(line: Asset, limit: Option<Amount>) -> OrchestratorResult<Self> {
        let op = Operation::ChangeTrust { line, limit };
        op.validate()?;
        Ok(op)
    }

    /// Operation kind label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Payment { .. } => "payment",
            Operation::ManageData { .. } => "manage_data",
            Operation::SetOptions(_) => "set_options",
            Operation::CreateAccount { .. } => "create_account",
            Operation::ChangeTrust { .. } => "change_trust",
        }
    }

    /// Check the operation against the network's static limits
    pub fn validate(&self) -> OrchestratorResult<()> {
        match self {
            Operation::Payment {
                destination, asset, ..
            } => {
                decode_address(destination)?;
                asset.validate()
            }
            Operation::ManageData { name, value } => {
                if name.is_empty() || name.len() > MAX_DATA_LEN {
                    return Err(OrchestratorError::Validation(format!(
                        "Data name must be 1-{} bytes",
                        MAX_DATA_LEN
                    )));
                }
                if let Some(value) = value {
                    if value.len() > MAX_DATA_LEN {
                        return Err(OrchestratorError::Validation(format!(
                            "Data value is {} bytes, maximum is {}",
                            value.len(),
                            MAX_DATA_LEN
                        )));
                    }
                }
                Ok(())
            }
            Operation::SetOptions(options) => options.validate(),
            Operation::CreateAccount { destination, .. } => decode_address(destination).map(|_| ()),
            Operation::ChangeTrust { line, .. } => {
                if line.is_native() {
                    return Err(OrchestratorError::Validation(
                        "Cannot establish a trust line to the native asset".to_string(),
                    ));
                }
                line.validate()
            }
        }
    }
}
