//! Conversion between the transaction model and the network's XDR types

use stellar_strkey::ed25519::PublicKey;
use stellar_xdr::curr as xdr;

use super::amount::Amount;
use super::builder::{TimeBounds, TransactionRequest};
use super::operation::{Asset, Operation, SetOptions, SignerKey};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::identity::decode_address;

fn malformed(what: impl std::fmt::Display) -> OrchestratorError {
    OrchestratorError::Validation(format!("Malformed transaction: {}", what))
}

fn unsupported(what: &str) -> OrchestratorError {
    OrchestratorError::Validation(format!("Unsupported transaction feature: {}", what))
}

fn address_of(key: &xdr::Uint256) -> String {
    PublicKey(key.0).to_string()
}

fn account_id(address: &str) -> OrchestratorResult<xdr::AccountId> {
    Ok(xdr::AccountId(xdr::PublicKey::PublicKeyTypeEd25519(
        xdr::Uint256(decode_address(address)?),
    )))
}

fn account_address(id: &xdr::AccountId) -> String {
    let xdr::PublicKey::PublicKeyTypeEd25519(key) = &id.0;
    address_of(key)
}

fn muxed_account(address: &str) -> OrchestratorResult<xdr::MuxedAccount> {
    Ok(xdr::MuxedAccount::Ed25519(xdr::Uint256(decode_address(
        address,
    )?)))
}

fn muxed_address(account: &xdr::MuxedAccount) -> OrchestratorResult<String> {
    match account {
        xdr::MuxedAccount::Ed25519(key) => Ok(address_of(key)),
        xdr::MuxedAccount::MuxedEd25519(_) => Err(unsupported("muxed account")),
    }
}

fn padded<const N: usize>(code: &str) -> [u8; N] {
    let mut out = [0u8; N];
    out[..code.len()].copy_from_slice(code.as_bytes());
    out
}

fn unpadded(code: &[u8]) -> OrchestratorResult<String> {
    let end = code.iter().position(|b| *b == 0).unwrap_or(code.len());
    String::from_utf8(code[..end].to_vec()).map_err(malformed)
}

fn asset_to_xdr(asset: &Asset) -> OrchestratorResult<xdr::Asset> {
    match asset {
        Asset::Native => Ok(xdr::Asset::Native),
        Asset::Credit { code, issuer } if code.len() <= 4 => {
            Ok(xdr::Asset::CreditAlphanum4(xdr::AlphaNum4 {
                asset_code: xdr::AssetCode4(padded(code)),
                issuer: account_id(issuer)?,
            }))
        }
        Asset::Credit { code, issuer } => Ok(xdr::Asset::CreditAlphanum12(xdr::AlphaNum12 {
            asset_code: xdr::AssetCode12(padded(code)),
            issuer: account_id(issuer)?,
        })),
    }
}

fn asset_from_xdr(asset: &xdr::Asset) -> OrchestratorResult<Asset> {
    match asset {
        xdr::Asset::Native => Ok(Asset::Native),
        xdr::Asset::CreditAlphanum4(a) => Ok(Asset::Credit {
            code: unpadded(&a.asset_code.0)?,
            issuer: account_address(&a.issuer),
        }),
        xdr::Asset::CreditAlphanum12(a) => Ok(Asset::Credit {
            code: unpadded(&a.asset_code.0)?,
            issuer: account_address(&a.issuer),
        }),
    }
}

fn trust_line_to_xdr(line: &Asset) -> OrchestratorResult<xdr::ChangeTrustAsset> {
    match asset_to_xdr(line)? {
        xdr::Asset::Native => Ok(xdr::ChangeTrustAsset::Native),
        xdr::Asset::CreditAlphanum4(a) => Ok(xdr::ChangeTrustAsset::CreditAlphanum4(a)),
        xdr::Asset::CreditAlphanum12(a) => Ok(xdr::ChangeTrustAsset::CreditAlphanum12(a)),
    }
}

fn trust_line_from_xdr(line: &xdr::ChangeTrustAsset) -> OrchestratorResult<Asset> {
    match line {
        xdr::ChangeTrustAsset::Native => Ok(Asset::Native),
        xdr::ChangeTrustAsset::CreditAlphanum4(a) => {
            asset_from_xdr(&xdr::Asset::CreditAlphanum4(a.clone()))
        }
        xdr::ChangeTrustAsset::CreditAlphanum12(a) => {
            asset_from_xdr(&xdr::Asset::CreditAlphanum12(a.clone()))
        }
        xdr::ChangeTrustAsset::PoolShare(_) => Err(unsupported("liquidity pool trust line")),
    }
}

fn weight_from_xdr(value: Option<u32>) -> OrchestratorResult<Option<u8>> {
    value
        .map(|v| u8::try_from(v).map_err(|_| malformed(format!("weight {} out of range", v))))
        .transpose()
}

fn set_options_to_xdr(options: &SetOptions) -> OrchestratorResult<xdr::SetOptionsOp> {
    let home_domain = match &options.home_domain {
        Some(domain) => Some(xdr::String32(
            domain.as_bytes().to_vec().try_into().map_err(malformed)?,
        )),
        None => None,
    };
    let signer = match &options.signer {
        Some(signer) => Some(xdr::Signer {
            key: xdr::SignerKey::Ed25519(xdr::Uint256(decode_address(&signer.address)?)),
            weight: u32::from(signer.weight),
        }),
        None => None,
    };

    Ok(xdr::SetOptionsOp {
        inflation_dest: options
            .inflation_destination
            .as_deref()
            .map(account_id)
            .transpose()?,
        clear_flags: options.clear_flags,
        set_flags: options.set_flags,
        master_weight: options.master_weight.map(u32::from),
        low_threshold: options.low_threshold.map(u32::from),
        med_threshold: options.medium_threshold.map(u32::from),
        high_threshold: options.high_threshold.map(u32::from),
        home_domain,
        signer,
    })
}

fn set_options_from_xdr(op: &xdr::SetOptionsOp) -> OrchestratorResult<SetOptions> {
    let signer = match &op.signer {
        Some(xdr::Signer {
            key: xdr::SignerKey::Ed25519(key),
            weight,
        }) => Some(SignerKey {
            address: address_of(key),
            weight: weight_from_xdr(Some(*weight))?.unwrap_or_default(),
        }),
        Some(_) => return Err(unsupported("non-ed25519 signer")),
        None => None,
    };
    let home_domain = match &op.home_domain {
        Some(domain) => Some(domain.0.to_utf8_string().map_err(malformed)?),
        None => None,
    };

    Ok(SetOptions {
        inflation_destination: op.inflation_dest.as_ref().map(account_address),
        clear_flags: op.clear_flags,
        set_flags: op.set_flags,
        master_weight: weight_from_xdr(op.master_weight)?,
        low_threshold: weight_from_xdr(op.low_threshold)?,
        medium_threshold: weight_from_xdr(op.med_threshold)?,
        high_threshold: weight_from_xdr(op.high_threshold)?,
        home_domain,
        signer,
    })
}

impl Operation {
    /// Network representation, with no per-operation source account
    pub fn to_xdr(&self) -> OrchestratorResult<xdr::Operation> {
        let body = match self {
            Operation::Payment {
                destination,
                asset,
                amount,
            } => xdr::OperationBody::Payment(xdr::PaymentOp {
                destination: muxed_account(destination)?,
                asset: asset_to_xdr(asset)?,
                amount: amount.stroops(),
            }),
            Operation::ManageData { name, value } => {
                xdr::OperationBody::ManageData(xdr::ManageDataOp {
                    data_name: xdr::String64(
                        name.as_bytes().to_vec().try_into().map_err(malformed)?,
                    ),
                    data_value: match value {
                        Some(value) => {
                            Some(xdr::DataValue(value.clone().try_into().map_err(malformed)?))
                        }
                        None => None,
                    },
                })
            }
            Operation::SetOptions(options) => {
                xdr::OperationBody::SetOptions(set_options_to_xdr(options)?)
            }
            Operation::CreateAccount {
                destination,
                starting_balance,
            } => xdr::OperationBody::CreateAccount(xdr::CreateAccountOp {
                destination: account_id(destination)?,
                starting_balance: starting_balance.stroops(),
            }),
            Operation::ChangeTrust { line, limit } => {
                xdr::OperationBody::ChangeTrust(xdr::ChangeTrustOp {
                    line: trust_line_to_xdr(line)?,
                    limit: limit.map(|l| l.stroops()).unwrap_or(i64::MAX),
                })
            }
        };

        Ok(xdr::Operation {
            source_account: None,
            body,
        })
    }

    pub fn from_xdr(op: &xdr::Operation) -> OrchestratorResult<Self> {
        if op.source_account.is_some() {
            return Err(unsupported("per-operation source account"));
        }
        match &op.body {
            xdr::OperationBody::Payment(p) => Ok(Operation::Payment {
                destination: muxed_address(&p.destination)?,
                asset: asset_from_xdr(&p.asset)?,
                amount: Amount::from_stroops(p.amount)?,
            }),
            xdr::OperationBody::ManageData(m) => Ok(Operation::ManageData {
                name: m.data_name.0.to_utf8_string().map_err(malformed)?,
                value: m.data_value.as_ref().map(|v| v.0.to_vec()),
            }),
            xdr::OperationBody::SetOptions(s) => Ok(Operation::SetOptions(set_options_from_xdr(s)?)),
            xdr::OperationBody::CreateAccount(c) => Ok(Operation::CreateAccount {
                destination: account_address(&c.destination),
                starting_balance: Amount::from_stroops(c.starting_balance)?,
            }),
            xdr::OperationBody::ChangeTrust(c) => Ok(Operation::ChangeTrust {
                line: trust_line_from_xdr(&c.line)?,
                limit: match c.limit {
                    i64::MAX => None,
                    limit => Some(Amount::from_stroops(limit)?),
                },
            }),
            other => Err(unsupported(other.name())),
        }
    }
}

impl TransactionRequest {
    /// Network representation of the unsigned transaction
    pub fn to_xdr(&self) -> OrchestratorResult<xdr::Transaction> {
        let operations = self
            .operations
            .iter()
            .map(Operation::to_xdr)
            .collect::<OrchestratorResult<Vec<_>>>()?;

        Ok(xdr::Transaction {
            source_account: muxed_account(&self.source_account)?,
            fee: self.fee,
            seq_num: xdr::SequenceNumber(self.sequence),
            cond: xdr::Preconditions::Time(xdr::TimeBounds {
                min_time: xdr::TimePoint(self.time_bounds.min_time),
                max_time: xdr::TimePoint(self.time_bounds.max_time),
            }),
            memo: xdr::Memo::None,
            operations: operations.try_into().map_err(malformed)?,
            ext: xdr::TransactionExt::V0,
        })
    }

    /// Inverse of [`TransactionRequest::to_xdr`]. Transactions using features
    /// this crate never produces (memos, extended preconditions, Soroban data)
    /// are rejected.
    pub fn from_xdr(tx: &xdr::Transaction) -> OrchestratorResult<Self> {
        let time_bounds = match &tx.cond {
            xdr::Preconditions::Time(tb) => TimeBounds {
                min_time: tb.min_time.0,
                max_time: tb.max_time.0,
            },
            _ => return Err(unsupported("preconditions other than time bounds")),
        };
        if tx.memo != xdr::Memo::None {
            return Err(unsupported("memo"));
        }
        if tx.ext != xdr::TransactionExt::V0 {
            return Err(unsupported("transaction extension"));
        }

        Ok(TransactionRequest {
            source_account: muxed_address(&tx.source_account)?,
            sequence: tx.seq_num.0,
            fee: tx.fee,
            time_bounds,
            operations: tx
                .operations
                .iter()
                .map(Operation::from_xdr)
                .collect::<OrchestratorResult<_>>()?,
        })
    }
}
