//! In-memory ledger double shared by the integration tests.
//!
//! Enforces the rules the orchestrator relies on: signatures checked against
//! the ledger's own passphrase, sequence numbers exactly current + 1, trust
//! lines before credit payments, zero master weight locking an account.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use diam_orchestrator::ledger::{AccountState, Balance, LedgerApi, SubmissionResult};
use diam_orchestrator::tx::{Amount, Asset, Operation, SignedTransaction, SignerKey};
use diam_orchestrator::{LookupFailure, OrchestratorError, OrchestratorResult};

pub const PASSPHRASE: &str = "Diamante Testnet 2024";

const STROOPS_PER_UNIT: i64 = 10_000_000;

/// A call observed by the ledger, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Account(String),
    Submit(Vec<&'static str>),
}

#[derive(Debug, Clone)]
pub struct Account {
    pub sequence: i64,
    pub native: i64,
    pub trustlines: HashMap<Asset, i64>,
    pub master_weight: u8,
    pub data: HashMap<String, Vec<u8>>,
    pub signers: Vec<SignerKey>,
}

impl Account {
    fn new(sequence: i64, native: i64) -> Self {
        Self {
            sequence,
            native,
            trustlines: HashMap::new(),
            master_weight: 1,
            data: HashMap::new(),
            signers: Vec::new(),
        }
    }

    /// Balance of a credit asset in whole units, if trusted
    pub fn credit_units(&self, asset: &Asset) -> Option<i64> {
        self.trustlines.get(asset).map(|s| s / STROOPS_PER_UNIT)
    }
}

struct State {
    accounts: HashMap<String, Account>,
    ledger_seq: u32,
    calls: Vec<Call>,
    /// Operation kind -> result code forced on transactions carrying it
    forced_failures: HashMap<&'static str, &'static str>,
}

pub struct InMemoryLedger {
    passphrase: String,
    state: Mutex<State>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_passphrase(PASSPHRASE)
    }

    pub fn with_passphrase(passphrase: &str) -> Self {
        Self {
            passphrase: passphrase.to_string(),
            state: Mutex::new(State {
                accounts: HashMap::new(),
                ledger_seq: 1,
                calls: Vec::new(),
                forced_failures: HashMap::new(),
            }),
        }
    }

    /// Create an account holding `units` of the native asset
    pub fn fund(&self, address: &str, units: i64) {
        let mut state = self.state.lock().unwrap();
        let sequence = (state.ledger_seq as i64) << 32;
        state
            .accounts
            .insert(address.to_string(), Account::new(sequence, units * STROOPS_PER_UNIT));
    }

    /// Fail every transaction carrying an operation of `kind` with `code`
    pub fn fail_operation(&self, kind: &'static str, code: &'static str) {
        self.state.lock().unwrap().forced_failures.insert(kind, code);
    }

    /// Addresses looked up, in order
    pub fn looked_up(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Account(address) => Some(address),
                Call::Submit(_) => None,
            })
            .collect()
    }

    pub fn snapshot(&self, address: &str) -> Option<Account> {
        self.state.lock().unwrap().accounts.get(address).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Operation kinds of every submitted transaction, in order
    pub fn submitted_kinds(&self) -> Vec<Vec<&'static str>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Submit(kinds) => Some(kinds),
                Call::Account(_) => None,
            })
            .collect()
    }
}

fn rejected(reason: &str) -> OrchestratorError {
    OrchestratorError::Submission {
        reason: reason.to_string(),
    }
}

fn apply(
    accounts: &mut HashMap<String, Account>,
    source: &str,
    op: &Operation,
    ledger_seq: u32,
) -> Result<(), &'static str> {
    match op {
        Operation::CreateAccount {
            destination,
            starting_balance,
        } => {
            if accounts.contains_key(destination) {
                return Err("op_already_exists");
            }
            debit_native(accounts, source, *starting_balance)?;
            accounts.insert(
                destination.clone(),
                Account::new((ledger_seq as i64) << 32, starting_balance.stroops()),
            );
            Ok(())
        }
        Operation::Payment {
            destination,
            asset,
            amount,
        } => {
            if !accounts.contains_key(destination) {
                return Err("op_no_destination");
            }
            match asset {
                Asset::Native => {
                    debit_native(accounts, source, *amount)?;
                    if let Some(dest) = accounts.get_mut(destination) {
                        dest.native += amount.stroops();
                    }
                    Ok(())
                }
                Asset::Credit { issuer, .. } => {
                    if destination != issuer
                        && !accounts[destination].trustlines.contains_key(asset)
                    {
                        return Err("op_no_trust");
                    }
                    if source != issuer {
                        let src = accounts.get_mut(source).ok_or("op_src_no_trust")?;
                        let line = src.trustlines.get_mut(asset).ok_or("op_src_no_trust")?;
                        if *line < amount.stroops() {
                            return Err("op_underfunded");
                        }
                        *line -= amount.stroops();
                    }
                    if destination != issuer {
                        if let Some(line) = accounts
                            .get_mut(destination)
                            .and_then(|d| d.trustlines.get_mut(asset))
                        {
                            *line += amount.stroops();
                        }
                    }
                    Ok(())
                }
            }
        }
        Operation::ChangeTrust { line, .. } => {
            let Asset::Credit { issuer, .. } = line else {
                return Err("op_malformed");
            };
            if !accounts.contains_key(issuer) {
                return Err("op_no_issuer");
            }
            if let Some(src) = accounts.get_mut(source) {
                src.trustlines.entry(line.clone()).or_insert(0);
            }
            Ok(())
        }
        Operation::ManageData { name, value } => {
            let src = accounts.get_mut(source).ok_or("op_malformed")?;
            match value {
                Some(value) => {
                    src.data.insert(name.clone(), value.clone());
                }
                None => {
                    src.data.remove(name).ok_or("op_data_name_not_found")?;
                }
            }
            Ok(())
        }
        Operation::SetOptions(options) => {
            let src = accounts.get_mut(source).ok_or("op_malformed")?;
            if let Some(weight) = options.master_weight {
                src.master_weight = weight;
            }
            if let Some(signer) = &options.signer {
                src.signers.retain(|s| s.address != signer.address);
                if signer.weight > 0 {
                    src.signers.push(signer.clone());
                }
            }
            Ok(())
        }
    }
}

fn debit_native(
    accounts: &mut HashMap<String, Account>,
    source: &str,
    amount: Amount,
) -> Result<(), &'static str> {
    let src = accounts.get_mut(source).ok_or("op_underfunded")?;
    if src.native < amount.stroops() {
        return Err("op_underfunded");
    }
    src.native -= amount.stroops();
    Ok(())
}

#[async_trait]
impl LedgerApi for InMemoryLedger {
    async fn account(&self, address: &str) -> OrchestratorResult<AccountState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Account(address.to_string()));

        let account = state
            .accounts
            .get(address)
            .ok_or_else(|| OrchestratorError::AccountLookup {
                address: address.to_string(),
                reason: LookupFailure::NotFound,
            })?;

        Ok(AccountState {
            address: address.to_string(),
            sequence: account.sequence,
            balances: vec![Balance {
                asset_type: "native".to_string(),
                asset_code: None,
                asset_issuer: None,
                balance: account.native.to_string(),
            }],
        })
    }

    async fn submit(&self, envelope: &SignedTransaction) -> OrchestratorResult<SubmissionResult> {
        // Only what survives the wire encoding reaches the ledger
        let envelope = SignedTransaction::decode(&envelope.encode()?)
            .map_err(|_| rejected("tx_malformed"))?;

        let mut state = self.state.lock().unwrap();
        let kinds = envelope.tx.operations.iter().map(Operation::kind).collect();
        state.calls.push(Call::Submit(kinds));

        let tx = &envelope.tx;
        let source = tx.source_account.clone();
        let account = state
            .accounts
            .get(&source)
            .ok_or_else(|| rejected("tx_no_source_account"))?;

        if account.master_weight == 0 || !envelope.is_signed_by(&source, &self.passphrase) {
            return Err(rejected("tx_bad_auth"));
        }
        if tx.sequence != account.sequence + 1 {
            return Err(rejected("tx_bad_seq"));
        }
        let now = chrono::Utc::now().timestamp() as u64;
        if tx.time_bounds.max_time != 0 && now > tx.time_bounds.max_time {
            return Err(rejected("tx_too_late"));
        }
        if (tx.fee as usize) < 100 * tx.operations.len() {
            return Err(rejected("tx_insufficient_fee"));
        }

        let ledger_seq = state.ledger_seq;
        let mut accounts = state.accounts.clone();
        let mut failure = None;
        for op in &tx.operations {
            if let Some(code) = state.forced_failures.get(op.kind()) {
                failure = Some(*code);
                break;
            }
            if let Err(code) = apply(&mut accounts, &source, op, ledger_seq) {
                failure = Some(code);
                break;
            }
        }

        // A failed transaction still consumes its sequence number
        match failure {
            Some(code) => {
                if let Some(acct) = state.accounts.get_mut(&source) {
                    acct.sequence = tx.sequence;
                }
                Err(rejected(&format!("tx_failed [{}]", code)))
            }
            None => {
                if let Some(acct) = accounts.get_mut(&source) {
                    acct.sequence = tx.sequence;
                }
                state.accounts = accounts;
                state.ledger_seq += 1;
                Ok(SubmissionResult {
                    hash: envelope.hash_hex(&self.passphrase)?,
                    ledger: ledger_seq,
                })
            }
        }
    }
}
