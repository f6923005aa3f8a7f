//! Asset issuance: five dependent transactions executed strictly in order.
//!
//! 1. The distributor creates a fresh issuer account
//! 2. The distributor trusts the new asset
//! 3. The issuer pays the full supply to the distributor
//! 4. The issuer sets its master weight to zero, fixing the supply forever
//! 5. The issuer address and the supply transfer hash are returned
//!
//! There is no rollback. Steps that were accepted stay on the ledger when a
//! later one fails; the error names the step that failed.

use std::future::Future;
use tracing::{info, warn};

use super::engine::Orchestrator;
use crate::error::{IssuanceStep, OrchestratorResult};
use crate::identity::Identity;
use crate::metrics;
use crate::tx::{Amount, Asset, Operation, SetOptions, TransactionParams, Validity};

/// Native balance the distributor gives the new issuer account
pub const ISSUER_RESERVE: &str = "4";

/// Outcome of a completed issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedAsset {
    pub asset: Asset,
    pub issuer_address: String,
    /// Hash of the transaction that moved the supply to the distributor
    pub supply_tx_hash: String,
    /// Hash of the transaction that locked the issuer
    pub lock_tx_hash: String,
}

impl Orchestrator {
    /// Issue `total_supply` units of a new asset `asset_code` to `distributor`.
    ///
    /// The issuer keypair is generated here and discarded once its master key
    /// is revoked.
    pub async fn issue_asset(
        &self,
        distributor: &Identity,
        asset_code: &str,
        total_supply: Amount,
    ) -> OrchestratorResult<IssuedAsset> {
        let issuer = Identity::random();
        let asset = Asset::credit(asset_code, issuer.address())?;
        let params = TransactionParams::new(Validity::Infinite);

        info!(
            asset = %asset,
            distributor = %distributor.address(),
            supply = %total_supply,
            "Issuing asset"
        );

        let activate = Operation::create_account(issuer.address(), ISSUER_RESERVE)?;
        self.step(
            IssuanceStep::ActivateIssuer,
            self.submit_with(distributor, vec![activate], params),
        )
        .await?;

        let trust = Operation::change_trust(asset.clone(), None)?;
        self.step(
            IssuanceStep::EstablishTrust,
            self.submit_with(distributor, vec![trust], params),
        )
        .await?;

        let transfer = Operation::Payment {
            destination: distributor.address().to_string(),
            asset: asset.clone(),
            amount: total_supply,
        };
        let supply = self
            .step(
                IssuanceStep::TransferSupply,
                self.submit_with(&issuer, vec![transfer], params),
            )
            .await?;

        let lock = Operation::set_options(SetOptions::lock_master_key())?;
        let locked = self
            .step(
                IssuanceStep::LockIssuer,
                self.submit_with(&issuer, vec![lock], params),
            )
            .await?;

        metrics::record_issuance_step(IssuanceStep::Finish.as_str(), true);
        info!(
            asset = %asset,
            supply_tx = %supply.hash,
            lock_tx = %locked.hash,
            "Asset issued and issuer locked"
        );

        Ok(IssuedAsset {
            asset,
            issuer_address: issuer.address().to_string(),
            supply_tx_hash: supply.hash,
            lock_tx_hash: locked.hash,
        })
    }

    async fn step<T>(
        &self,
        step: IssuanceStep,
        fut: impl Future<Output = OrchestratorResult<T>>,
    ) -> OrchestratorResult<T> {
        let result = fut.await;
        metrics::record_issuance_step(step.as_str(), result.is_ok());
        result.map_err(|e| {
            warn!(step = %step, error = %e, "Asset issuance aborted");
            e.in_step(step)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrchestratorError;
    use crate::ledger::{AccountState, MockLedgerApi, SubmissionResult};
    use mockall::Sequence;
    use std::sync::Arc;

    fn lookup(address: &str) -> OrchestratorResult<AccountState> {
        Ok(AccountState {
            address: address.to_string(),
            sequence: 100,
            balances: Vec::new(),
        })
    }

    fn accepted(hash: &str) -> OrchestratorResult<SubmissionResult> {
        Ok(SubmissionResult {
            hash: hash.to_string(),
            ledger: 7,
        })
    }

    #[tokio::test]
    async fn test_trust_failure_stops_issuance() {
        let distributor = Identity::random();
        let dist_addr = distributor.address().to_string();
        let mut ledger = MockLedgerApi::new();
        let mut seq = Sequence::new();

        let expected = dist_addr.clone();
        ledger
            .expect_account()
            .times(1)
            .in_sequence(&mut seq)
            .withf(move |address| address.to_string() == expected)
            .returning(|address| lookup(address));
        ledger
            .expect_submit()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|envelope| {
                matches!(
                    envelope.tx.operations.as_slice(),
                    [Operation::CreateAccount { .. }]
                )
            })
            .returning(|_| accepted("activate"));
        let expected = dist_addr.clone();
        ledger
            .expect_account()
            .times(1)
            .in_sequence(&mut seq)
            .withf(move |address| address.to_string() == expected)
            .returning(|address| lookup(address));
        ledger
            .expect_submit()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|envelope| {
                matches!(
                    envelope.tx.operations.as_slice(),
                    [Operation::ChangeTrust { .. }]
                )
            })
            .returning(|_| {
                Err(OrchestratorError::Submission {
                    reason: "tx_failed [op_no_issuer]".to_string(),
                })
            });

        let orch = Orchestrator::new(Arc::new(ledger), "Diamante Testnet 2024");
        let err = orch
            .issue_asset(&distributor, "TEST", Amount::from_units(10_000).unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.failed_step(), Some(IssuanceStep::EstablishTrust));
        assert!(err.to_string().contains("op_no_issuer"));
    }

    #[tokio::test]
    async fn test_transfer_failure_skips_lock() {
        let distributor = Identity::random();
        let mut ledger = MockLedgerApi::new();
        let mut seq = Sequence::new();

        // Activation and trust succeed; every submission needs a lookup first
        for _ in 0..2 {
            ledger
                .expect_account()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|address| lookup(address));
            ledger
                .expect_submit()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| accepted("ok"));
        }
        ledger
            .expect_account()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|address| lookup(address));
        ledger
            .expect_submit()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|envelope| {
                matches!(
                    envelope.tx.operations.as_slice(),
                    [Operation::Payment { .. }]
                )
            })
            .returning(|_| {
                Err(OrchestratorError::Submission {
                    reason: "tx_failed [op_no_trust]".to_string(),
                })
            });

        let orch = Orchestrator::new(Arc::new(ledger), "Diamante Testnet 2024");
        let err = orch
            .issue_asset(&distributor, "TEST", Amount::from_units(10_000).unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.failed_step(), Some(IssuanceStep::TransferSupply));
        assert!(matches!(
            err,
            OrchestratorError::SagaStep { ref source, .. }
                if matches!(**source, OrchestratorError::Submission { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_code_fails_before_any_transaction() {
        let ledger = MockLedgerApi::new();
        let orch = Orchestrator::new(Arc::new(ledger), "Diamante Testnet 2024");

        let err = orch
            .issue_asset(&Identity::random(), "NOT-VALID", Amount::from_units(1).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Validation(_)));
        assert_eq!(err.failed_step(), None);
    }
}
