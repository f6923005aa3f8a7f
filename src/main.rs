//! Demonstration client: funds a fresh account, then pays it, sets a data
//! entry, adds a signer and issues a new asset from the configured account.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use diam_orchestrator::config::Settings;
use diam_orchestrator::tx::{Amount, Asset, SetOptions};
use diam_orchestrator::{
    metrics, CredentialProvider, EnvCredentials, FaucetClient, HorizonClient, Identity,
    Orchestrator,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting diam-orchestrator v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!(
        horizon = %settings.network.horizon_url,
        passphrase = %settings.network.passphrase,
        "Loaded configuration"
    );

    let timeout = settings.network.request_timeout();
    let ledger = Arc::new(HorizonClient::new(&settings.network.horizon_url, timeout)?);
    let faucet = FaucetClient::new(&settings.network.faucet_url, timeout)?;
    let orchestrator = Orchestrator::new(ledger, settings.network.passphrase.clone())
        .with_retry(settings.retry.policy());

    let credentials = EnvCredentials::new(&settings.credentials.secret_env);
    let admin = credentials
        .source_identity()
        .context("Failed to load the source account credentials")?;
    info!(address = %admin.address(), "Using source account");

    // Fresh destination account, funded by the faucet
    let destination = Identity::random();
    info!(address = %destination.address(), "Generated destination account");
    faucet
        .fund(destination.address())
        .await
        .context("Error funding and activating account")?;

    let demo = &settings.demo;

    let paid = orchestrator
        .submit_payment(
            &admin,
            destination.address(),
            Asset::Native,
            &demo.payment_amount,
        )
        .await
        .context("Error making payment")?;
    info!(hash = %paid.hash, "Payment successful");

    let data = orchestrator
        .submit_manage_data(&admin, &demo.data_name, Some(demo.data_value.as_bytes()))
        .await
        .context("Error managing data")?;
    info!(hash = %data.hash, "Data managed successfully");

    let options = orchestrator
        .submit_set_options(
            &admin,
            SetOptions::with_signer(demo.signer_address.clone(), demo.signer_weight),
        )
        .await
        .context("Error setting options")?;
    info!(hash = %options.hash, "Options set successfully");

    let supply: Amount = demo
        .asset_supply
        .parse()
        .context("Invalid demo.asset_supply")?;
    let issued = orchestrator
        .issue_asset(&admin, &demo.asset_code, supply)
        .await
        .context("Error creating asset")?;
    info!(
        asset = %issued.asset,
        issuer = %issued.issuer_address,
        hash = %issued.supply_tx_hash,
        "Asset created successfully"
    );

    debug!("Metrics:\n{}", metrics::render());
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,diam_orchestrator=debug,reqwest=warn,hyper=warn")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}
