//! Faucet client for funding test accounts

use reqwest::StatusCode;
use std::time::Duration;
use tracing::info;

use crate::error::{OrchestratorError, OrchestratorResult};

/// Funds and activates new addresses on test networks
#[derive(Debug, Clone)]
pub struct FaucetClient {
    http: reqwest::Client,
    url: String,
}

impl FaucetClient {
    pub fn new(url: &str, timeout: Duration) -> OrchestratorResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OrchestratorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    /// Ask the faucet to fund `address`. Anything but 200 is a failure.
    pub async fn fund(&self, address: &str) -> OrchestratorResult<()> {
        let faucet_error = |message: String| OrchestratorError::Faucet {
            address: address.to_string(),
            message,
        };

        let response = self
            .http
            .get(&self.url)
            .query(&[("addr", address)])
            .send()
            .await
            .map_err(|e| faucet_error(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(faucet_error(format!("status code {}", status.as_u16())));
        }

        info!(%address, "Account funded by faucet");
        Ok(())
    }
}
