//! Configuration management for the orchestrator
//!
//! Loads configuration from TOML files with environment variable substitution.
//! Secret key material never lives in the file itself: `credentials.secret_env`
//! names the environment variable holding the seed.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ledger::RetryPolicy;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub network: NetworkConfig,
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub passphrase: String,
    pub horizon_url: String,
    pub faucet_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    pub secret_env: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    pub payment_amount: String,
    pub data_name: String,
    pub data_value: String,
    pub signer_address: String,
    pub signer_weight: u8,
    pub asset_code: String,
    pub asset_supply: String,
}

fn default_request_timeout() -> u64 {
    30
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay_ms: self.base_delay_ms,
            max_delay_ms: self.max_delay_ms,
        }
    }
}

impl Settings {
    /// Load settings from the file named by `DIAM_CONFIG`
    pub fn load() -> Result<Self> {
        let config_path = env::var("DIAM_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::load_from(&config_path)
    }

    /// Load settings from an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str)?;

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.network.passphrase.trim().is_empty() {
            anyhow::bail!("network.passphrase must not be empty");
        }
        if self.network.horizon_url.is_empty() {
            anyhow::bail!("network.horizon_url must be configured");
        }
        if self.network.faucet_url.is_empty() {
            tracing::warn!("network.faucet_url is empty - funding new accounts will fail");
        }
        if self.credentials.secret_env.is_empty() {
            anyhow::bail!("credentials.secret_env must name an environment variable");
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            anyhow::bail!("retry.base_delay_ms exceeds retry.max_delay_ms");
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")?;

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    Ok(result)
}
