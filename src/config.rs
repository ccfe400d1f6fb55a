//! Configuration loading from TOML with environment variable overrides.
//!
//! Non-secret settings can live in an optional `spinboard.toml`; anything
//! deployment-specific (endpoint, contract address, sweep destination) may
//! also come from the environment, which wins over the file. Private keys
//! never live in the file: they are read from indexed env slots by
//! [`crate::wallets::WalletCredentials`].

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use web3::types::{Address, U256};

use crate::types::{HarnessError, HarnessResult};
use crate::wallets::DEFAULT_MAX_WALLETS;

/// Gas units reserved for a plain value transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub wallets: WalletsConfig,
    pub sweep: SweepConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    pub endpoint: String,
    pub contract_address: Option<String>,
    /// Blocks to wait after inclusion before a write counts as confirmed.
    pub confirmations: usize,
    pub poll_interval_ms: u64,
    /// Gas limit attached to `joinGame` / `spin` calls.
    pub contract_gas_limit: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8545".to_string(),
            contract_address: None,
            confirmations: 1,
            poll_interval_ms: 1_000,
            contract_gas_limit: 300_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WalletsConfig {
    /// Highest `WALLET_{i}_PRIVATE_KEY` slot scanned.
    pub max_wallets: usize,
    /// How many wallets `keygen` prints by default.
    pub generate_count: usize,
}

impl Default for WalletsConfig {
    fn default() -> Self {
        Self {
            max_wallets: DEFAULT_MAX_WALLETS,
            generate_count: DEFAULT_MAX_WALLETS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SweepConfig {
    pub gas_limit: u64,
    pub destination: Option<String>,
    pub confirm: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            gas_limit: TRANSFER_GAS_LIMIT,
            destination: None,
            confirm: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|e| {
            HarnessError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
            .map_err(|e| HarnessError::Configuration(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(contents: &str) -> HarnessResult<Self> {
        toml::from_str(contents)
            .map_err(|e| HarnessError::Configuration(format!("invalid config: {e}")))
    }

    /// Apply environment overrides through `lookup` (usually [`env_lookup`]).
    pub fn apply_env<F>(&mut self, lookup: F) -> HarnessResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("RPC_URL") {
            self.network.endpoint = endpoint;
        }
        if let Some(addr) = lookup("SPINDBOARD_CONTRACT_ADDRESS") {
            self.network.contract_address = Some(addr);
        }
        if let Some(dest) = lookup("SWEEP_TO").or_else(|| lookup("DEPLOYER_ADDRESS")) {
            self.sweep.destination = Some(dest);
        }
        if let Some(flag) = lookup("SWEEP_CONFIRM") {
            self.sweep.confirm = parse_flag("SWEEP_CONFIRM", &flag)?;
        }
        if let Some(count) = lookup("WALLET_COUNT") {
            self.wallets.generate_count = count.trim().parse().map_err(|_| {
                HarnessError::Configuration(format!("WALLET_COUNT is not a number: {count}"))
            })?;
        }
        self.validate()
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if self.network.endpoint.trim().is_empty() {
            return Err(HarnessError::Configuration("network endpoint is empty".into()));
        }
        if self.wallets.max_wallets == 0 {
            return Err(HarnessError::Configuration("max_wallets must be at least 1".into()));
        }
        if self.sweep.gas_limit == 0 {
            return Err(HarnessError::Configuration("sweep gas_limit must be positive".into()));
        }
        Ok(())
    }

    /// Contract address, required by every round command.
    pub fn contract_address(&self) -> HarnessResult<Address> {
        let raw = self.network.contract_address.as_deref().ok_or_else(|| {
            HarnessError::Configuration("missing SPINDBOARD_CONTRACT_ADDRESS".into())
        })?;
        parse_address("SPINDBOARD_CONTRACT_ADDRESS", raw)
    }

    /// Where swept funds go.
    pub fn sweep_destination(&self) -> HarnessResult<Address> {
        let raw = self.sweep.destination.as_deref().ok_or_else(|| {
            HarnessError::Configuration(
                "missing SWEEP_TO (or DEPLOYER_ADDRESS) to receive swept funds".into(),
            )
        })?;
        parse_address("SWEEP_TO", raw)
    }

    pub fn sweep_gas_limit(&self) -> U256 {
        U256::from(self.sweep.gas_limit)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.network.poll_interval_ms)
    }
}

/// Read a non-blank environment variable.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn parse_address(label: &str, raw: &str) -> HarnessResult<Address> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(digits)
        .map_err(|e| HarnessError::Configuration(format!("{label} is not a valid address: {e}")))?;
    if bytes.len() != Address::len_bytes() {
        return Err(HarnessError::Configuration(format!(
            "{label} is not a 20-byte address: {trimmed}"
        )));
    }
    Ok(Address::from_slice(&bytes))
}

fn parse_flag(label: &str, raw: &str) -> HarnessResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(HarnessError::Configuration(format!(
            "{label} must be a boolean, got {other}"
        ))),
    }
}
