//! Wallet pool loading.
//!
//! Credentials come from indexed slots (`WALLET_1_PRIVATE_KEY` …
//! `WALLET_N_PRIVATE_KEY`). They are collected once into a
//! [`WalletCredentials`] value at start-up and handed to
//! [`WalletPool::load`]; nothing else in the crate touches the environment
//! for keys.

use secp256k1::SecretKey;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use tracing::{debug, info};
use web3::signing::{Key, SecretKeyRef};
use web3::types::Address;

use crate::types::{HarnessError, HarnessResult};

/// Default number of credential slots scanned.
pub const DEFAULT_MAX_WALLETS: usize = 10;

/// Environment variable holding the key for slot `index` (1-based).
pub fn credential_var(index: usize) -> String {
    format!("WALLET_{index}_PRIVATE_KEY")
}

/// Trim a raw key and drop an optional `0x` prefix. Blank keys become `None`.
fn normalize_key(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    (!hex.is_empty()).then_some(hex)
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// A pool member: slot index, address, and its signing key.
pub struct Wallet {
    index: usize,
    address: Address,
    key: SecretKey,
}

impl Wallet {
    pub fn from_key(index: usize, key: SecretKey) -> Self {
        let address = SecretKeyRef::new(&key).address();
        Self { index, address, key }
    }

    /// Parse a hex secret (with or without `0x`).
    pub fn from_secret_hex(index: usize, raw: &str) -> HarnessResult<Self> {
        let digits = normalize_key(raw).ok_or_else(|| {
            HarnessError::Configuration(format!("{} is blank", credential_var(index)))
        })?;
        let key = hex::decode(digits)
            .ok()
            .and_then(|bytes| SecretKey::from_slice(&bytes).ok())
            .ok_or_else(|| {
                HarnessError::Configuration(format!(
                    "{} is not a valid secp256k1 private key",
                    credential_var(index)
                ))
            })?;
        Ok(Self::from_key(index, key))
    }

    /// 1-based credential slot this wallet was loaded from.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signing_key(&self) -> &SecretKey {
        &self.key
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("index", &self.index)
            .field("address", &self.address)
            .field("key", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Raw per-slot secrets, resolved once from configuration.
pub struct WalletCredentials {
    max: usize,
    slots: Vec<(usize, SecretString)>,
}

impl WalletCredentials {
    /// Scan slots `1..=max` through `lookup`.
    pub fn from_lookup<F>(max: usize, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let slots = (1..=max)
            .filter_map(|i| lookup(&credential_var(i)).map(|raw| (i, SecretString::new(raw))))
            .collect();
        Self { max, slots }
    }

    /// Scan slots from the process environment.
    pub fn from_env(max: usize) -> Self {
        Self::from_lookup(max, |name| std::env::var(name).ok())
    }
}

impl fmt::Debug for WalletCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indices: Vec<usize> = self.slots.iter().map(|(i, _)| *i).collect();
        f.debug_struct("WalletCredentials")
            .field("max", &self.max)
            .field("present", &indices)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// Ordered, bounded set of usable wallets.
#[derive(Debug, Default)]
pub struct WalletPool {
    wallets: Vec<Wallet>,
}

impl WalletPool {
    /// Load wallets from slots `1..=bound` (clamped to the credential
    /// maximum), keeping slot order. Absent or blank slots are skipped
    /// without renumbering; a malformed key is a configuration error.
    pub fn load(credentials: &WalletCredentials, bound: usize) -> HarnessResult<Self> {
        let bound = bound.min(credentials.max);
        let mut wallets = Vec::new();

        for (index, secret) in credentials.slots.iter().filter(|(i, _)| *i <= bound) {
            if normalize_key(secret.expose_secret()).is_none() {
                debug!(slot = index, "Blank wallet credential, skipping");
                continue;
            }
            wallets.push(Wallet::from_secret_hex(*index, secret.expose_secret())?);
        }

        info!(loaded = wallets.len(), bound, "Wallet pool loaded");
        Ok(Self { wallets })
    }

    /// Like [`WalletPool::load`] but fails when no wallet is usable.
    pub fn load_required(credentials: &WalletCredentials, bound: usize) -> HarnessResult<Self> {
        let pool = Self::load(credentials, bound)?;
        if pool.is_empty() {
            return Err(HarnessError::Configuration(format!(
                "no WALLET_*_PRIVATE_KEY values found in slots 1..={}",
                bound.min(credentials.max)
            )));
        }
        Ok(pool)
    }

    pub fn from_wallets(wallets: Vec<Wallet>) -> Self {
        Self { wallets }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Wallet> {
        self.wallets.iter()
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.wallets.iter().map(Wallet::address).collect()
    }
}
