//! Fresh wallet generation for populating credential slots.
//!
//! Output is `.env`-ready: one `WALLET_{i}_PRIVATE_KEY=<hex>` line per
//! wallet (no `0x` prefix) followed by a commented address line.

use rand::RngCore;
use secp256k1::SecretKey;
use secrecy::{ExposeSecret, SecretString};
use std::fmt::Write as _;
use web3::types::Address;

use crate::types::{HarnessError, HarnessResult};
use crate::wallets::{credential_var, Wallet};

pub struct GeneratedWallet {
    pub index: usize,
    pub address: Address,
    pub private_key_hex: SecretString,
}

/// Generate `count` random wallets numbered from 1.
pub fn generate(count: usize) -> HarnessResult<Vec<GeneratedWallet>> {
    if count == 0 {
        return Err(HarnessError::Configuration(
            "wallet count must be a positive number".into(),
        ));
    }

    let mut rng = rand::thread_rng();
    let mut generated = Vec::with_capacity(count);
    for index in 1..=count {
        let (key, hex) = random_key(&mut rng);
        let wallet = Wallet::from_key(index, key);
        generated.push(GeneratedWallet {
            index,
            address: wallet.address(),
            private_key_hex: SecretString::new(hex),
        });
    }
    Ok(generated)
}

fn random_key<R: RngCore>(rng: &mut R) -> (SecretKey, String) {
    let mut bytes = [0u8; 32];
    loop {
        rng.fill_bytes(&mut bytes);
        // Zero and values >= the curve order are rejected; retry.
        if let Ok(key) = SecretKey::from_slice(&bytes) {
            return (key, hex::encode(bytes));
        }
    }
}

pub fn render_env_lines(wallets: &[GeneratedWallet]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Generated {} wallets", wallets.len());
    let _ = writeln!(out, "# Add these to your .env (WITHOUT 0x prefix):");
    for w in wallets {
        let _ = writeln!(
            out,
            "{}={}",
            credential_var(w.index),
            w.private_key_hex.expose_secret()
        );
        let _ = writeln!(out, "# WALLET_{}_ADDRESS={:?}", w.index, w.address);
    }
    out
}
