//! Per-wallet batch results.
//!
//! Every phase walks the pool sequentially and folds each wallet's result
//! into a [`BatchReport`]. Recoverable failures become
//! [`WalletOutcome::Failed`] entries; anything else stops the phase.

use std::fmt;
use tracing::warn;
use web3::types::{Address, U256};

use crate::types::{format_ether, HarnessError, HarnessResult, TxOutcome};
use crate::wallets::Wallet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Join,
    Spin,
    Sweep,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Join => write!(f, "join"),
            Phase::Spin => write!(f, "spin"),
            Phase::Sweep => write!(f, "sweep"),
        }
    }
}

/// Why a wallet was passed over without submitting anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyJoined,
    NotJoined,
    AlreadySpun { outcome: Option<U256> },
    BalanceTooLow { balance: U256, reserved: U256 },
    IsDestination,
    DryRun { transferable: U256 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyJoined => write!(f, "already joined"),
            SkipReason::NotJoined => write!(f, "not joined"),
            SkipReason::AlreadySpun { outcome: Some(n) } => write!(f, "already spun (result: {n})"),
            SkipReason::AlreadySpun { outcome: None } => write!(f, "already spun"),
            SkipReason::BalanceTooLow { balance, .. } => {
                write!(f, "balance too low: {} ETH", format_ether(*balance))
            }
            SkipReason::IsDestination => write!(f, "wallet is the sweep destination"),
            SkipReason::DryRun { transferable } => {
                write!(f, "dry run, would sweep {} ETH", format_ether(*transferable))
            }
        }
    }
}

#[derive(Debug)]
pub enum WalletOutcome {
    Succeeded(TxOutcome),
    Skipped(SkipReason),
    Failed(HarnessError),
}

impl WalletOutcome {
    /// Fold a write attempt: recoverable errors are recorded, the rest
    /// propagate.
    pub fn from_attempt(
        wallet: &Wallet,
        phase: Phase,
        attempt: HarnessResult<TxOutcome>,
    ) -> HarnessResult<Self> {
        match attempt {
            Ok(tx) => Ok(WalletOutcome::Succeeded(tx)),
            Err(e) if e.is_recoverable() => {
                warn!(
                    slot = wallet.index(),
                    address = ?wallet.address(),
                    phase = %phase,
                    error = %e,
                    "Wallet step failed, continuing with next wallet"
                );
                Ok(WalletOutcome::Failed(e))
            }
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug)]
pub struct WalletResult {
    pub index: usize,
    pub address: Address,
    pub outcome: WalletOutcome,
}

/// Ordered per-wallet results of one phase.
#[derive(Debug)]
pub struct BatchReport {
    pub phase: Phase,
    pub results: Vec<WalletResult>,
}

impl BatchReport {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            results: Vec::new(),
        }
    }

    pub fn record(&mut self, wallet: &Wallet, outcome: WalletOutcome) {
        self.results.push(WalletResult {
            index: wallet.index(),
            address: wallet.address(),
            outcome,
        });
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, WalletOutcome::Succeeded(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, WalletOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, WalletOutcome::Failed(_)))
    }

    /// Addresses whose step succeeded, in pool order.
    pub fn succeeded_addresses(&self) -> Vec<Address> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, WalletOutcome::Succeeded(_)))
            .map(|r| r.address)
            .collect()
    }

    fn count(&self, pred: impl Fn(&WalletOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}
