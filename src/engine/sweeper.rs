//! Balance sweeper.
//!
//! Drains each pool wallet's surplus into a treasury address, keeping back
//! exactly the fee budget of the sweep transfer itself. Dry-run by default.

use std::fmt;
use tracing::info;
use web3::types::{Address, U256};

use crate::authority::NativeLedger;
use crate::engine::outcome::{BatchReport, Phase, SkipReason, WalletOutcome};
use crate::types::{format_ether, HarnessResult, SweepPlan};
use crate::wallets::{Wallet, WalletPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    DryRun,
    Confirmed,
}

impl SweepMode {
    pub fn from_confirm(confirm: bool) -> Self {
        if confirm {
            SweepMode::Confirmed
        } else {
            SweepMode::DryRun
        }
    }
}

impl fmt::Display for SweepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepMode::DryRun => write!(f, "DRY RUN (no sends)"),
            SweepMode::Confirmed => write!(f, "CONFIRMED (will send)"),
        }
    }
}

/// Result of a sweep run.
#[derive(Debug)]
pub struct SweepReport {
    pub mode: SweepMode,
    pub destination: Address,
    pub gas_price: U256,
    pub reserved_cost: U256,
    pub plans: Vec<SweepPlan>,
    pub batch: BatchReport,
}

impl SweepReport {
    /// Sum of every computed transferable amount, sent or not.
    pub fn total_transferable(&self) -> U256 {
        self.plans
            .iter()
            .fold(U256::zero(), |acc, p| acc.saturating_add(p.transferable))
    }
}

pub struct Sweeper<'a> {
    ledger: &'a dyn NativeLedger,
    destination: Address,
    gas_limit: U256,
    mode: SweepMode,
}

impl<'a> Sweeper<'a> {
    pub fn new(
        ledger: &'a dyn NativeLedger,
        destination: Address,
        gas_limit: U256,
        mode: SweepMode,
    ) -> Self {
        Self {
            ledger,
            destination,
            gas_limit,
            mode,
        }
    }

    pub async fn run(&self, pool: &WalletPool) -> HarnessResult<SweepReport> {
        let gas_price = self.ledger.gas_price().await?;
        let reserved_cost = self.gas_limit.saturating_mul(gas_price);
        info!(
            wallets = pool.len(),
            destination = ?self.destination,
            mode = %self.mode,
            reserved = format!("{} ETH", format_ether(reserved_cost)),
            "Sweeping wallets"
        );

        let mut plans = Vec::with_capacity(pool.len());
        let mut batch = BatchReport::new(Phase::Sweep);
        for wallet in pool.iter() {
            let balance = self.ledger.balance(wallet.address()).await?;
            let plan = SweepPlan::new(wallet.address(), balance, reserved_cost);
            let outcome = self.sweep_one(wallet, &plan, gas_price).await?;
            batch.record(wallet, outcome);
            plans.push(plan);
        }

        info!(
            swept = batch.succeeded(),
            skipped = batch.skipped(),
            failed = batch.failed(),
            "Sweep complete"
        );

        Ok(SweepReport {
            mode: self.mode,
            destination: self.destination,
            gas_price,
            reserved_cost,
            plans,
            batch,
        })
    }

    async fn sweep_one(
        &self,
        wallet: &Wallet,
        plan: &SweepPlan,
        gas_price: U256,
    ) -> HarnessResult<WalletOutcome> {
        if wallet.address() == self.destination {
            return Ok(WalletOutcome::Skipped(SkipReason::IsDestination));
        }
        if !plan.is_sweepable() {
            info!(
                address = ?wallet.address(),
                balance = format!("{} ETH", format_ether(plan.balance)),
                "Skip (balance too low)"
            );
            return Ok(WalletOutcome::Skipped(SkipReason::BalanceTooLow {
                balance: plan.balance,
                reserved: plan.reserved_cost,
            }));
        }

        info!(
            address = ?wallet.address(),
            amount = format!("{} ETH", format_ether(plan.transferable)),
            "Sweep (keeps ~gas)"
        );
        if self.mode == SweepMode::DryRun {
            return Ok(WalletOutcome::Skipped(SkipReason::DryRun {
                transferable: plan.transferable,
            }));
        }

        let attempt = self
            .ledger
            .transfer(
                wallet,
                self.destination,
                plan.transferable,
                self.gas_limit,
                gas_price,
            )
            .await;
        WalletOutcome::from_attempt(wallet, Phase::Sweep, attempt)
    }
}
