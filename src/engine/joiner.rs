//! Join orchestrator.
//!
//! Walks the wallet pool in order and joins wallets into the current round
//! until `target` joins have succeeded in this run. Each wallet's standing
//! is re-read right before its join so wallets that joined earlier (in a
//! previous run, or by someone else) are skipped rather than rejected.

use tracing::{info, warn};
use web3::types::U256;

use crate::authority::GameAuthority;
use crate::engine::outcome::{BatchReport, Phase, SkipReason, WalletOutcome};
use crate::engine::reader::RoundReader;
use crate::types::{format_ether, HarnessError, HarnessResult};
use crate::wallets::{Wallet, WalletPool};

/// Result of a join phase.
#[derive(Debug)]
pub struct JoinReport {
    pub requested: usize,
    /// Fee paid per join, in wei.
    pub entry_fee: U256,
    pub batch: BatchReport,
}

impl JoinReport {
    pub fn joined(&self) -> usize {
        self.batch.succeeded()
    }

    /// Fewer joins than requested.
    pub fn is_partial(&self) -> bool {
        self.joined() < self.requested
    }
}

pub struct JoinOrchestrator<'a> {
    authority: &'a dyn GameAuthority,
}

impl<'a> JoinOrchestrator<'a> {
    pub fn new(authority: &'a dyn GameAuthority) -> Self {
        Self { authority }
    }

    /// Join up to `target` wallets, one confirmed transaction at a time.
    pub async fn run(&self, pool: &WalletPool, target: usize) -> HarnessResult<JoinReport> {
        if target == 0 {
            return Err(HarnessError::Configuration(
                "target join count must be positive".into(),
            ));
        }

        let reader = RoundReader::new(self.authority);
        let entry_fee = reader.entry_fee().await?;
        info!(
            target,
            pool = pool.len(),
            entry_fee = format!("{} ETH", format_ether(entry_fee)),
            "Joining wallets"
        );

        let mut batch = BatchReport::new(Phase::Join);
        for wallet in pool.iter() {
            if batch.succeeded() >= target {
                break;
            }
            let outcome = self.join_one(&reader, wallet, entry_fee).await?;
            batch.record(wallet, outcome);
        }

        let report = JoinReport {
            requested: target,
            entry_fee,
            batch,
        };

        if report.is_partial() {
            warn!(
                requested = report.requested,
                joined = report.joined(),
                skipped = report.batch.skipped(),
                failed = report.batch.failed(),
                "Joined fewer wallets than requested"
            );
        } else {
            info!(joined = report.joined(), "Join phase complete");
        }

        Ok(report)
    }

    async fn join_one(
        &self,
        reader: &RoundReader<'_>,
        wallet: &Wallet,
        entry_fee: U256,
    ) -> HarnessResult<WalletOutcome> {
        let round = reader.current_round().await?;
        let entry = reader.player_status(&round, wallet).await?;
        if entry.has_joined {
            info!(
                slot = wallet.index(),
                address = ?wallet.address(),
                round = round.id,
                "Already joined, skipping"
            );
            return Ok(WalletOutcome::Skipped(SkipReason::AlreadyJoined));
        }

        info!(
            slot = wallet.index(),
            address = ?wallet.address(),
            round = round.id,
            "Joining"
        );
        let attempt = self.authority.join_round(wallet, entry_fee).await;
        if let Ok(tx) = &attempt {
            info!(address = ?wallet.address(), tx = %tx, "Joined");
        }
        WalletOutcome::from_attempt(wallet, Phase::Join, attempt)
    }
}
