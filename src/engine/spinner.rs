//! Spin orchestrator.
//!
//! Attempts exactly one spin for every pool wallet that has joined the
//! current round and not yet spun. There is no target count.

use tracing::{debug, info};

use crate::authority::GameAuthority;
use crate::engine::outcome::{BatchReport, Phase, SkipReason, WalletOutcome};
use crate::engine::reader::RoundReader;
use crate::types::HarnessResult;
use crate::wallets::{Wallet, WalletPool};

pub struct SpinOrchestrator<'a> {
    authority: &'a dyn GameAuthority,
}

impl<'a> SpinOrchestrator<'a> {
    pub fn new(authority: &'a dyn GameAuthority) -> Self {
        Self { authority }
    }

    pub async fn run(&self, pool: &WalletPool) -> HarnessResult<BatchReport> {
        let reader = RoundReader::new(self.authority);
        info!(pool = pool.len(), "Spinning for joined wallets");

        let mut batch = BatchReport::new(Phase::Spin);
        for wallet in pool.iter() {
            let outcome = self.spin_one(&reader, wallet).await?;
            batch.record(wallet, outcome);
        }

        info!(
            spun = batch.succeeded(),
            skipped = batch.skipped(),
            failed = batch.failed(),
            "Spin phase complete"
        );
        Ok(batch)
    }

    async fn spin_one(&self, reader: &RoundReader<'_>, wallet: &Wallet) -> HarnessResult<WalletOutcome> {
        let round = reader.current_round().await?;
        let entry = reader.player_status(&round, wallet).await?;

        if !entry.can_spin() {
            if !entry.has_joined {
                debug!(slot = wallet.index(), address = ?wallet.address(), "Not joined, skipping");
                return Ok(WalletOutcome::Skipped(SkipReason::NotJoined));
            }
            info!(
                slot = wallet.index(),
                address = ?wallet.address(),
                result = ?entry.outcome,
                "Already spun"
            );
            return Ok(WalletOutcome::Skipped(SkipReason::AlreadySpun {
                outcome: entry.outcome,
            }));
        }

        info!(
            slot = wallet.index(),
            address = ?wallet.address(),
            round = round.id,
            "Spinning"
        );
        let attempt = self.authority.spin(wallet).await;
        if let Ok(tx) = &attempt {
            info!(address = ?wallet.address(), tx = %tx, "Spun");
        }
        WalletOutcome::from_attempt(wallet, Phase::Spin, attempt)
    }
}
