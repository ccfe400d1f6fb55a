//! Round state reader.
//!
//! Thin, uncached view over the authority's read calls. Orchestrators
//! create one per phase and call it immediately before every conditional
//! write, so each decision is made against the freshest state available.

use tracing::debug;
use web3::types::U256;

use crate::authority::GameAuthority;
use crate::types::{HarnessError, HarnessResult, PlayerEntry, PlayerRow, Round};
use crate::wallets::Wallet;

pub struct RoundReader<'a> {
    authority: &'a dyn GameAuthority,
}

impl<'a> RoundReader<'a> {
    pub fn new(authority: &'a dyn GameAuthority) -> Self {
        Self { authority }
    }

    pub async fn entry_fee(&self) -> HarnessResult<U256> {
        self.authority.entry_fee().await
    }

    /// Live view of the current round.
    pub async fn current_round(&self) -> HarnessResult<Round> {
        let round = self.authority.current_round().await?;
        debug!(
            round = round.id,
            status = %round.status,
            players = round.player_count,
            "Current round"
        );
        Ok(round)
    }

    /// `wallet`'s standing in `round`. The contract only answers for its
    /// current round, so `round` should come from [`Self::current_round`].
    pub async fn player_status(&self, round: &Round, wallet: &Wallet) -> HarnessResult<PlayerEntry> {
        let entry = self.authority.player_status(wallet.address()).await?;
        debug!(
            round = round.id,
            slot = wallet.index(),
            address = ?wallet.address(),
            joined = entry.has_joined,
            spun = entry.has_spun,
            "Player status"
        );
        Ok(entry)
    }

    pub async fn round_by_id(&self, round_id: u64) -> HarnessResult<Round> {
        check_round_id(round_id)?;
        self.authority.round_by_id(round_id).await
    }

    /// Player table of a resolved round id.
    pub async fn players_of(&self, round_id: u64) -> HarnessResult<Vec<PlayerRow>> {
        check_round_id(round_id)?;
        self.authority.players_of(round_id).await
    }
}

/// Round ids start at 1.
fn check_round_id(round_id: u64) -> HarnessResult<()> {
    if round_id == 0 {
        return Err(HarnessError::Configuration(
            "round id must be a positive number".into(),
        ));
    }
    Ok(())
}
