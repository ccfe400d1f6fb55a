//! Remote authority integrations.
//!
//! Defines the two seams the engine talks through:
//! - `GameAuthority`: the SpinDBoard contract (round reads, join, spin)
//! - `NativeLedger`: native-currency balances, gas price, and transfers
//!
//! `EvmClient` implements both over a JSON-RPC node.

pub mod abi;
pub mod evm;

use async_trait::async_trait;
use web3::types::{Address, U256};

use crate::types::{HarnessResult, PlayerEntry, PlayerRow, Round, TxOutcome};
use crate::wallets::Wallet;

/// Abstraction over the game contract.
///
/// Reads are side-effect free and never cached by implementors. Writes
/// resolve only once the transaction is confirmed (or rejected).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameAuthority: Send + Sync {
    /// Entry fee every join must pay, in wei.
    async fn entry_fee(&self) -> HarnessResult<U256>;

    /// The round currently accepting activity.
    async fn current_round(&self) -> HarnessResult<Round>;

    /// A specific round, including completed ones.
    async fn round_by_id(&self, round_id: u64) -> HarnessResult<Round>;

    /// Player standing in the current round.
    async fn player_status(&self, player: Address) -> HarnessResult<PlayerEntry>;

    /// Every player of a round, in join order.
    async fn players_of(&self, round_id: u64) -> HarnessResult<Vec<PlayerRow>>;

    /// Join the current round from `wallet`, paying exactly `fee`.
    async fn join_round(&self, wallet: &Wallet, fee: U256) -> HarnessResult<TxOutcome>;

    /// Spin once from `wallet`.
    async fn spin(&self, wallet: &Wallet) -> HarnessResult<TxOutcome>;
}

/// Abstraction over native-currency accounting.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NativeLedger: Send + Sync {
    async fn balance(&self, address: Address) -> HarnessResult<U256>;

    /// Current network fee per gas unit, in wei.
    async fn gas_price(&self) -> HarnessResult<U256>;

    /// Send `value` from `wallet` to `to` with an explicit fee budget of
    /// `gas_limit * gas_price`.
    async fn transfer(
        &self,
        wallet: &Wallet,
        to: Address,
        value: U256,
        gas_limit: U256,
        gas_price: U256,
    ) -> HarnessResult<TxOutcome>;
}
