//! Shared types for the SPINBOARD harness.
//!
//! These mirror what the SpinDBoard contract exposes (rounds and per-player
//! entries) plus the ephemeral values the harness computes locally, such as
//! sweep plans and transaction outcomes. Amounts are kept in wei as `U256`
//! and only converted to ETH for display.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::prelude::*;
use std::fmt;
use web3::types::{Address, H256, U256};

/// Number of decimal places between wei and ETH.
pub const ETHER_DECIMALS: u32 = 18;

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Render a wei amount in ETH display units, e.g. `20000000000000` → `0.00002`.
///
/// Falls back to a raw wei string when the value is outside `Decimal`'s range.
pub fn format_ether(wei: U256) -> String {
    if wei.bits() <= 127 {
        if let Ok(value) = Decimal::try_from_i128_with_scale(wei.as_u128() as i128, ETHER_DECIMALS) {
            return value.normalize().to_string();
        }
    }
    format!("{wei} wei")
}

/// Convert an ETH amount into wei, truncating anything below 1 wei.
/// Returns `None` for negative or out-of-range amounts.
pub fn ether_to_wei(amount: Decimal) -> Option<U256> {
    if amount.is_sign_negative() {
        return None;
    }
    let scaled = amount.checked_mul(Decimal::from(10u64.pow(ETHER_DECIMALS)))?;
    scaled.trunc().to_u128().map(U256::from)
}

// ---------------------------------------------------------------------------
// Round
// ---------------------------------------------------------------------------

/// Lifecycle state of a round, as reported by the contract's `uint8 status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStatus {
    Waiting,
    Spinning,
    Completed,
    /// Any value the contract reports outside 0..=2.
    Unknown(u64),
}

impl RoundStatus {
    pub fn from_raw(raw: u64) -> Self {
        match raw {
            0 => RoundStatus::Waiting,
            1 => RoundStatus::Spinning,
            2 => RoundStatus::Completed,
            other => RoundStatus::Unknown(other),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RoundStatus::Completed)
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundStatus::Waiting => write!(f, "Waiting"),
            RoundStatus::Spinning => write!(f, "Spinning"),
            RoundStatus::Completed => write!(f, "Completed"),
            RoundStatus::Unknown(raw) => write!(f, "{raw}"),
        }
    }
}

/// One game round as seen by the contract.
///
/// The harness never mutates a round; every value here is a snapshot of
/// the contract's view at the time of the read.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub id: u64,
    pub status: RoundStatus,
    /// Pooled entry fees in wei.
    pub total_pool: U256,
    pub player_count: u64,
    /// Raw winner slot; zero address until the round completes.
    pub winner: Address,
    /// Raw winning outcome slot; zero until the round completes.
    pub winning_outcome: U256,
    /// Unix seconds. Not every contract view reports timestamps.
    pub created_at: Option<u64>,
    pub completed_at: Option<u64>,
}

impl Round {
    /// Winner address, defined only once the round has completed.
    pub fn winner(&self) -> Option<Address> {
        self.status.is_completed().then_some(self.winner)
    }

    /// Winning outcome, defined only once the round has completed.
    pub fn winning_outcome(&self) -> Option<U256> {
        self.status.is_completed().then_some(self.winning_outcome)
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at.and_then(unix_to_utc)
    }

    pub fn completed_at_utc(&self) -> Option<DateTime<Utc>> {
        self.completed_at.filter(|ts| *ts > 0).and_then(unix_to_utc)
    }

    /// Helper to build a test round with sensible defaults.
    #[cfg(test)]
    pub fn sample(id: u64, status: RoundStatus, player_count: u64) -> Self {
        Round {
            id,
            status,
            total_pool: U256::from(20_000_000_000_000u64) * U256::from(player_count),
            player_count,
            winner: Address::zero(),
            winning_outcome: U256::zero(),
            created_at: Some(1_700_000_000),
            completed_at: None,
        }
    }
}

fn unix_to_utc(secs: u64) -> Option<DateTime<Utc>> {
    i64::try_from(secs).ok().and_then(|s| Utc.timestamp_opt(s, 0).single())
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A wallet's standing in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerEntry {
    pub has_joined: bool,
    pub has_spun: bool,
    /// Spin outcome; `Some` iff `has_spun`.
    pub outcome: Option<U256>,
}

impl PlayerEntry {
    /// Build an entry from the contract's raw fields. The raw outcome is
    /// discarded unless the player has actually spun.
    pub fn new(has_joined: bool, has_spun: bool, raw_outcome: U256) -> Self {
        Self {
            has_joined,
            has_spun,
            outcome: has_spun.then_some(raw_outcome),
        }
    }

    /// Joined and not yet spun.
    pub fn can_spin(&self) -> bool {
        self.has_joined && !self.has_spun
    }
}

/// One row of a round's historical player table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRow {
    pub address: Address,
    pub entry: PlayerEntry,
}

// ---------------------------------------------------------------------------
// Sweep plan
// ---------------------------------------------------------------------------

/// Per-wallet sweep computation. Recomputed on every run, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepPlan {
    pub address: Address,
    pub balance: U256,
    pub reserved_cost: U256,
    /// `max(0, balance - reserved_cost)`
    pub transferable: U256,
}

impl SweepPlan {
    pub fn new(address: Address, balance: U256, reserved_cost: U256) -> Self {
        Self {
            address,
            balance,
            reserved_cost,
            transferable: balance.saturating_sub(reserved_cost),
        }
    }

    pub fn is_sweepable(&self) -> bool {
        !self.transferable.is_zero()
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Confirmed transaction summary returned by every write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub hash: H256,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
}

impl fmt::Display for TxOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.hash)?;
        if let Some(block) = self.block_number {
            write!(f, " (block {block})")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

/// Domain-specific error types for SPINBOARD.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Remote read failed ({call}): {reason}")]
    RemoteRead { call: &'static str, reason: String },

    #[error("Remote write rejected ({call}): {reason}")]
    RemoteWrite { call: &'static str, reason: String },

    #[error("Insufficient funds in {address:?}: {reason}")]
    InsufficientFunds { address: Address, reason: String },
}

impl HarnessError {
    pub fn read(call: &'static str, reason: impl fmt::Display) -> Self {
        HarnessError::RemoteRead {
            call,
            reason: reason.to_string(),
        }
    }

    pub fn write(call: &'static str, reason: impl fmt::Display) -> Self {
        HarnessError::RemoteWrite {
            call,
            reason: reason.to_string(),
        }
    }

    /// Per-wallet failures that a batch records and moves past.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HarnessError::RemoteWrite { .. } | HarnessError::InsufficientFunds { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
