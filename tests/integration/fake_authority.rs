//! In-memory game contract and ledger for integration testing.
//!
//! Enforces the contract's rules (exact entry fee, join once, spin once
//! after joining, round completes once it is full and every player has
//! spun) and charges gas on every write, all without a node.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use web3::types::{Address, H256, U256};

use spinboard::authority::{GameAuthority, NativeLedger};
use spinboard::types::{
    HarnessError, HarnessResult, PlayerEntry, PlayerRow, Round, RoundStatus, TxOutcome,
};
use spinboard::wallets::Wallet;

/// Gas charged for a `joinGame` or `spin` call.
pub const CONTRACT_GAS_USED: u64 = 100_000;

struct Entry {
    player: Address,
    spun: bool,
    result: U256,
}

struct RoundState {
    id: u64,
    status: u64,
    total_pool: U256,
    entries: Vec<Entry>,
    winner: Address,
    winning: U256,
    created_at: u64,
    completed_at: u64,
}

impl RoundState {
    fn new(id: u64, created_at: u64) -> Self {
        Self {
            id,
            status: 0,
            total_pool: U256::zero(),
            entries: Vec::new(),
            winner: Address::zero(),
            winning: U256::zero(),
            created_at,
            completed_at: 0,
        }
    }

    fn snapshot(&self) -> Round {
        Round {
            id: self.id,
            status: RoundStatus::from_raw(self.status),
            total_pool: self.total_pool,
            player_count: self.entries.len() as u64,
            winner: self.winner,
            winning_outcome: self.winning,
            created_at: Some(self.created_at),
            completed_at: Some(self.completed_at),
        }
    }

    fn entry(&self, player: Address) -> Option<&Entry> {
        self.entries.iter().find(|e| e.player == player)
    }
}

struct ChainState {
    balances: HashMap<Address, U256>,
    rounds: Vec<RoundState>,
    clock: u64,
    tx_count: u64,
    transfers: Vec<(Address, Address, U256)>,
}

impl ChainState {
    fn current(&mut self) -> &mut RoundState {
        let last = self.rounds.len() - 1;
        &mut self.rounds[last]
    }

    fn balance(&self, address: Address) -> U256 {
        self.balances.get(&address).copied().unwrap_or_default()
    }

    /// Debit `value + gas_cost`, or reject the transaction before it is mined.
    fn charge(&mut self, from: Address, value: U256, gas_cost: U256) -> HarnessResult<()> {
        let balance = self.balance(from);
        let needed = value + gas_cost;
        if balance < needed {
            return Err(HarnessError::InsufficientFunds {
                address: from,
                reason: format!("insufficient funds for gas * price + value: have {balance} want {needed}"),
            });
        }
        self.balances.insert(from, balance - needed);
        Ok(())
    }

    fn credit(&mut self, to: Address, value: U256) {
        let balance = self.balance(to);
        self.balances.insert(to, balance + value);
    }

    fn mine(&mut self, gas_used: U256) -> TxOutcome {
        self.tx_count += 1;
        self.clock += 12;
        TxOutcome {
            hash: H256::from_low_u64_be(self.tx_count),
            block_number: Some(self.tx_count),
            gas_used: Some(gas_used),
        }
    }
}

pub struct FakeChain {
    entry_fee: U256,
    gas_price: U256,
    round_size: usize,
    state: Mutex<ChainState>,
}

impl FakeChain {
    /// A chain whose rounds fill at `round_size` players.
    pub fn new(entry_fee: U256, gas_price: U256, round_size: usize) -> Self {
        Self {
            entry_fee,
            gas_price,
            round_size,
            state: Mutex::new(ChainState {
                balances: HashMap::new(),
                rounds: vec![RoundState::new(1, 1_700_000_000)],
                clock: 1_700_000_000,
                tx_count: 0,
                transfers: Vec::new(),
            }),
        }
    }

    pub fn fund(&self, address: Address, amount: U256) {
        self.state.lock().unwrap().balances.insert(address, amount);
    }

    pub fn balance_of(&self, address: Address) -> U256 {
        self.state.lock().unwrap().balance(address)
    }

    pub fn transfers(&self) -> Vec<(Address, Address, U256)> {
        self.state.lock().unwrap().transfers.clone()
    }

    pub fn tx_count(&self) -> u64 {
        self.state.lock().unwrap().tx_count
    }

    fn contract_gas_cost(&self) -> U256 {
        U256::from(CONTRACT_GAS_USED) * self.gas_price
    }
}

/// Deterministic outcome in 1..=36 derived from the player and round.
fn outcome_for(player: Address, round_id: u64) -> U256 {
    let seed = player
        .as_bytes()
        .iter()
        .fold(round_id, |acc, b| acc.wrapping_mul(31).wrapping_add(*b as u64));
    U256::from(seed % 36 + 1)
}

#[async_trait]
impl GameAuthority for FakeChain {
    async fn entry_fee(&self) -> HarnessResult<U256> {
        Ok(self.entry_fee)
    }

    async fn current_round(&self) -> HarnessResult<Round> {
        Ok(self.state.lock().unwrap().current().snapshot())
    }

    async fn round_by_id(&self, round_id: u64) -> HarnessResult<Round> {
        let state = self.state.lock().unwrap();
        state
            .rounds
            .iter()
            .find(|r| r.id == round_id)
            .map(RoundState::snapshot)
            .ok_or_else(|| HarnessError::read("getGame", "execution reverted: Game does not exist"))
    }

    async fn player_status(&self, player: Address) -> HarnessResult<PlayerEntry> {
        let mut state = self.state.lock().unwrap();
        Ok(match state.current().entry(player) {
            Some(e) => PlayerEntry::new(true, e.spun, e.result),
            None => PlayerEntry::default(),
        })
    }

    async fn players_of(&self, round_id: u64) -> HarnessResult<Vec<PlayerRow>> {
        let state = self.state.lock().unwrap();
        let round = state
            .rounds
            .iter()
            .find(|r| r.id == round_id)
            .ok_or_else(|| HarnessError::read("getGamePlayers", "execution reverted: Game does not exist"))?;
        Ok(round
            .entries
            .iter()
            .map(|e| PlayerRow {
                address: e.player,
                entry: PlayerEntry::new(true, e.spun, e.result),
            })
            .collect())
    }

    async fn join_round(&self, wallet: &Wallet, fee: U256) -> HarnessResult<TxOutcome> {
        let mut state = self.state.lock().unwrap();
        let player = wallet.address();
        {
            let round = state.current();
            if fee != self.entry_fee {
                return Err(HarnessError::write("joinGame", "execution reverted: Incorrect entry fee"));
            }
            if round.entry(player).is_some() {
                return Err(HarnessError::write("joinGame", "execution reverted: Already joined"));
            }
            if round.entries.len() >= self.round_size {
                return Err(HarnessError::write("joinGame", "execution reverted: Game is full"));
            }
        }

        state.charge(player, fee, self.contract_gas_cost())?;
        let round = state.current();
        round.total_pool = round.total_pool + fee;
        round.entries.push(Entry {
            player,
            spun: false,
            result: U256::zero(),
        });
        Ok(state.mine(U256::from(CONTRACT_GAS_USED)))
    }

    async fn spin(&self, wallet: &Wallet) -> HarnessResult<TxOutcome> {
        let mut state = self.state.lock().unwrap();
        let player = wallet.address();
        match state.current().entry(player) {
            None => return Err(HarnessError::write("spin", "execution reverted: Not a player")),
            Some(e) if e.spun => {
                return Err(HarnessError::write("spin", "execution reverted: Already spun"))
            }
            Some(_) => {}
        }

        state.charge(player, U256::zero(), self.contract_gas_cost())?;
        let now = state.clock;
        let round_size = self.round_size;
        let round = state.current();
        let result = outcome_for(player, round.id);
        if let Some(entry) = round.entries.iter_mut().find(|e| e.player == player) {
            entry.spun = true;
            entry.result = result;
        }
        round.status = 1;

        let settled = round.entries.len() >= round_size && round.entries.iter().all(|e| e.spun);
        let mut payout = None;
        if settled {
            // Highest result wins; ties go to the earlier joiner.
            let best = round
                .entries
                .iter()
                .fold(None::<&Entry>, |best, e| match best {
                    Some(b) if b.result >= e.result => Some(b),
                    _ => Some(e),
                })
                .map(|e| (e.player, e.result));
            if let Some((winner, winning)) = best {
                round.status = 2;
                round.winner = winner;
                round.winning = winning;
                round.completed_at = now;
                payout = Some((winner, round.total_pool));
            }
        }

        if let Some((winner, prize)) = payout {
            state.credit(winner, prize);
            let next_id = state.current().id + 1;
            state.rounds.push(RoundState::new(next_id, now));
        }
        Ok(state.mine(U256::from(CONTRACT_GAS_USED)))
    }
}

#[async_trait]
impl NativeLedger for FakeChain {
    async fn balance(&self, address: Address) -> HarnessResult<U256> {
        Ok(self.balance_of(address))
    }

    async fn gas_price(&self) -> HarnessResult<U256> {
        Ok(self.gas_price)
    }

    async fn transfer(
        &self,
        wallet: &Wallet,
        to: Address,
        value: U256,
        gas_limit: U256,
        gas_price: U256,
    ) -> HarnessResult<TxOutcome> {
        let mut state = self.state.lock().unwrap();
        let from = wallet.address();
        state.charge(from, value, gas_limit * gas_price)?;
        state.credit(to, value);
        state.transfers.push((from, to, value));
        Ok(state.mine(gas_limit))
    }
}
