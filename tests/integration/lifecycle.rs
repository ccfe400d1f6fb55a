//! End-to-end round lifecycle: join, spin, settle, sweep.

use rust_decimal_macros::dec;
use web3::types::{Address, U256};

use spinboard::engine::joiner::JoinOrchestrator;
use spinboard::engine::outcome::{SkipReason, WalletOutcome};
use spinboard::engine::reporter::SettlementReporter;
use spinboard::engine::spinner::SpinOrchestrator;
use spinboard::engine::sweeper::{SweepMode, Sweeper};
use spinboard::types::{ether_to_wei, RoundStatus};
use spinboard::wallets::{Wallet, WalletPool};

use crate::fake_authority::FakeChain;

const GWEI: u64 = 1_000_000_000;

fn eth(amount: rust_decimal::Decimal) -> U256 {
    ether_to_wei(amount).unwrap()
}

fn pool(n: usize) -> WalletPool {
    WalletPool::from_wallets(
        (1..=n)
            .map(|i| Wallet::from_secret_hex(i, &format!("{:064x}", i + 500)).unwrap())
            .collect(),
    )
}

/// Chain with a 0.00002 ETH fee, 1 gwei gas, and every pool wallet funded.
fn funded_chain(pool: &WalletPool, round_size: usize) -> FakeChain {
    let chain = FakeChain::new(eth(dec!(0.00002)), U256::from(GWEI), round_size);
    for addr in pool.addresses() {
        chain.fund(addr, eth(dec!(0.01)));
    }
    chain
}

#[tokio::test]
async fn test_three_wallets_join_then_spin_to_completion() {
    let pool = pool(3);
    let chain = funded_chain(&pool, 3);

    let joined = JoinOrchestrator::new(&chain).run(&pool, 3).await.unwrap();
    assert_eq!(joined.joined(), 3);
    assert!(!joined.is_partial());

    let reporter = SettlementReporter::new(&chain);
    let current = reporter.current().await.unwrap();
    assert_eq!(current.round.id, 1);
    assert_eq!(current.round.player_count, 3);
    assert_eq!(current.round.total_pool, eth(dec!(0.00006)));
    assert_eq!(current.round.status, RoundStatus::Waiting);

    let spun = SpinOrchestrator::new(&chain).run(&pool).await.unwrap();
    assert_eq!(spun.succeeded(), 3);

    let results = reporter.results(1).await.unwrap();
    assert_eq!(results.round.status, RoundStatus::Completed);
    let players = results.players.unwrap();
    assert_eq!(players.len(), 3);
    assert!(players.iter().all(|p| p.entry.has_spun && p.entry.outcome.is_some()));
    assert_eq!(
        players.iter().map(|p| p.address).collect::<Vec<_>>(),
        pool.addresses()
    );

    let winner = results.round.winner().unwrap();
    assert!(pool.addresses().contains(&winner));
    let best = players.iter().filter_map(|p| p.entry.outcome).max();
    assert_eq!(results.round.winning_outcome(), best);

    // A fresh round opens once the previous one settles.
    let next = reporter.current().await.unwrap();
    assert_eq!(next.round.id, 2);
    assert_eq!(next.round.player_count, 0);
}

#[tokio::test]
async fn test_join_twice_grows_pool_once() {
    let pool = pool(1);
    let chain = funded_chain(&pool, 3);
    let orchestrator = JoinOrchestrator::new(&chain);

    let first = orchestrator.run(&pool, 1).await.unwrap();
    assert_eq!(first.joined(), 1);

    let second = orchestrator.run(&pool, 1).await.unwrap();
    assert_eq!(second.joined(), 0);
    assert_eq!(second.batch.skipped(), 1);
    assert!(second.is_partial());
    assert!(matches!(
        second.batch.results[0].outcome,
        WalletOutcome::Skipped(SkipReason::AlreadyJoined)
    ));

    let round = SettlementReporter::new(&chain).current().await.unwrap().round;
    assert_eq!(round.player_count, 1);
    assert_eq!(round.total_pool, eth(dec!(0.00002)));
}

#[tokio::test]
async fn test_spin_twice_spins_once() {
    let pool = pool(3);
    // Round of 3 with only 2 joined stays open after both spin.
    let chain = funded_chain(&pool, 3);
    JoinOrchestrator::new(&chain).run(&pool, 2).await.unwrap();

    let spinner = SpinOrchestrator::new(&chain);
    let first = spinner.run(&pool).await.unwrap();
    assert_eq!(first.succeeded(), 2);
    assert!(matches!(
        first.results[2].outcome,
        WalletOutcome::Skipped(SkipReason::NotJoined)
    ));

    let txs_before = chain.tx_count();
    let second = spinner.run(&pool).await.unwrap();
    assert_eq!(second.succeeded(), 0);
    assert_eq!(chain.tx_count(), txs_before);
    assert!(matches!(
        second.results[0].outcome,
        WalletOutcome::Skipped(SkipReason::AlreadySpun { outcome: Some(_) })
    ));

    let round = SettlementReporter::new(&chain).current().await.unwrap().round;
    assert_eq!(round.status, RoundStatus::Spinning);
    assert_eq!(round.winner(), None);
}

#[tokio::test]
async fn test_unfunded_wallet_does_not_stop_join_phase() {
    let pool = pool(3);
    let chain = funded_chain(&pool, 3);
    chain.fund(pool.addresses()[0], U256::zero());

    let report = JoinOrchestrator::new(&chain).run(&pool, 2).await.unwrap();
    assert_eq!(report.joined(), 2);
    assert_eq!(report.batch.failed(), 1);
    assert_eq!(report.batch.succeeded_addresses(), pool.addresses()[1..].to_vec());
}

#[tokio::test]
async fn test_confirmed_sweep_moves_exact_surplus() {
    let pool = pool(1);
    let wallet = pool.addresses()[0];
    let treasury = Address::repeat_byte(0x77);
    let chain = FakeChain::new(eth(dec!(0.00002)), U256::from(GWEI), 3);
    chain.fund(wallet, eth(dec!(0.0001)));

    let report = Sweeper::new(&chain, treasury, U256::from(21_000), SweepMode::Confirmed)
        .run(&pool)
        .await
        .unwrap();

    assert_eq!(report.reserved_cost, eth(dec!(0.000021)));
    assert_eq!(report.batch.succeeded(), 1);
    assert_eq!(chain.transfers(), vec![(wallet, treasury, eth(dec!(0.000079)))]);
    assert_eq!(chain.balance_of(treasury), eth(dec!(0.000079)));
    assert!(chain.balance_of(wallet).is_zero());
}

#[tokio::test]
async fn test_dry_run_sweep_submits_nothing() {
    let pool = pool(2);
    let treasury = Address::repeat_byte(0x77);
    let chain = funded_chain(&pool, 3);

    let report = Sweeper::new(&chain, treasury, U256::from(21_000), SweepMode::DryRun)
        .run(&pool)
        .await
        .unwrap();

    assert!(chain.transfers().is_empty());
    assert_eq!(chain.tx_count(), 0);
    assert_eq!(report.batch.skipped(), 2);
    assert_eq!(report.total_transferable(), eth(dec!(0.019958)));
    for addr in pool.addresses() {
        assert_eq!(chain.balance_of(addr), eth(dec!(0.01)));
    }
}
