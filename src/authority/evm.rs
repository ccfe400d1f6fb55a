//! EVM JSON-RPC client for the SpinDBoard contract.
//!
//! Reads go through `eth_call`; writes are signed locally with the
//! wallet's key and awaited until the configured number of confirmations.
//! Node errors are classified into the harness error taxonomy here so the
//! engine never has to look at transport details.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};
use web3::contract::tokens::{Detokenize, Tokenize};
use web3::contract::{Contract, Options};
use web3::transports::Http;
use web3::types::{Address, TransactionParameters, TransactionReceipt, U256, U64};
use web3::Web3;

use super::abi::{GameOutput, GamePlayersOutput, PlayerInfoOutput, SPINDBOARD_ABI};
use super::{GameAuthority, NativeLedger};
use crate::config::AppConfig;
use crate::types::{HarnessError, HarnessResult, PlayerEntry, PlayerRow, Round, TxOutcome};
use crate::wallets::Wallet;

/// Substring nodes use when an account cannot cover value plus fees.
const INSUFFICIENT_FUNDS: &str = "insufficient funds";

pub struct EvmClient {
    web3: Web3<Http>,
    contract: Option<Contract<Http>>,
    confirmations: usize,
    poll_interval: Duration,
    call_gas_limit: U256,
}

impl EvmClient {
    /// Connect to the configured endpoint. The contract is optional so
    /// ledger-only commands (sweep) work without a deployed game.
    pub fn connect(cfg: &AppConfig, contract_address: Option<Address>) -> HarnessResult<Self> {
        let transport = Http::new(&cfg.network.endpoint).map_err(|e| {
            HarnessError::Configuration(format!(
                "invalid RPC endpoint {}: {e}",
                cfg.network.endpoint
            ))
        })?;
        let web3 = Web3::new(transport);

        let contract = contract_address
            .map(|address| Contract::from_json(web3.eth(), address, SPINDBOARD_ABI.as_bytes()))
            .transpose()
            .map_err(|e| HarnessError::Configuration(format!("contract ABI rejected: {e}")))?;

        Ok(Self {
            web3,
            contract,
            confirmations: cfg.network.confirmations,
            poll_interval: cfg.poll_interval(),
            call_gas_limit: U256::from(cfg.network.contract_gas_limit),
        })
    }

    /// Chain id and latest block, logged once at start-up.
    pub async fn describe(&self) -> HarnessResult<(U256, u64)> {
        let chain_id = self
            .web3
            .eth()
            .chain_id()
            .await
            .map_err(|e| HarnessError::read("eth_chainId", e))?;
        let block = self
            .web3
            .eth()
            .block_number()
            .await
            .map_err(|e| HarnessError::read("eth_blockNumber", e))?;
        info!(chain_id = %chain_id, block = block.as_u64(), "Connected to node");
        Ok((chain_id, block.as_u64()))
    }

    fn contract(&self) -> HarnessResult<&Contract<Http>> {
        self.contract.as_ref().ok_or_else(|| {
            HarnessError::Configuration("missing SPINDBOARD_CONTRACT_ADDRESS".into())
        })
    }

    async fn query<R, P>(&self, func: &'static str, params: P) -> HarnessResult<R>
    where
        R: Detokenize + Send,
        P: Tokenize + Send,
    {
        debug!(func, "eth_call");
        self.contract()?
            .query(func, params, None, Options::default(), None)
            .await
            .map_err(|e| HarnessError::read(func, e))
    }

    async fn signed_call(
        &self,
        func: &'static str,
        wallet: &Wallet,
        value: Option<U256>,
    ) -> HarnessResult<TxOutcome> {
        let options = Options {
            gas: Some(self.call_gas_limit),
            value,
            ..Default::default()
        };
        let receipt = self
            .contract()?
            .signed_call_with_confirmations(
                func,
                (),
                options,
                self.confirmations,
                wallet.signing_key(),
            )
            .await
            .map_err(|e| classify_write_error(func, wallet.address(), e))?;
        confirmed(func, receipt)
    }
}

/// Map a node error from a write into the harness taxonomy.
fn classify_write_error(
    call: &'static str,
    address: Address,
    err: impl std::fmt::Display,
) -> HarnessError {
    let reason = err.to_string();
    if reason.to_lowercase().contains(INSUFFICIENT_FUNDS) {
        HarnessError::InsufficientFunds { address, reason }
    } else {
        HarnessError::RemoteWrite { call, reason }
    }
}

fn confirmed(call: &'static str, receipt: TransactionReceipt) -> HarnessResult<TxOutcome> {
    settle_receipt(
        call,
        TxOutcome {
            hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|b| b.as_u64()),
            gas_used: receipt.gas_used,
        },
        receipt.status,
    )
}

/// A mined receipt with status 0 is a revert.
fn settle_receipt(
    call: &'static str,
    outcome: TxOutcome,
    status: Option<U64>,
) -> HarnessResult<TxOutcome> {
    if status == Some(U64::zero()) {
        return Err(HarnessError::write(
            call,
            format!("transaction {:?} reverted", outcome.hash),
        ));
    }
    Ok(outcome)
}

#[async_trait]
impl GameAuthority for EvmClient {
    async fn entry_fee(&self) -> HarnessResult<U256> {
        self.query("ENTRY_FEE", ()).await
    }

    async fn current_round(&self) -> HarnessResult<Round> {
        let GameOutput(round) = self.query("getCurrentGame", ()).await?;
        Ok(round)
    }

    async fn round_by_id(&self, round_id: u64) -> HarnessResult<Round> {
        let GameOutput(round) = self.query("getGame", (U256::from(round_id),)).await?;
        Ok(round)
    }

    async fn player_status(&self, player: Address) -> HarnessResult<PlayerEntry> {
        let PlayerInfoOutput(entry) = self.query("getPlayerInfo", (player,)).await?;
        Ok(entry)
    }

    async fn players_of(&self, round_id: u64) -> HarnessResult<Vec<PlayerRow>> {
        let GamePlayersOutput(rows) = self
            .query("getGamePlayers", (U256::from(round_id),))
            .await?;
        Ok(rows)
    }

    async fn join_round(&self, wallet: &Wallet, fee: U256) -> HarnessResult<TxOutcome> {
        self.signed_call("joinGame", wallet, Some(fee)).await
    }

    async fn spin(&self, wallet: &Wallet) -> HarnessResult<TxOutcome> {
        self.signed_call("spin", wallet, None).await
    }
}

#[async_trait]
impl NativeLedger for EvmClient {
    async fn balance(&self, address: Address) -> HarnessResult<U256> {
        self.web3
            .eth()
            .balance(address, None)
            .await
            .map_err(|e| HarnessError::read("eth_getBalance", e))
    }

    async fn gas_price(&self) -> HarnessResult<U256> {
        self.web3
            .eth()
            .gas_price()
            .await
            .map_err(|e| HarnessError::read("eth_gasPrice", e))
    }

    async fn transfer(
        &self,
        wallet: &Wallet,
        to: Address,
        value: U256,
        gas_limit: U256,
        gas_price: U256,
    ) -> HarnessResult<TxOutcome> {
        let tx = TransactionParameters {
            to: Some(to),
            value,
            gas: gas_limit,
            gas_price: Some(gas_price),
            ..Default::default()
        };
        let signed = self
            .web3
            .accounts()
            .sign_transaction(tx, wallet.signing_key())
            .await
            .map_err(|e| classify_write_error("transfer", wallet.address(), e))?;
        let receipt = self
            .web3
            .send_raw_transaction_with_confirmation(
                signed.raw_transaction,
                self.poll_interval,
                self.confirmations,
            )
            .await
            .map_err(|e| classify_write_error("transfer", wallet.address(), e))?;
        confirmed("transfer", receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web3::types::H256;

    #[test]
    fn test_classify_insufficient_funds() {
        let err = classify_write_error(
            "joinGame",
            Address::repeat_byte(1),
            "RPC error: insufficient funds for gas * price + value",
        );
        assert!(matches!(err, HarnessError::InsufficientFunds { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_classify_revert() {
        let err = classify_write_error("spin", Address::zero(), "execution reverted: Already spun");
        assert!(matches!(err, HarnessError::RemoteWrite { call: "spin", .. }));
    }

    fn outcome() -> TxOutcome {
        TxOutcome {
            hash: H256::repeat_byte(7),
            block_number: Some(12),
            gas_used: Some(U256::from(21_000)),
        }
    }

    #[test]
    fn test_reverted_receipt_is_write_error() {
        let err = settle_receipt("spin", outcome(), Some(U64::zero())).unwrap_err();
        assert!(err.to_string().contains("reverted"));
    }

    #[test]
    fn test_successful_receipt() {
        let settled = settle_receipt("transfer", outcome(), Some(U64::one())).unwrap();
        assert_eq!(settled.block_number, Some(12));
        // Pre-Byzantium receipts carry no status at all.
        assert!(settle_receipt("transfer", outcome(), None).is_ok());
    }

    #[test]
    fn test_connect_without_contract() {
        let client = EvmClient::connect(&AppConfig::default(), None).unwrap();
        assert!(client.contract().is_err());
    }
}
