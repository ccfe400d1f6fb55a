//! SPINBOARD: operator harness for SpinDBoard game rounds.
//!
//! Entry point. Loads `.env` and the optional TOML config, initialises
//! structured logging, then dispatches one command: read the round, drive
//! the wallet pool through join/spin, report settlement, sweep balances, or
//! generate fresh wallets.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use spinboard::authority::evm::EvmClient;
use spinboard::config::{self, AppConfig};
use spinboard::engine::joiner::JoinOrchestrator;
use spinboard::engine::reporter::{self, RoundSummary, SettlementReporter};
use spinboard::engine::spinner::SpinOrchestrator;
use spinboard::engine::sweeper::{SweepMode, Sweeper};
use spinboard::keygen;
use spinboard::wallets::{WalletCredentials, WalletPool};

const BANNER: &str = r#"
 ____  ____ ___ _   _ ____   ___    _    ____  ____
/ ___||  _ \_ _| \ | | __ ) / _ \  / \  |  _ \|  _ \
\___ \| |_) | ||  \| |  _ \| | | |/ _ \ | |_) | | | |
 ___) |  __/| || |\  | |_) | |_| / ___ \|  _ <| |_| |
|____/|_|  |___|_| \_|____/ \___/_/   \_\_| \_\____/

  SpinDBoard operator harness
  v0.1.0
"#;

#[derive(Parser, Debug)]
#[command(name = "spinboard", version, about = "Drive wallets through SpinDBoard rounds")]
struct Cli {
    /// Optional TOML config file
    #[arg(long, global = true, default_value = "spinboard.toml")]
    config: PathBuf,

    /// Print round summaries as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current round
    Status,
    /// Join up to K pool wallets into the current round
    Join {
        #[arg(long, default_value_t = 3, value_parser = positive_count())]
        players: usize,
    },
    /// Spin once for every joined wallet that has not spun
    Spin,
    /// Join, spin, then print the round
    Demo {
        #[arg(long, default_value_t = 3, value_parser = positive_count())]
        players: usize,
    },
    /// Print a historical round with its player table
    Results {
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        round_id: u64,
    },
    /// Move each wallet's surplus balance to the treasury (dry run unless confirmed)
    Sweep {
        #[arg(long)]
        confirm: bool,
    },
    /// Print fresh wallets as .env lines
    Keygen {
        #[arg(long, value_parser = positive_count())]
        count: Option<usize>,
    },
}

/// Counts must be at least 1; rejected while parsing, before any remote call.
fn positive_count() -> clap::builder::RangedU64ValueParser<usize> {
    clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging();

    let mut cfg = AppConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    cfg.apply_env(config::env_lookup)
        .context("applying environment overrides")?;

    // keygen output is meant to be redirected into .env, so no banner
    if !matches!(cli.command, Command::Keygen { .. }) {
        println!("{BANNER}");
        info!(endpoint = %cfg.network.endpoint, command = ?cli.command, "SPINBOARD starting up");
    }

    let credentials = WalletCredentials::from_env(cfg.wallets.max_wallets);

    match cli.command {
        Command::Status => {
            let client = connect_game(&cfg).await?;
            print_current(&client, cli.json).await?;
        }
        Command::Join { players } => {
            let client = connect_game(&cfg).await?;
            let pool = WalletPool::load_required(&credentials, cfg.wallets.max_wallets)?;
            let report = JoinOrchestrator::new(&client)
                .run(&pool, players)
                .await
                .context("join phase aborted")?;
            print!("{}", reporter::render_join(&report));
            print_current(&client, cli.json).await?;
        }
        Command::Spin => {
            let client = connect_game(&cfg).await?;
            let pool = WalletPool::load_required(&credentials, cfg.wallets.max_wallets)?;
            let batch = SpinOrchestrator::new(&client)
                .run(&pool)
                .await
                .context("spin phase aborted")?;
            print!("{}", reporter::render_batch(&batch));
            print_current(&client, cli.json).await?;
        }
        Command::Demo { players } => {
            let client = connect_game(&cfg).await?;
            let pool = WalletPool::load_required(&credentials, cfg.wallets.max_wallets)?;
            let joined = JoinOrchestrator::new(&client)
                .run(&pool, players)
                .await
                .context("join phase aborted")?;
            print!("{}", reporter::render_join(&joined));
            let spun = SpinOrchestrator::new(&client)
                .run(&pool)
                .await
                .context("spin phase aborted")?;
            print!("{}", reporter::render_batch(&spun));
            print_current(&client, cli.json).await?;
        }
        Command::Results { round_id } => {
            let client = connect_game(&cfg).await?;
            let summary = SettlementReporter::new(&client)
                .results(round_id)
                .await
                .with_context(|| format!("reading round {round_id}"))?;
            print_summary(&summary, cli.json)?;
        }
        Command::Sweep { confirm } => {
            let destination = cfg.sweep_destination()?;
            let pool = WalletPool::load_required(&credentials, cfg.wallets.max_wallets)?;
            let client = EvmClient::connect(&cfg, None)?;
            client.describe().await.context("RPC endpoint unreachable")?;

            let mode = SweepMode::from_confirm(confirm || cfg.sweep.confirm);
            let report = Sweeper::new(&client, destination, cfg.sweep_gas_limit(), mode)
                .run(&pool)
                .await
                .context("sweep aborted")?;
            print!("{}", reporter::render_sweep(&report));
        }
        Command::Keygen { count } => {
            let wallets = keygen::generate(count.unwrap_or(cfg.wallets.generate_count))?;
            print!("{}", keygen::render_env_lines(&wallets));
        }
    }

    Ok(())
}

/// Connect with the game contract attached and log chain id / block.
async fn connect_game(cfg: &AppConfig) -> Result<EvmClient> {
    let address = cfg.contract_address()?;
    let client = EvmClient::connect(cfg, Some(address))?;
    client.describe().await.context("RPC endpoint unreachable")?;
    info!(contract = ?address, "Using SpinDBoard contract");
    Ok(client)
}

async fn print_current(client: &EvmClient, json: bool) -> Result<()> {
    let summary = SettlementReporter::new(client)
        .current()
        .await
        .context("reading current round")?;
    print_summary(&summary, json)
}

fn print_summary(summary: &RoundSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", summary.render_json().context("encoding round summary")?);
    } else {
        print!("{}", summary.render_text());
    }
    Ok(())
}

/// Initialise the tracing subscriber.
///
/// Uses JSON format when `SPINBOARD_LOG_JSON` is set, otherwise
/// human-readable output. Log level defaults to `spinboard=info` and can be
/// overridden with `RUST_LOG`. Logs go to stderr; stdout carries reports.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("spinboard=info"));

    let json_logging = std::env::var("SPINBOARD_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
