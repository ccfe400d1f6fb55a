//! Settlement reporter.
//!
//! Re-reads round state after a phase and renders it for the operator.
//! Rendering is plain text (the same shape the operator scripts always
//! printed) or JSON via `serde_json`.

use serde::Serialize;
use std::fmt::Write as _;

use crate::authority::GameAuthority;
use crate::engine::joiner::JoinReport;
use crate::engine::outcome::{BatchReport, WalletOutcome};
use crate::engine::reader::RoundReader;
use crate::engine::sweeper::{SweepMode, SweepReport};
use crate::types::{format_ether, HarnessResult, PlayerRow, Round};

/// A round plus, for historical queries, its player table.
#[derive(Debug, Clone)]
pub struct RoundSummary {
    pub round: Round,
    pub players: Option<Vec<PlayerRow>>,
}

impl RoundSummary {
    pub fn render_text(&self) -> String {
        let round = &self.round;
        let mut out = String::new();
        match self.players {
            None => {
                let _ = writeln!(out, "Current Game:");
                let _ = writeln!(out, "- id: {}", round.id);
            }
            Some(_) => {
                let _ = writeln!(out, "Game #{}", round.id);
            }
        }
        let _ = writeln!(out, "- status: {}", round.status);
        let _ = writeln!(out, "- playerCount: {}", round.player_count);
        let _ = writeln!(out, "- totalPool: {} ETH", format_ether(round.total_pool));
        let _ = writeln!(out, "- winner: {}", dash_or(round.winner().map(|a| format!("{a:?}"))));
        let _ = writeln!(
            out,
            "- winningNumber: {}",
            dash_or(round.winning_outcome().map(|n| n.to_string()))
        );
        if let Some(created) = round.created_at_utc() {
            let _ = writeln!(out, "- createdAt: {}", created.to_rfc3339());
        }
        if let Some(completed) = round.completed_at_utc() {
            let _ = writeln!(out, "- completedAt: {}", completed.to_rfc3339());
        }

        if let Some(players) = &self.players {
            let _ = writeln!(out, "Players:");
            for p in players {
                let _ = writeln!(
                    out,
                    "- {:?} | spun={} | result={}",
                    p.address,
                    p.entry.has_spun,
                    dash_or(p.entry.outcome.map(|n| n.to_string()))
                );
            }
        }
        out
    }

    /// Same fields and display rules as [`Self::render_text`], as JSON.
    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&SummaryView::from(self))
    }
}

// ---------------------------------------------------------------------------
// JSON views
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoundView {
    id: u64,
    status: String,
    player_count: u64,
    /// ETH display units.
    total_pool: String,
    winner: Option<String>,
    winning_number: Option<String>,
    created_at: Option<String>,
    completed_at: Option<String>,
}

#[derive(Serialize)]
struct PlayerView {
    address: String,
    spun: bool,
    result: Option<String>,
}

#[derive(Serialize)]
struct SummaryView {
    round: RoundView,
    players: Option<Vec<PlayerView>>,
}

impl From<&Round> for RoundView {
    fn from(round: &Round) -> Self {
        Self {
            id: round.id,
            status: round.status.to_string(),
            player_count: round.player_count,
            total_pool: format_ether(round.total_pool),
            winner: round.winner().map(|a| format!("{a:?}")),
            winning_number: round.winning_outcome().map(|n| n.to_string()),
            created_at: round.created_at_utc().map(|t| t.to_rfc3339()),
            completed_at: round.completed_at_utc().map(|t| t.to_rfc3339()),
        }
    }
}

impl From<&PlayerRow> for PlayerView {
    fn from(row: &PlayerRow) -> Self {
        Self {
            address: format!("{:?}", row.address),
            spun: row.entry.has_spun,
            result: row.entry.outcome.map(|n| n.to_string()),
        }
    }
}

impl From<&RoundSummary> for SummaryView {
    fn from(summary: &RoundSummary) -> Self {
        Self {
            round: RoundView::from(&summary.round),
            players: summary
                .players
                .as_ref()
                .map(|rows| rows.iter().map(PlayerView::from).collect()),
        }
    }
}

fn dash_or(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

/// Read-only reporter over the game authority.
pub struct SettlementReporter<'a> {
    reader: RoundReader<'a>,
}

impl<'a> SettlementReporter<'a> {
    pub fn new(authority: &'a dyn GameAuthority) -> Self {
        Self {
            reader: RoundReader::new(authority),
        }
    }

    pub async fn current(&self) -> HarnessResult<RoundSummary> {
        Ok(RoundSummary {
            round: self.reader.current_round().await?,
            players: None,
        })
    }

    /// A specific round with its full player table.
    pub async fn results(&self, round_id: u64) -> HarnessResult<RoundSummary> {
        let round = self.reader.round_by_id(round_id).await?;
        let players = self.reader.players_of(round_id).await?;
        Ok(RoundSummary {
            round,
            players: Some(players),
        })
    }
}

// ---------------------------------------------------------------------------
// Phase summaries
// ---------------------------------------------------------------------------

pub fn render_batch(batch: &BatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} phase: {} succeeded, {} skipped, {} failed",
        batch.phase,
        batch.succeeded(),
        batch.skipped(),
        batch.failed()
    );
    for r in &batch.results {
        let line = match &r.outcome {
            WalletOutcome::Succeeded(tx) => format!("ok ({tx})"),
            WalletOutcome::Skipped(reason) => format!("skip ({reason})"),
            WalletOutcome::Failed(e) => format!("FAILED ({e})"),
        };
        let _ = writeln!(out, "- [{}] {:?}: {line}", r.index, r.address);
    }
    out
}

pub fn render_join(report: &JoinReport) -> String {
    let mut out = format!(
        "Requested {} join(s) at {} ETH each; joined {}.\n",
        report.requested,
        format_ether(report.entry_fee),
        report.joined()
    );
    out.push_str(&render_batch(&report.batch));
    if report.is_partial() {
        out.push_str("Partial: not enough eligible or funded wallets to reach the target.\n");
    }
    out
}

pub fn render_sweep(report: &SweepReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Sweeping {} wallet(s) to: {:?}", report.plans.len(), report.destination);
    let _ = writeln!(out, "Mode: {}", report.mode);
    let _ = writeln!(
        out,
        "Reserved per wallet: {} ETH (gas price {} wei)",
        format_ether(report.reserved_cost),
        report.gas_price
    );
    out.push_str(&render_batch(&report.batch));
    let _ = writeln!(
        out,
        "Total transferable: {} ETH",
        format_ether(report.total_transferable())
    );
    if report.mode == SweepMode::DryRun {
        let _ = writeln!(out, "Re-run with --confirm to actually send transactions.");
    }
    out
}
