//! Core engine: read the round, join wallets, spin, report, sweep.
//!
//! Every phase walks the wallet pool strictly one wallet at a time and
//! waits for each write to confirm before moving on.

pub mod outcome;
pub mod reader;
pub mod joiner;
pub mod spinner;
pub mod reporter;
pub mod sweeper;
