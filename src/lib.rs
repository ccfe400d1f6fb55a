//! SPINBOARD: operator harness for SpinDBoard game rounds.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod wallets;
pub mod authority;
pub mod engine;
pub mod keygen;
