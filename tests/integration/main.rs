//! Integration tests: full round lifecycle against an in-memory contract.

mod fake_authority;
mod lifecycle;
