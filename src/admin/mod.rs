//! Operator commands behind the `flowctl` binary.
//!
//! Everything here is driven through the engine traits, so the same commands
//! run against [`MemoryEngine`](crate::inmem::MemoryEngine) in tests and
//! against a real cluster handle in production.

pub mod cli;
mod commands;

pub use self::commands::{load_tsv, run_scan, run_wait, Exit};
