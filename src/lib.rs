#![deny(missing_docs)]
//! Operator tooling for a transactional, notification-driven dataflow engine.
//!
//! Two operations are provided on top of a small set of engine capabilities:
//!
//! - [`scanner::ScanExecutor`] streams a consistent snapshot of the key-value
//!   data, restricted by a [`query::ScanQuery`] built with
//!   [`query::SpanBuilder`].
//! - [`quiescence::QuiescenceDetector`] blocks until every pending
//!   notification has been processed, using a clock-bracketed count so a
//!   commit racing the sample is never mistaken for an idle cluster.
//!
//! The engine is reached only through the traits in [`engine`];
//! [`inmem::MemoryEngine`] implements all of them in process.

pub(crate) mod observability;

pub mod backoff;
pub mod engine;
pub mod inmem;
pub mod mvcc;
/// Operator-facing configuration shared by every command.
pub mod option;
pub mod query;
pub mod quiescence;
pub mod scan;
pub mod scanner;

/// Command-line front end, built with the `cli` feature.
#[cfg(feature = "cli")]
pub mod admin;

pub use crate::{
    backoff::BackoffPolicy,
    engine::{EngineError, LogicalClock, NotificationSource, SnapshotSource},
    inmem::MemoryEngine,
    option::OperatorConfig,
    query::{ConfigError, ScanQuery, SpanBuilder},
    quiescence::{QuiescenceDetector, WaitError, WaitOutcome},
    scanner::{OutputSink, ScanError, ScanExecutor, ScanOutcome, ScanSummary},
};
