//! Capabilities the operator commands consume from the engine.
//!
//! Each round-trip is fallible and reports an [`EngineError`], which keeps
//! "cluster unreachable" distinguishable from "no data" or "finished".
//!
//! Row iteration is a lending sequence: the column sequence handed out for a
//! row borrows the row sequence, so a row's columns must be drained (or
//! dropped) before the next row can be fetched.

/// Failures reported by engine round-trips.
pub mod error;

use std::{future::Future, sync::Arc, time::Duration};

use bytes::Bytes;

pub use self::error::EngineError;
use crate::{
    mvcc::Timestamp,
    query::{Column, ScanQuery},
};

/// Source of the outstanding reactive-work count.
pub trait NotificationSource {
    /// Number of notifications not yet processed.
    fn count(&self) -> impl Future<Output = Result<u64, EngineError>>;
}

/// The engine's monotonic logical clock (its timestamp oracle).
///
/// Every read advances the clock at least once; any commit between two reads
/// advances it further.
pub trait LogicalClock {
    /// Allocate and return the current timestamp.
    fn now(&self) -> impl Future<Output = Result<Timestamp, EngineError>>;
}

/// Opens consistent point-in-time views over the key-value data.
pub trait SnapshotSource {
    /// Lazy row sequence bound to one snapshot; dropping it releases the snapshot.
    type Snapshot: RowSequence;

    /// Open a snapshot restricted to `query`.
    fn open(&self, query: ScanQuery) -> impl Future<Output = Result<Self::Snapshot, EngineError>>;
}

/// Forward-only sequence of rows in key order.
pub trait RowSequence {
    /// Columns of one row, borrowing the sequence until dropped.
    type Columns<'row>: ColumnSequence
    where
        Self: 'row;

    /// Fetch the next row, or `None` once the span is exhausted.
    fn next_row(
        &mut self,
    ) -> impl Future<Output = Result<Option<(Bytes, Self::Columns<'_>)>, EngineError>>;
}

/// Forward-only sequence of `(column, value)` pairs within one row.
pub trait ColumnSequence {
    /// Fetch the next column, or `None` once the row is exhausted.
    fn next_column(&mut self) -> impl Future<Output = Result<Option<(Column, Bytes)>, EngineError>>;
}

impl<T: NotificationSource + ?Sized> NotificationSource for &T {
    fn count(&self) -> impl Future<Output = Result<u64, EngineError>> {
        (**self).count()
    }
}

impl<T: NotificationSource + ?Sized> NotificationSource for Arc<T> {
    fn count(&self) -> impl Future<Output = Result<u64, EngineError>> {
        (**self).count()
    }
}

impl<T: LogicalClock + ?Sized> LogicalClock for &T {
    fn now(&self) -> impl Future<Output = Result<Timestamp, EngineError>> {
        (**self).now()
    }
}

impl<T: LogicalClock + ?Sized> LogicalClock for Arc<T> {
    fn now(&self) -> impl Future<Output = Result<Timestamp, EngineError>> {
        (**self).now()
    }
}

impl<T: SnapshotSource + ?Sized> SnapshotSource for &T {
    type Snapshot = T::Snapshot;

    fn open(&self, query: ScanQuery) -> impl Future<Output = Result<Self::Snapshot, EngineError>> {
        (**self).open(query)
    }
}

/// Bound an engine round-trip by the client retry timeout.
pub(crate) async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, EngineError>
where
    F: Future<Output = Result<T, EngineError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| EngineError::Timeout(timeout))?
}
