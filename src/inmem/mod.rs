//! In-process engine implementing every capability flowctl consumes.
//!
//! Cells are versioned in a skip list keyed by `(row, column)` and commit
//! timestamp; deletes are stored as tombstones. A single atomic counter acts
//! as the timestamp oracle: clock reads and commits each allocate one tick.

mod snapshot;

use std::{
    ops::Bound,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use bytes::Bytes;
use crossbeam_skiplist::SkipMap;

pub use self::snapshot::{MemoryColumns, MemorySnapshot};
use crate::{
    engine::{EngineError, LogicalClock, NotificationSource, SnapshotSource},
    mvcc::{Timestamp, Timestamped},
    observability::log_debug,
    query::{Column, ScanQuery},
    scan::following_row,
};

/// Address of one cell.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct CellKey {
    pub(crate) row: Bytes,
    pub(crate) column: Column,
}

impl CellKey {
    fn new(row: impl Into<Bytes>, column: Column) -> Self {
        Self {
            row: row.into(),
            column,
        }
    }

    /// Seek key sorting before every version of every cell in `row`.
    pub(crate) fn row_start(row: Bytes) -> Timestamped<Self> {
        Timestamped::new(
            Self {
                row,
                column: Column::default(),
            },
            Timestamp::MAX,
        )
    }
}

#[derive(Debug)]
enum Mutation {
    Set(CellKey, Bytes),
    Delete(CellKey),
    Notify(CellKey),
    Ack(CellKey),
}

/// Mutations applied atomically by [`MemoryEngine::commit`].
#[derive(Debug, Default)]
pub struct WriteBatch {
    mutations: Vec<Mutation>,
}

impl WriteBatch {
    /// Empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `value` into a cell.
    pub fn set(mut self, row: impl Into<Bytes>, column: Column, value: impl Into<Bytes>) -> Self {
        self.mutations
            .push(Mutation::Set(CellKey::new(row, column), value.into()));
        self
    }

    /// Delete a cell.
    pub fn delete(mut self, row: impl Into<Bytes>, column: Column) -> Self {
        self.mutations
            .push(Mutation::Delete(CellKey::new(row, column)));
        self
    }

    /// Mark a cell as needing observer processing.
    pub fn notify(mut self, row: impl Into<Bytes>, column: Column) -> Self {
        self.mutations
            .push(Mutation::Notify(CellKey::new(row, column)));
        self
    }

    /// Clear a cell's pending notification.
    pub fn ack(mut self, row: impl Into<Bytes>, column: Column) -> Self {
        self.mutations.push(Mutation::Ack(CellKey::new(row, column)));
        self
    }

    /// Number of queued mutations.
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Whether the batch holds no mutations.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

#[derive(Debug)]
pub(crate) struct Inner {
    clock: AtomicU64,
    available: AtomicBool,
    commit_lock: Mutex<()>,
    pub(crate) cells: SkipMap<Timestamped<CellKey>, Option<Bytes>>,
    notifications: SkipMap<CellKey, Timestamp>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            clock: AtomicU64::new(0),
            available: AtomicBool::new(true),
            commit_lock: Mutex::new(()),
            cells: SkipMap::new(),
            notifications: SkipMap::new(),
        }
    }
}

impl Inner {
    pub(crate) fn check_available(&self) -> Result<(), EngineError> {
        if self.available.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(EngineError::Unavailable(
                "memory engine is offline".to_string(),
            ))
        }
    }

    fn tick(&self) -> Timestamp {
        Timestamp::new(self.clock.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// First row at or after `start` that holds a visible cell passing the
    /// query's filters and lies inside the span.
    pub(crate) fn first_row(
        &self,
        start: &Bound<Bytes>,
        query: &ScanQuery,
        read_ts: Timestamp,
    ) -> Option<Bytes> {
        let lower = match start {
            Bound::Unbounded => Bound::Unbounded,
            Bound::Included(row) => Bound::Included(CellKey::row_start(row.clone())),
            Bound::Excluded(row) => Bound::Included(CellKey::row_start(following_row(row))),
        };
        let mut resolved: Option<CellKey> = None;
        for entry in self
            .cells
            .range::<Timestamped<CellKey>, _>((lower, Bound::Unbounded))
        {
            let key = entry.key();
            let cell = key.value();
            if !query.span().before_end(&cell.row) {
                return None;
            }
            if key.ts() > read_ts || resolved.as_ref() == Some(cell) {
                continue;
            }
            resolved = Some(cell.clone());
            if entry.value().is_some() && query.wants_column(&cell.column) {
                return Some(cell.row.clone());
            }
        }
        None
    }
}

/// Cheaply cloneable handle to an in-process engine.
#[derive(Clone, Debug, Default)]
pub struct MemoryEngine {
    inner: Arc<Inner>,
}

impl MemoryEngine {
    /// Empty engine with its clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the engine becoming unreachable (`false`) or recovering (`true`).
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::Release);
    }

    /// Current clock value without allocating a tick.
    pub fn peek_clock(&self) -> Timestamp {
        Timestamp::new(self.inner.clock.load(Ordering::SeqCst))
    }

    /// Apply every mutation in `batch` at one freshly allocated timestamp.
    pub fn commit(&self, batch: WriteBatch) -> Result<Timestamp, EngineError> {
        self.inner.check_available()?;
        let _guard = self
            .inner
            .commit_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let ts = self.inner.tick();
        let mutations = batch.mutations.len();
        for mutation in batch.mutations {
            match mutation {
                Mutation::Set(cell, value) => {
                    self.inner
                        .cells
                        .insert(Timestamped::new(cell, ts), Some(value));
                }
                Mutation::Delete(cell) => {
                    self.inner.cells.insert(Timestamped::new(cell, ts), None);
                }
                Mutation::Notify(cell) => {
                    self.inner.notifications.insert(cell, ts);
                }
                Mutation::Ack(cell) => {
                    self.inner.notifications.remove(&cell);
                }
            }
        }
        log_debug!(
            component = "inmem",
            event = "batch_committed",
            ts = %ts,
            mutations = mutations,
        );
        Ok(ts)
    }
}

impl NotificationSource for MemoryEngine {
    async fn count(&self) -> Result<u64, EngineError> {
        self.inner.check_available()?;
        Ok(self.inner.notifications.len() as u64)
    }
}

impl LogicalClock for MemoryEngine {
    async fn now(&self) -> Result<Timestamp, EngineError> {
        self.inner.check_available()?;
        Ok(self.inner.tick())
    }
}

impl SnapshotSource for MemoryEngine {
    type Snapshot = MemorySnapshot;

    async fn open(&self, query: ScanQuery) -> Result<MemorySnapshot, EngineError> {
        self.inner.check_available()?;
        let read_ts = {
            let _guard = self
                .inner
                .commit_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.inner.tick()
        };
        Ok(MemorySnapshot::new(Arc::clone(&self.inner), read_ts, query))
    }
}
