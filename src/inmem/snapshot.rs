use std::{ops::Bound, sync::Arc};

use bytes::Bytes;

use super::{CellKey, Inner};
use crate::{
    engine::{ColumnSequence, EngineError, RowSequence},
    mvcc::{Timestamp, Timestamped},
    query::{Column, ScanQuery},
};

/// Read view pinned at one timestamp.
///
/// Rows are located lazily by re-seeking the skip list from the last row
/// returned, so commits made after the snapshot opened are never observed.
#[derive(Debug)]
pub struct MemorySnapshot {
    inner: Arc<Inner>,
    read_ts: Timestamp,
    query: ScanQuery,
    next_start: Bound<Bytes>,
    exhausted: bool,
}

impl MemorySnapshot {
    pub(super) fn new(inner: Arc<Inner>, read_ts: Timestamp, query: ScanQuery) -> Self {
        let next_start = query.span().start.clone();
        let exhausted = query.span().is_empty();
        Self {
            inner,
            read_ts,
            query,
            next_start,
            exhausted,
        }
    }

    /// Timestamp the snapshot reads at.
    pub fn read_ts(&self) -> Timestamp {
        self.read_ts
    }
}

impl RowSequence for MemorySnapshot {
    type Columns<'row> = MemoryColumns<'row>;

    async fn next_row(&mut self) -> Result<Option<(Bytes, MemoryColumns<'_>)>, EngineError> {
        self.inner.check_available()?;
        if self.exhausted {
            return Ok(None);
        }
        match self
            .inner
            .first_row(&self.next_start, &self.query, self.read_ts)
        {
            None => {
                self.exhausted = true;
                Ok(None)
            }
            Some(row) => {
                self.next_start = Bound::Excluded(row.clone());
                let columns = MemoryColumns {
                    inner: self.inner.as_ref(),
                    query: &self.query,
                    read_ts: self.read_ts,
                    row: row.clone(),
                    resume: None,
                    resolved: None,
                };
                Ok(Some((row, columns)))
            }
        }
    }
}

/// Visible columns of one row in a [`MemorySnapshot`].
#[derive(Debug)]
pub struct MemoryColumns<'row> {
    inner: &'row Inner,
    query: &'row ScanQuery,
    read_ts: Timestamp,
    row: Bytes,
    resume: Option<Timestamped<CellKey>>,
    resolved: Option<CellKey>,
}

impl ColumnSequence for MemoryColumns<'_> {
    async fn next_column(&mut self) -> Result<Option<(Column, Bytes)>, EngineError> {
        let inner = self.inner;
        inner.check_available()?;
        let lower = match self.resume.take() {
            Some(key) => Bound::Excluded(key),
            None => Bound::Included(CellKey::row_start(self.row.clone())),
        };
        for entry in inner
            .cells
            .range::<Timestamped<CellKey>, _>((lower, Bound::Unbounded))
        {
            let key = entry.key();
            if key.value().row != self.row {
                break;
            }
            self.resume = Some(key.clone());
            if key.ts() > self.read_ts || self.resolved.as_ref() == Some(key.value()) {
                continue;
            }
            self.resolved = Some(key.value().clone());
            if let Some(value) = entry.value() {
                if self.query.wants_column(&key.value().column) {
                    return Ok(Some((key.value().column.clone(), value.clone())));
                }
            }
        }
        Ok(None)
    }
}
