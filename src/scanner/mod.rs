//! Stream a snapshot scan into an output sink.

mod sink;

use std::time::Duration;

use thiserror::Error;

pub use self::sink::{Backpressure, CollectSink, OutputSink, ScanEntry, WriteSink};
use crate::{
    engine::{bounded, ColumnSequence, EngineError, RowSequence, SnapshotSource},
    observability::{log_debug, log_error, log_info},
    option::OperatorConfig,
    query::ScanQuery,
};

/// How a scan that did not fail came to an end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Every row in the span was visited.
    Completed,
    /// The span held no rows.
    NoData,
    /// The sink stopped accepting output.
    SinkClosed,
}

/// Result of a scan that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanSummary {
    /// Entries accepted by the sink.
    pub entries_emitted: u64,
    /// Rows fetched from the snapshot.
    pub rows: u64,
    /// Why the scan stopped.
    pub outcome: ScanOutcome,
}

/// Engine failure during a scan; entries already emitted are kept.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The snapshot could not be opened or a fetch failed.
    #[error("scan failed after {entries_emitted} entries: {source}")]
    EngineFailure {
        /// Underlying engine error.
        #[source]
        source: EngineError,
        /// Entries accepted by the sink before the failure.
        entries_emitted: u64,
    },
}

impl ScanError {
    /// Entries accepted by the sink before the failure.
    pub fn entries_emitted(&self) -> u64 {
        match self {
            ScanError::EngineFailure {
                entries_emitted, ..
            } => *entries_emitted,
        }
    }

    /// The engine error that stopped the scan.
    pub fn engine_error(&self) -> &EngineError {
        match self {
            ScanError::EngineFailure { source, .. } => source,
        }
    }
}

/// Runs one scan against one snapshot.
#[derive(Clone, Copy, Debug)]
pub struct ScanExecutor {
    fetch_timeout: Duration,
}

impl ScanExecutor {
    /// Executor bounding every fetch by the configured client retry timeout.
    pub fn new(config: &OperatorConfig) -> Self {
        Self {
            fetch_timeout: config.client_retry_timeout,
        }
    }

    /// Open a snapshot for `query` and feed every entry to `sink`.
    ///
    /// Rows are visited in key order and each row's columns are drained
    /// before the next row is fetched. The snapshot is released when this
    /// returns, on every path.
    pub async fn run<S, K>(
        &self,
        query: ScanQuery,
        source: &S,
        sink: &mut K,
    ) -> Result<ScanSummary, ScanError>
    where
        S: SnapshotSource,
        K: OutputSink + ?Sized,
    {
        log_debug!(
            component = "scanner",
            event = "scan_started",
            span = ?query.span(),
            columns = query.columns().len(),
        );
        let mut rows = bounded(self.fetch_timeout, source.open(query))
            .await
            .map_err(|err| failed(err, 0))?;

        let mut summary = ScanSummary {
            entries_emitted: 0,
            rows: 0,
            outcome: ScanOutcome::Completed,
        };
        'rows: loop {
            let (row, mut columns) = match bounded(self.fetch_timeout, rows.next_row()).await {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(err) => return Err(failed(err, summary.entries_emitted)),
            };
            summary.rows += 1;

            loop {
                let (column, value) =
                    match bounded(self.fetch_timeout, columns.next_column()).await {
                        Ok(Some(next)) => next,
                        Ok(None) => break,
                        Err(err) => return Err(failed(err, summary.entries_emitted)),
                    };
                if sink.emit(&row, &column, &value).is_err() {
                    summary.outcome = ScanOutcome::SinkClosed;
                    log_info!(
                        component = "scanner",
                        event = "scan_sink_closed",
                        entries = summary.entries_emitted,
                    );
                    break 'rows;
                }
                summary.entries_emitted += 1;
            }
        }

        if summary.rows == 0 && summary.outcome == ScanOutcome::Completed {
            summary.outcome = ScanOutcome::NoData;
            log_info!(component = "scanner", event = "scan_no_data", "no data found");
        } else {
            log_debug!(
                component = "scanner",
                event = "scan_completed",
                rows = summary.rows,
                entries = summary.entries_emitted,
            );
        }
        Ok(summary)
    }
}

fn failed(source: EngineError, entries_emitted: u64) -> ScanError {
    log_error!(
        component = "scanner",
        event = "scan_failed",
        entries = entries_emitted,
        error = %source,
    );
    ScanError::EngineFailure {
        source,
        entries_emitted,
    }
}
