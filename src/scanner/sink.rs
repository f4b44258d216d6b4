use std::{fmt::Display, io::Write};

use bytes::Bytes;
use thiserror::Error;

use crate::{observability::log_debug, query::Column};

/// Signal from an [`OutputSink`] that it no longer accepts data.
///
/// Not a scan failure: the scan stops early and reports what it emitted.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Default)]
#[error("output sink is no longer accepting data")]
pub struct Backpressure;

/// Destination for scanned entries.
pub trait OutputSink {
    /// Accept one `(row, column, value)` entry.
    fn emit(&mut self, row: &[u8], column: &Column, value: &[u8]) -> Result<(), Backpressure>;
}

impl<F> OutputSink for F
where
    F: FnMut(&[u8], &Column, &[u8]) -> Result<(), Backpressure>,
{
    fn emit(&mut self, row: &[u8], column: &Column, value: &[u8]) -> Result<(), Backpressure> {
        self(row, column, value)
    }
}

/// Writes one `row fam:qual<TAB>value` line per entry.
///
/// Any write error (a closed pipe, a full disk) is reported as backpressure.
#[derive(Debug)]
pub struct WriteSink<W> {
    writer: W,
}

impl<W: Write> WriteSink<W> {
    /// Sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write one free-form line, such as a banner or a trailer.
    pub fn write_line(&mut self, line: impl Display) -> Result<(), Backpressure> {
        writeln!(self.writer, "{line}").map_err(closed)
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> Result<(), Backpressure> {
        self.writer.flush().map_err(closed)
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for WriteSink<W> {
    fn emit(&mut self, row: &[u8], column: &Column, value: &[u8]) -> Result<(), Backpressure> {
        writeln!(
            self.writer,
            "{} {}\t{}",
            String::from_utf8_lossy(row),
            column,
            String::from_utf8_lossy(value)
        )
        .map_err(closed)
    }
}

fn closed(err: std::io::Error) -> Backpressure {
    log_debug!(
        component = "scanner",
        event = "sink_write_failed",
        error = %err,
    );
    Backpressure
}

/// One scanned entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanEntry {
    /// Row key.
    pub row: Bytes,
    /// Column.
    pub column: Column,
    /// Cell value.
    pub value: Bytes,
}

/// Keeps every entry in memory, optionally refusing entries past a limit.
#[derive(Clone, Debug, Default)]
pub struct CollectSink {
    entries: Vec<ScanEntry>,
    limit: Option<usize>,
}

impl CollectSink {
    /// Unbounded collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector that signals backpressure once `limit` entries are held.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: Some(limit),
        }
    }

    /// Entries collected so far.
    pub fn entries(&self) -> &[ScanEntry] {
        &self.entries
    }

    /// Take ownership of the collected entries.
    pub fn into_entries(self) -> Vec<ScanEntry> {
        self.entries
    }
}

impl OutputSink for CollectSink {
    fn emit(&mut self, row: &[u8], column: &Column, value: &[u8]) -> Result<(), Backpressure> {
        if self.limit.is_some_and(|limit| self.entries.len() >= limit) {
            return Err(Backpressure);
        }
        self.entries.push(ScanEntry {
            row: Bytes::copy_from_slice(row),
            column: column.clone(),
            value: Bytes::copy_from_slice(value),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use super::{Backpressure, CollectSink, OutputSink, WriteSink};
    use crate::query::Column;

    #[test]
    fn write_sink_formats_lines() {
        let mut sink = WriteSink::new(Vec::new());
        sink.emit(b"r1", &Column::new("attr", "x"), b"v1").unwrap();
        sink.emit(b"r2", &Column::new("stat", ""), b"").unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "r1 attr:x\tv1\nr2 stat:\t\n");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_become_backpressure() {
        let mut sink = WriteSink::new(BrokenPipe);
        assert_eq!(
            sink.emit(b"r", &Column::new("f", "q"), b"v"),
            Err(Backpressure)
        );
    }

    #[test]
    fn free_form_lines_share_the_backpressure_path() {
        let mut sink = WriteSink::new(Vec::new());
        sink.write_line("banner").unwrap();
        sink.emit(b"r", &Column::new("f", "q"), b"v").unwrap();
        assert_eq!(
            String::from_utf8(sink.into_inner()).unwrap(),
            "banner\nr f:q\tv\n"
        );

        let mut closed = WriteSink::new(BrokenPipe);
        assert_eq!(closed.write_line("banner"), Err(Backpressure));
    }

    #[test]
    fn collect_sink_limit() {
        let mut sink = CollectSink::with_limit(1);
        let column = Column::new("f", "q");
        assert!(sink.emit(b"a", &column, b"1").is_ok());
        assert_eq!(sink.emit(b"b", &column, b"2"), Err(Backpressure));
        assert_eq!(sink.entries().len(), 1);
    }
}
