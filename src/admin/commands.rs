use std::{
    io::{BufRead, Write},
    process::ExitCode,
};

use anyhow::{bail, Context};
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use super::cli::ScanArgs;
use crate::{
    engine::{LogicalClock, NotificationSource, SnapshotSource},
    inmem::{MemoryEngine, WriteBatch},
    observability::log_info,
    option::OperatorConfig,
    query::{Column, ColumnFilter},
    quiescence::{QuiescenceDetector, WaitOutcome},
    scanner::{ScanExecutor, ScanOutcome, WriteSink},
};

/// How a command ended, mapped onto a process exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
    /// The command did what was asked.
    Success,
    /// The engine failed or could not be reached.
    EngineFailure,
    /// The operator supplied conflicting or malformed options.
    InvalidConfig,
    /// The operator aborted the command.
    Cancelled,
}

impl Exit {
    /// Process exit code for this outcome.
    pub fn code(self) -> u8 {
        match self {
            Exit::Success => 0,
            Exit::EngineFailure => 1,
            Exit::InvalidConfig => 2,
            Exit::Cancelled => 130,
        }
    }
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Print a snapshot of the data selected by `args`.
///
/// Entries go to `out` as `row fam:qual<TAB>value`; option errors go to `err`.
/// A closed `out` stops the scan like any other backpressure and is not a
/// failure of the command.
pub async fn run_scan<S, W, E>(
    config: &OperatorConfig,
    args: &ScanArgs,
    source: &S,
    out: &mut W,
    err: &mut E,
) -> anyhow::Result<Exit>
where
    S: SnapshotSource,
    W: Write,
    E: Write,
{
    let query = match args.span_builder().build() {
        Ok(query) => query,
        Err(config_err) => {
            writeln!(err, "{config_err}")?;
            return Ok(Exit::InvalidConfig);
        }
    };

    let mut sink = WriteSink::new(out);
    let banner = format!(
        "Scanning snapshot of data in '{}' application.",
        config.application_name()
    );
    if sink.write_line(banner).is_err() {
        output_closed();
        return Ok(Exit::Success);
    }

    let (exit, trailer) = match ScanExecutor::new(config).run(query, source, &mut sink).await {
        Ok(summary) if summary.outcome == ScanOutcome::NoData => {
            (Exit::Success, Some("\nNo data found\n".to_string()))
        }
        Ok(_) => (Exit::Success, None),
        Err(scan_err) => (
            Exit::EngineFailure,
            Some(format!("Scan failed - {}", scan_err.engine_error())),
        ),
    };
    let written = match trailer {
        Some(trailer) => sink.write_line(trailer),
        None => Ok(()),
    };
    if written.and_then(|()| sink.flush()).is_err() {
        output_closed();
    }
    Ok(exit)
}

fn output_closed() {
    log_info!(
        component = "admin",
        event = "scan_output_closed",
        "output closed, nothing more will be printed"
    );
}

/// Block until the engine has no outstanding notifications, or `cancel` fires.
///
/// When the wait fails, the cause is written to `err`.
pub async fn run_wait<S, E>(
    config: &OperatorConfig,
    source: S,
    cancel: &CancellationToken,
    err: &mut E,
) -> anyhow::Result<Exit>
where
    S: NotificationSource + LogicalClock,
    E: Write,
{
    let detector = QuiescenceDetector::new(source, config.clone());
    match detector.run(cancel).await {
        Ok(WaitOutcome::Finished { .. }) => Ok(Exit::Success),
        Ok(WaitOutcome::Cancelled { .. }) => Ok(Exit::Cancelled),
        Err(wait_err) => {
            writeln!(err, "Wait failed - {wait_err}")?;
            Ok(Exit::EngineFailure)
        }
    }
}

/// Load `row<TAB>fam[:qual]<TAB>value` lines into `engine` as one commit.
///
/// Blank lines and lines starting with `#` are skipped. Returns the number of
/// cells written.
pub fn load_tsv<R: BufRead>(engine: &MemoryEngine, reader: R) -> anyhow::Result<usize> {
    let mut batch = WriteBatch::new();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.splitn(3, '\t');
        let (Some(row), Some(raw_column), Some(value)) =
            (fields.next(), fields.next(), fields.next())
        else {
            bail!("line {line_no}: expected row<TAB>column<TAB>value");
        };
        let column = match ColumnFilter::parse(raw_column)
            .with_context(|| format!("line {line_no}: invalid column"))?
        {
            ColumnFilter::Family(family) => Column::new(family, Bytes::new()),
            ColumnFilter::FamilyQualifier(family, qualifier) => Column::new(family, qualifier),
        };
        batch = batch.set(row.to_string(), column, value.to_string());
    }
    let cells = batch.len();
    if cells > 0 {
        engine.commit(batch).context("failed to load data")?;
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::{load_tsv, Exit};
    use crate::inmem::MemoryEngine;

    #[test]
    fn exit_codes() {
        assert_eq!(Exit::Success.code(), 0);
        assert_eq!(Exit::EngineFailure.code(), 1);
        assert_eq!(Exit::InvalidConfig.code(), 2);
        assert_eq!(Exit::Cancelled.code(), 130);
    }

    #[test]
    fn load_skips_comments_and_blank_lines() {
        let engine = MemoryEngine::new();
        let data = "# header\nr1\tattr:x\tv1\n\nr2\tattr\tv2 with\ttab\n";
        assert_eq!(load_tsv(&engine, data.as_bytes()).unwrap(), 2);
    }

    #[test]
    fn load_rejects_short_lines() {
        let engine = MemoryEngine::new();
        let err = load_tsv(&engine, "r1\tattr:x\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn load_rejects_malformed_columns() {
        let engine = MemoryEngine::new();
        let err = load_tsv(&engine, "r1\ta:b:c\tv\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("a:b:c"));
    }
}
