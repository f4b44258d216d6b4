//! Command-line surface of the `flowctl` binary.

use std::{num::NonZeroU64, path::PathBuf, time::Duration};

use bytes::Bytes;
use clap::{Args, Parser, Subcommand};

use crate::{
    backoff::{
        BackoffPolicy, DEFAULT_MAX_SLEEP_SECS, DEFAULT_MIN_SLEEP_SECS, DEFAULT_PER_WORKER_RATE,
    },
    option::OperatorConfig,
    query::{ConfigError, SpanBuilder},
};

/// Operator commands for a transactional dataflow engine.
#[derive(Parser, Debug)]
#[command(name = "flowctl", author, version, about = "flowctl operator CLI")]
pub struct Cli {
    /// Settings shared by every command.
    #[command(flatten)]
    pub global: GlobalArgs,
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Tab-separated `row<TAB>fam:qual<TAB>value` file loaded into the in-memory engine
    #[arg(long, env = "FLOWCTL_DATA", global = true)]
    pub data: Option<PathBuf>,

    /// Application name shown in command output
    #[arg(long = "app", env = "FLOWCTL_APP", default_value = "flow", global = true)]
    pub application: String,

    /// Number of workers processing notifications
    #[arg(long, env = "FLOWCTL_WORKERS", default_value = "1", global = true)]
    pub workers: NonZeroU64,

    /// Upper bound on each engine round-trip, in milliseconds
    #[arg(long, env = "FLOWCTL_RETRY_TIMEOUT_MS", default_value_t = 500, global = true)]
    pub retry_timeout_ms: u64,

    /// Shortest sleep between wait polls, in seconds
    #[arg(long, default_value_t = DEFAULT_MIN_SLEEP_SECS, global = true)]
    pub min_sleep_secs: u64,

    /// Longest sleep between wait polls, in seconds
    #[arg(long, default_value_t = DEFAULT_MAX_SLEEP_SECS, global = true)]
    pub max_sleep_secs: u64,

    /// Clock ticks consumed by one bare clock read
    #[arg(long, default_value_t = 1, global = true)]
    pub clock_read_ticks: u64,
}

impl GlobalArgs {
    /// Validate the flags into an [`OperatorConfig`].
    pub fn config(&self) -> Result<OperatorConfig, ConfigError> {
        let backoff = BackoffPolicy::new(
            self.min_sleep_secs,
            self.max_sleep_secs,
            DEFAULT_PER_WORKER_RATE,
        )?;
        Ok(OperatorConfig::default()
            .application(self.application.clone())
            .worker_instances(self.workers)
            .client_retry_timeout(Duration::from_millis(self.retry_timeout_ms))
            .backoff(backoff)
            .clock_read_ticks(self.clock_read_ticks))
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a snapshot of the data, optionally restricted by row and column.
    Scan(ScanArgs),
    /// Block until all notifications are processed.
    Wait,
}

/// Row and column selection for `scan`.
///
/// Selector conflicts are reported by [`SpanBuilder`], not by the parser, so
/// every combination is rejected the same way.
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Exact row to scan
    #[arg(short = 'r', long)]
    pub exact_row: Option<String>,

    /// Prefix of the rows to scan
    #[arg(short = 'p', long)]
    pub row_prefix: Option<String>,

    /// First row to scan (inclusive)
    #[arg(short = 's', long)]
    pub start_row: Option<String>,

    /// Last row to scan (inclusive)
    #[arg(short = 'e', long)]
    pub end_row: Option<String>,

    /// Columns to scan, comma separated: `fam` or `fam:qual`
    #[arg(short = 'c', long, value_delimiter = ',')]
    pub columns: Vec<String>,
}

impl ScanArgs {
    /// Carry the raw selectors into a [`SpanBuilder`].
    pub fn span_builder(&self) -> SpanBuilder {
        let mut builder = SpanBuilder::new().columns(self.columns.iter().cloned());
        if let Some(row) = &self.exact_row {
            builder = builder.exact_row(Bytes::from(row.clone()));
        }
        if let Some(prefix) = &self.row_prefix {
            builder = builder.row_prefix(Bytes::from(prefix.clone()));
        }
        if let Some(row) = &self.start_row {
            builder = builder.start_row(Bytes::from(row.clone()));
        }
        if let Some(row) = &self.end_row {
            builder = builder.end_row(Bytes::from(row.clone()));
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::{Cli, Command};
    use crate::query::ConfigError;

    #[test]
    fn parse_scan_flags() {
        let cli = Cli::try_parse_from([
            "flowctl", "scan", "-p", "user", "-c", "attr,stat:count", "--app", "pagerank",
        ])
        .unwrap();
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.row_prefix.as_deref(), Some("user"));
        assert_eq!(args.columns, vec!["attr", "stat:count"]);
        assert_eq!(cli.global.application, "pagerank");
        assert_eq!(args.span_builder().build().unwrap().columns().len(), 2);
    }

    #[test]
    fn conflicting_selectors_parse_but_fail_to_build() {
        let cli = Cli::try_parse_from(["flowctl", "scan", "-r", "a", "-s", "b"]).unwrap();
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert!(matches!(
            args.span_builder().build(),
            Err(ConfigError::ConflictingRowSelectors { .. })
        ));
    }

    #[test]
    fn wait_config() {
        let cli = Cli::try_parse_from([
            "flowctl",
            "--workers",
            "4",
            "--retry-timeout-ms",
            "250",
            "wait",
            "--max-sleep-secs",
            "60",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Wait));
        let config = cli.global.config().unwrap();
        assert_eq!(config.workers().get(), 4);
        assert_eq!(config.retry_timeout(), Duration::from_millis(250));
        assert_eq!(config.backoff_policy().max_sleep_secs(), 60);
        assert_eq!(config.backoff_policy().min_sleep_secs(), 10);
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(Cli::try_parse_from(["flowctl", "--workers", "0", "wait"]).is_err());
    }

    #[test]
    fn inverted_sleep_bounds_rejected() {
        let cli = Cli::try_parse_from([
            "flowctl",
            "--min-sleep-secs",
            "100",
            "--max-sleep-secs",
            "5",
            "wait",
        ])
        .unwrap();
        assert_eq!(
            cli.global.config(),
            Err(ConfigError::InvalidBackoff { min: 100, max: 5 })
        );
    }
}
