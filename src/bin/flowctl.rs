//! `flowctl`: scan a snapshot of an application's data, or wait until every
//! notification has been processed.

use std::{
    fs::File,
    io::{self, BufReader, IsTerminal},
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;
use flowctl::{
    admin::{
        cli::{Cli, Command},
        load_tsv, run_scan, run_wait, Exit,
    },
    inmem::MemoryEngine,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    let config = match cli.global.config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return Ok(Exit::InvalidConfig.into());
        }
    };

    let engine = MemoryEngine::new();
    if let Some(path) = &cli.global.data {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let cells = load_tsv(&engine, BufReader::new(file))?;
        tracing::debug!(target: "flowctl", event = "data_loaded", cells, path = %path.display());
    }

    let exit = match cli.command {
        Command::Scan(args) => {
            let stdout = io::stdout();
            let stderr = io::stderr();
            run_scan(
                &config,
                &args,
                &engine,
                &mut stdout.lock(),
                &mut stderr.lock(),
            )
            .await?
        }
        Command::Wait => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });
            run_wait(&config, engine, &cancel, &mut io::stderr().lock()).await?
        }
    };
    Ok(exit.into())
}
