//! bfs - filesystem-style paths over S3-compatible object storage
//!
//! Buckets are top-level directories, prefixes ending in '/' are
//! directories and everything else is a file.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use bucketfs_cli::commands::{self, Cli};
use bucketfs_cli::exit_code::ExitCode;

/// Log to stderr; `RUST_LOG` wins over `--debug`
fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let fallback = if debug {
        "bucketfs_core=debug,bucketfs_s3=debug,bucketfs_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(debug))
        .with(filter)
        .try_init()
        .context("failed to initialize logging")
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::debug!(error = %e, "no Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.debug) {
        eprintln!("{e:#}");
        return ExitCode::GeneralError.into();
    }

    commands::until_interrupted(commands::execute(cli), ctrl_c())
        .await
        .into()
}
