//! cp command - copy a file or a directory tree inside the store
//!
//! A directory destination keeps the source name: copying `/b/x` to `/b/d/`
//! writes `/b/d/x`, and copying `/b/src/` into an existing `/b/d/` writes
//! `/b/d/src/`.

use clap::Args;
use serde::Serialize;

use bucketfs_core::{Result, VirtualFs};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, Spinner};

/// Copy a file or directory tree
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source path
    pub source: String,

    /// Destination path
    pub target: String,

    /// Copy directories with their content
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct TransferOutput {
    pub source: String,
    pub target: String,
}

pub async fn execute(fs: &VirtualFs, args: CpArgs, formatter: &Formatter) -> Result<ExitCode> {
    let spinner = Spinner::new(
        formatter.config(),
        format!("Copying {} to {}", args.source, args.target),
    );
    let dest = fs.cp(&args.source, &args.target, args.recursive).await;
    spinner.finish();
    let dest = dest?;

    let output = TransferOutput {
        source: args.source,
        target: dest.to_string(),
    };
    formatter.emit(&output, || format!("'{}' -> '{}'", output.source, output.target));
    Ok(ExitCode::Success)
}
