//! rm command - remove files or directories
//!
//! A directory path is removed like `rmdir`, so `-r` is needed when it has
//! content. Every path is attempted; the first failure decides the exit code.

use clap::Args;
use serde::Serialize;

use bucketfs_core::{Result, VirtualFs};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, Spinner};

/// Remove files or directories
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Paths to remove
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Remove directories and their content
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug, Default, Serialize)]
pub(super) struct RemovalOutput {
    pub removed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<String>,
}

impl RemovalOutput {
    /// Print the summary and pick the exit code
    pub fn finish(self, formatter: &Formatter, first_error: Option<ExitCode>) -> ExitCode {
        if formatter.is_json() {
            formatter.json(&self);
        }
        first_error.unwrap_or(ExitCode::Success)
    }
}

pub async fn execute(fs: &VirtualFs, args: RmArgs, formatter: &Formatter) -> Result<ExitCode> {
    let mut output = RemovalOutput::default();
    let mut first_error = None;

    for path in &args.paths {
        let spinner = Spinner::new(formatter.config(), format!("Removing {path}"));
        let result = fs.rm(path, args.recursive).await;
        spinner.finish();

        match result {
            Ok(()) => {
                formatter.success(&format!("Removed '{path}'"));
                output.removed.push(path.clone());
            }
            Err(e) => {
                formatter.error(&e.to_string());
                first_error.get_or_insert(ExitCode::from_error(&e));
                output.failed.push(path.clone());
            }
        }
    }

    Ok(output.finish(formatter, first_error))
}
