//! mkdir command - create directories
//!
//! Missing buckets and intermediate directories are created along the way.

use clap::Args;
use serde::Serialize;

use bucketfs_core::{Result, VirtualFs};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Create directories
#[derive(Args, Debug)]
pub struct MkdirArgs {
    /// Directory paths, each ending with '/'
    #[arg(required = true)]
    pub paths: Vec<String>,
}

#[derive(Debug, Serialize)]
struct MkdirOutput {
    created: Vec<String>,
}

pub async fn execute(fs: &VirtualFs, args: MkdirArgs, formatter: &Formatter) -> Result<ExitCode> {
    let mut created = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        fs.mkdirs(path).await?;
        formatter.success(&format!("Created '{path}'"));
        created.push(path.clone());
    }

    if formatter.is_json() {
        formatter.json(&MkdirOutput { created });
    }
    Ok(ExitCode::Success)
}
