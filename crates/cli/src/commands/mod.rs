//! CLI command definitions and execution
//!
//! Every remote command is a thin wrapper over one engine operation. Commands
//! receive a connected [`VirtualFs`] and return the exit code to use on
//! success; errors are printed and mapped here.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use bucketfs_core::{Alias, AliasManager, Error, Result, VirtualFs};
use bucketfs_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod alias;
mod cat;
mod completions;
mod cp;
mod exists;
mod last;
mod ls;
mod mkdir;
mod mv;
mod put;
mod rm;
mod rmdir;
mod share;
mod stat;

/// bfs - filesystem-style paths over S3-compatible object storage
///
/// Paths are absolute: `/` holds buckets, `/bucket/dir/` is a directory
/// (note the trailing slash), `/bucket/dir/name` is a file.
#[derive(Parser, Debug)]
#[command(name = "bfs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable spinners
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to connect
///
/// An explicit endpoint wins over aliases; otherwise the named alias, or the
/// default one from the config file, is used.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Alias to connect through
    #[arg(long = "alias", global = true, env = "BUCKETFS_ALIAS")]
    pub alias_name: Option<String>,

    /// Endpoint URL, bypassing aliases
    #[arg(long, global = true, env = "BUCKETFS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Access key for --endpoint
    #[arg(long, global = true, env = "BUCKETFS_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Secret key for --endpoint
    #[arg(long, global = true, env = "BUCKETFS_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Region override, also used by `alias set`
    #[arg(long, global = true, env = "BUCKETFS_REGION")]
    pub region: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage connection aliases
    #[command(subcommand)]
    Alias(alias::AliasCommands),

    /// List a directory, or the buckets at /
    Ls(ls::LsArgs),

    /// Create directories (and their buckets)
    Mkdir(mkdir::MkdirArgs),

    /// Remove files or directories
    Rm(rm::RmArgs),

    /// Remove directories
    Rmdir(rmdir::RmdirArgs),

    /// Copy a file or directory tree
    Cp(cp::CpArgs),

    /// Move a file or directory tree
    Mv(mv::MvArgs),

    /// Print a file's content
    Cat(cat::CatArgs),

    /// Show metadata of a bucket, directory or file
    Stat(stat::StatArgs),

    /// Upload a local file or stdin
    Put(put::PutArgs),

    /// Check whether a path exists
    Exists(exists::ExistsArgs),

    /// Show the most recently modified file of a directory
    Last(last::LastArgs),

    /// Generate a presigned URL
    Share(share::ShareArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };
    let formatter = Formatter::new(output_config);

    let command = match cli.command {
        Commands::Alias(cmd) => {
            return alias::execute(cmd, cli.connection.region.clone(), &formatter);
        }
        Commands::Completions(args) => return completions::execute(args),
        other => other,
    };

    let fs = match connect(&cli.connection).await {
        Ok(fs) => fs,
        Err(e) => return fail(&formatter, &e),
    };

    let result = match command {
        Commands::Ls(args) => ls::execute(&fs, args, &formatter).await,
        Commands::Mkdir(args) => mkdir::execute(&fs, args, &formatter).await,
        Commands::Rm(args) => rm::execute(&fs, args, &formatter).await,
        Commands::Rmdir(args) => rmdir::execute(&fs, args, &formatter).await,
        Commands::Cp(args) => cp::execute(&fs, args, &formatter).await,
        Commands::Mv(args) => mv::execute(&fs, args, &formatter).await,
        Commands::Cat(args) => cat::execute(&fs, args, &formatter).await,
        Commands::Stat(args) => stat::execute(&fs, args, &formatter).await,
        Commands::Put(args) => put::execute(&fs, args, &formatter).await,
        Commands::Exists(args) => exists::execute(&fs, args, &formatter).await,
        Commands::Last(args) => last::execute(&fs, args, &formatter).await,
        Commands::Share(args) => share::execute(&fs, args, &formatter).await,
        Commands::Alias(_) | Commands::Completions(_) => Ok(ExitCode::Success),
    };

    result.unwrap_or_else(|e| fail(&formatter, &e))
}

/// Run `work` unless `signal` fires first
///
/// Store calls already sent are not rolled back; a half-finished `rmdir -r`
/// or `cp -r` leaves whatever it reached.
pub async fn until_interrupted(
    work: impl Future<Output = ExitCode>,
    signal: impl Future<Output = ()>,
) -> ExitCode {
    tokio::select! {
        biased;
        code = work => code,
        () = signal => {
            tracing::warn!("interrupted");
            ExitCode::Interrupted
        }
    }
}

/// Build an engine over the store selected by `conn`
async fn connect(conn: &ConnectionArgs) -> Result<VirtualFs> {
    let alias = if conn.endpoint.is_some() {
        resolve_alias(conn, None)?
    } else {
        resolve_alias(conn, Some(&AliasManager::new()?))?
    };
    tracing::debug!(
        alias = %alias.name,
        endpoint = %alias.endpoint,
        region = %alias.region,
        "connecting"
    );
    let client = S3Client::new(alias).await?;
    Ok(VirtualFs::new(Arc::new(client)))
}

/// Pick the alias described by the connection flags
fn resolve_alias(conn: &ConnectionArgs, manager: Option<&AliasManager>) -> Result<Alias> {
    let mut alias = match (&conn.endpoint, manager) {
        (Some(endpoint), _) => {
            let (Some(access_key), Some(secret_key)) = (&conn.access_key, &conn.secret_key)
            else {
                return Err(Error::Config(
                    "--endpoint needs --access-key and --secret-key".into(),
                ));
            };
            Alias::new("command-line", endpoint, access_key, secret_key)
        }
        (None, Some(manager)) => manager.resolve(conn.alias_name.as_deref())?,
        (None, None) => {
            return Err(Error::Config("no endpoint or alias configured".into()));
        }
    };

    if let Some(region) = &conn.region {
        alias.region = region.clone();
    }
    Ok(alias)
}

/// Print `err` and map it to its exit code
fn fail(formatter: &Formatter, err: &Error) -> ExitCode {
    formatter.error(&err.to_string());
    ExitCode::from_error(err)
}

/// Parse repeated `KEY=VALUE` arguments into user metadata
fn parse_metadata(pairs: &[String]) -> Result<HashMap<String, String>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(Error::InvalidOperation(format!(
                "metadata must be KEY=VALUE, got '{pair}'"
            ))),
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use bucketfs_core::{MemoryStore, VirtualFs};

    use crate::output::{Formatter, OutputConfig};

    pub fn memory_fs() -> VirtualFs {
        VirtualFs::new(Arc::new(MemoryStore::new()))
    }

    pub fn quiet() -> Formatter {
        Formatter::new(OutputConfig {
            quiet: true,
            ..Default::default()
        })
    }
}
