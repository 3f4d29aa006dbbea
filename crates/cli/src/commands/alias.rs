//! Alias management commands
//!
//! Aliases are named connection profiles: endpoint, credentials and client
//! tuning. They live in the config file and never need a connection.

use clap::Subcommand;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::Formatter;
use bucketfs_core::{Alias, AliasManager, BucketLookup, Result};

/// Alias subcommands for managing storage connections
#[derive(Subcommand, Debug)]
pub enum AliasCommands {
    /// Add or update an alias
    Set(SetArgs),

    /// List all configured aliases
    List(ListArgs),

    /// Remove an alias
    Remove(RemoveArgs),
}

/// Arguments for the `alias set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Alias name (e.g., "local", "minio")
    pub name: String,

    /// Endpoint URL (e.g., "http://localhost:9000")
    #[arg(value_name = "ENDPOINT")]
    pub url: String,

    /// Access key ID
    #[arg(value_name = "ACCESS_KEY")]
    pub access_key_id: String,

    /// Secret access key
    #[arg(value_name = "SECRET_KEY")]
    pub secret_access_key: String,

    /// Bucket lookup style: auto, path, or dns
    #[arg(long, default_value = "auto")]
    pub bucket_lookup: BucketLookup,

    /// Use this alias when none is given
    #[arg(long = "default")]
    pub make_default: bool,
}

/// Arguments for the `alias list` command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show region and bucket lookup as well
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments for the `alias remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the alias to remove
    pub name: String,
}

/// Alias information for JSON output (without credentials)
#[derive(Debug, Serialize)]
struct AliasInfo {
    name: String,
    endpoint: String,
    region: String,
    bucket_lookup: String,
}

impl From<&Alias> for AliasInfo {
    fn from(alias: &Alias) -> Self {
        Self {
            name: alias.name.clone(),
            endpoint: alias.endpoint.clone(),
            region: alias.region.clone(),
            bucket_lookup: alias.bucket_lookup.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AliasOperationOutput {
    alias: String,
    action: &'static str,
}

/// Execute an alias subcommand
///
/// `alias set` takes its region from the global `--region` flag.
pub fn execute(cmd: AliasCommands, region: Option<String>, formatter: &Formatter) -> ExitCode {
    let result = AliasManager::new().and_then(|manager| run(cmd, region, &manager, formatter));
    match result {
        Ok(code) => code,
        Err(e) => super::fail(formatter, &e),
    }
}

fn run(
    cmd: AliasCommands,
    region: Option<String>,
    manager: &AliasManager,
    formatter: &Formatter,
) -> Result<ExitCode> {
    match cmd {
        AliasCommands::Set(args) => execute_set(args, region, manager, formatter),
        AliasCommands::List(args) => execute_list(&args, manager, formatter),
        AliasCommands::Remove(args) => {
            manager.remove(&args.name)?;
            report(formatter, &args.name, "removed");
            Ok(ExitCode::Success)
        }
    }
}

fn execute_set(
    args: SetArgs,
    region: Option<String>,
    manager: &AliasManager,
    formatter: &Formatter,
) -> Result<ExitCode> {
    let mut alias = Alias::new(
        &args.name,
        &args.url,
        &args.access_key_id,
        &args.secret_access_key,
    );
    if let Some(region) = region {
        alias.region = region;
    }
    alias.bucket_lookup = args.bucket_lookup;

    manager.set(alias, args.make_default)?;
    report(formatter, &args.name, "configured");
    Ok(ExitCode::Success)
}

fn execute_list(args: &ListArgs, manager: &AliasManager, formatter: &Formatter) -> Result<ExitCode> {
    let aliases = manager.list()?;
    let infos: Vec<AliasInfo> = aliases.iter().map(AliasInfo::from).collect();

    if formatter.is_json() {
        formatter.json(&infos);
    } else if infos.is_empty() {
        formatter.println("No aliases configured.");
    } else if args.long {
        formatter.println(&alias_table(&infos).to_string());
    } else {
        for info in &infos {
            formatter.println(&format!("{:<12} {}", info.name, info.endpoint));
        }
    }
    Ok(ExitCode::Success)
}

fn alias_table(infos: &[AliasInfo]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Name", "Endpoint", "Region", "Lookup"]);
    for info in infos {
        table.add_row(vec![
            info.name.clone(),
            info.endpoint.clone(),
            info.region.clone(),
            info.bucket_lookup.clone(),
        ]);
    }
    table
}

fn report(formatter: &Formatter, name: &str, action: &'static str) {
    let output = AliasOperationOutput {
        alias: name.to_string(),
        action,
    };
    if formatter.is_json() {
        formatter.json(&output);
    } else {
        formatter.success(&format!("Alias '{name}' {action}."));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::quiet;
    use bucketfs_core::{ConfigManager, Error};
    use tempfile::TempDir;

    fn temp_manager() -> (AliasManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let manager = AliasManager::with_config_manager(ConfigManager::with_path(
            temp_dir.path().join("config.toml"),
        ));
        (manager, temp_dir)
    }

    fn set_args(name: &str) -> SetArgs {
        SetArgs {
            name: name.to_string(),
            url: "http://localhost:9000".to_string(),
            access_key_id: "accesskey".to_string(),
            secret_access_key: "secretkey".to_string(),
            bucket_lookup: BucketLookup::Path,
            make_default: true,
        }
    }

    #[test]
    fn test_set_stores_all_fields() {
        let (manager, _temp_dir) = temp_manager();
        let code = run(
            AliasCommands::Set(set_args("local")),
            Some("eu-central-1".to_string()),
            &manager,
            &quiet(),
        )
        .unwrap();
        assert_eq!(code, ExitCode::Success);

        let alias = manager.resolve(None).unwrap();
        assert_eq!(alias.name, "local");
        assert_eq!(alias.region, "eu-central-1");
        assert_eq!(alias.bucket_lookup, BucketLookup::Path);
    }

    #[test]
    fn test_set_rejects_bad_endpoint() {
        let (manager, _temp_dir) = temp_manager();
        let mut args = set_args("local");
        args.url = "ftp://localhost".to_string();
        let err = run(AliasCommands::Set(args), None, &manager, &quiet()).unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::UsageError);
        assert!(manager.list().unwrap().is_empty());
    }

    #[test]
    fn test_remove_missing_alias_is_not_found() {
        let (manager, _temp_dir) = temp_manager();
        let err = run(
            AliasCommands::Remove(RemoveArgs {
                name: "ghost".to_string(),
            }),
            None,
            &manager,
            &quiet(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::AliasNotFound(_)));
        assert_eq!(ExitCode::from_error(&err), ExitCode::NotFound);
    }

    #[test]
    fn test_list_after_remove() {
        let (manager, _temp_dir) = temp_manager();
        run(AliasCommands::Set(set_args("a")), None, &manager, &quiet()).unwrap();
        run(AliasCommands::Set(set_args("b")), None, &manager, &quiet()).unwrap();
        run(
            AliasCommands::Remove(RemoveArgs {
                name: "a".to_string(),
            }),
            None,
            &manager,
            &quiet(),
        )
        .unwrap();

        let names: Vec<String> = manager.list().unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["b".to_string()]);
        run(AliasCommands::List(ListArgs { long: true }), None, &manager, &quiet()).unwrap();
    }

    #[test]
    fn test_alias_info_hides_credentials() {
        let alias = Alias::new("local", "http://localhost:9000", "ak", "sk");
        let json = serde_json::to_string(&AliasInfo::from(&alias)).unwrap();
        assert!(json.contains("\"bucket_lookup\":\"auto\""));
        assert!(!json.contains("sk"));
    }

    #[test]
    fn test_alias_table_has_row_per_alias() {
        let infos = vec![
            AliasInfo::from(&Alias::new("one", "http://a:9000", "ak", "sk")),
            AliasInfo::from(&Alias::new("two", "http://b:9000", "ak", "sk")),
        ];
        let rendered = alias_table(&infos).to_string();
        assert!(rendered.contains("one"));
        assert!(rendered.contains("http://b:9000"));
    }
}
