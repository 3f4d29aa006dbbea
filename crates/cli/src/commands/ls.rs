//! ls command - list a directory
//!
//! At `/` the entries are buckets. Entries are ordered newest first and
//! directories keep their trailing slash.

use clap::Args;
use comfy_table::{ContentArrangement, Table, presets::NOTHING};
use serde::Serialize;

use bucketfs_core::{ListFilter, ObjectInfo, PathMatch, Result, VirtualFs};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// List a directory
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Directory path, ending with '/'
    #[arg(default_value = "/")]
    pub path: String,

    /// Only list files
    #[arg(long, conflicts_with = "dirs_only")]
    pub files_only: bool,

    /// Only list directories
    #[arg(long)]
    pub dirs_only: bool,

    /// Show modification time and size
    #[arg(short, long)]
    pub long: bool,
}

impl LsArgs {
    fn filter(&self) -> ListFilter {
        if self.files_only {
            ListFilter::FilesOnly
        } else if self.dirs_only {
            ListFilter::DirsOnly
        } else {
            ListFilter::All
        }
    }
}

/// One row of a long listing
#[derive(Debug, Serialize)]
struct LsEntry {
    name: String,
    #[serde(flatten)]
    info: ObjectInfo,
}

pub async fn execute(fs: &VirtualFs, args: LsArgs, formatter: &Formatter) -> Result<ExitCode> {
    let names = fs.listdir(&args.path, args.filter()).await?;

    if !args.long {
        formatter.emit(&names, || {
            names
                .iter()
                .map(|name| styled(formatter, name))
                .collect::<Vec<_>>()
                .join("\n")
        });
        return Ok(ExitCode::Success);
    }

    let dir = PathMatch::parse(&args.path)?;
    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        let info = fs.info(dir.child(&name)?.path()).await?;
        entries.push(LsEntry { name, info });
    }

    formatter.emit(&entries, || long_table(formatter, &entries).to_string());
    Ok(ExitCode::Success)
}

fn styled(formatter: &Formatter, name: &str) -> String {
    if name.ends_with('/') {
        formatter.dir_name(name)
    } else {
        name.to_string()
    }
}

fn long_table(formatter: &Formatter, entries: &[LsEntry]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled);
    for entry in entries {
        let modified = entry
            .info
            .last_modified
            .map(|ts| ts.strftime("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let size = entry.info.size_human.clone().unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            format!("[{modified}]"),
            size,
            styled(formatter, &entry.name),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{memory_fs, quiet};
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: LsArgs,
    }

    fn parse(argv: &[&str]) -> LsArgs {
        let mut full = vec!["ls"];
        full.extend_from_slice(argv);
        Harness::try_parse_from(full).unwrap().args
    }

    #[test]
    fn test_filter_flags() {
        assert_eq!(parse(&[]).filter(), ListFilter::All);
        assert_eq!(parse(&["--files-only"]).filter(), ListFilter::FilesOnly);
        assert_eq!(parse(&["--dirs-only"]).filter(), ListFilter::DirsOnly);
        assert_eq!(parse(&[]).path, "/");
    }

    #[test]
    fn test_filter_flags_conflict() {
        assert!(Harness::try_parse_from(["ls", "--files-only", "--dirs-only"]).is_err());
    }

    #[tokio::test]
    async fn test_ls_long_reads_entry_info() {
        let fs = memory_fs();
        fs.mkdirs("/bucket/sub/").await.unwrap();
        fs.put_data("/bucket/file", b"abc".to_vec(), Default::default())
            .await
            .unwrap();

        let code = execute(&fs, parse(&["/bucket/", "-l"]), &quiet()).await.unwrap();
        assert_eq!(code, ExitCode::Success);

        let code = execute(&fs, parse(&["-l"]), &quiet()).await.unwrap();
        assert_eq!(code, ExitCode::Success);
    }

    #[tokio::test]
    async fn test_ls_rejects_file_path() {
        let fs = memory_fs();
        let err = execute(&fs, parse(&["/bucket/file"]), &quiet()).await.unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::UsageError);
    }

    #[tokio::test]
    async fn test_ls_missing_directory() {
        let fs = memory_fs();
        fs.mkdirs("/bucket/").await.unwrap();
        let code = execute(&fs, parse(&["/nope/"]), &quiet()).await;
        assert_eq!(ExitCode::from_error(&code.unwrap_err()), ExitCode::NotFound);
    }

    #[test]
    fn test_long_table_marks_directories() {
        let entries = vec![
            LsEntry {
                name: "sub/".to_string(),
                info: ObjectInfo::dir("sub/"),
            },
            LsEntry {
                name: "file".to_string(),
                info: ObjectInfo::file("file", 2048),
            },
        ];
        let rendered = long_table(&Formatter::default(), &entries).to_string();
        assert!(rendered.contains("sub/"));
        assert!(rendered.contains("2 KiB"));
        assert!(rendered.contains(" - "));
    }
}
