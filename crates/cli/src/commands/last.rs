//! last command - show the most recently modified file of a directory

use clap::Args;

use bucketfs_core::{Result, VirtualFs};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Show the newest file of a directory
#[derive(Args, Debug)]
pub struct LastArgs {
    /// Directory path, ending with '/'
    pub path: String,

    /// Print the file's content instead of its name
    #[arg(long)]
    pub content: bool,
}

pub async fn execute(fs: &VirtualFs, args: LastArgs, formatter: &Formatter) -> Result<ExitCode> {
    let Some(object) = fs.get_last_object(&args.path).await? else {
        formatter.warning(&format!("'{}' has no files", args.path));
        return Ok(ExitCode::NotFound);
    };

    if args.content && !formatter.is_json() {
        let text = String::from_utf8_lossy(object.data().unwrap_or_default());
        formatter.println(&text);
    } else {
        formatter.emit(&object, || object.full_path.clone());
    }
    Ok(ExitCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{memory_fs, quiet};

    #[tokio::test]
    async fn test_last_in_empty_directory() {
        let fs = memory_fs();
        fs.mkdirs("/b/empty/sub/").await.unwrap();

        let args = LastArgs {
            path: "/b/empty/".to_string(),
            content: false,
        };
        assert_eq!(execute(&fs, args, &quiet()).await.unwrap(), ExitCode::NotFound);
    }

    #[tokio::test]
    async fn test_last_picks_newest() {
        let fs = memory_fs();
        fs.put_data("/b/logs/1", b"old".to_vec(), Default::default()).await.unwrap();
        fs.put_data("/b/logs/2", b"new".to_vec(), Default::default()).await.unwrap();

        let last = fs.get_last_object("/b/logs/").await.unwrap().unwrap();
        assert_eq!(last.full_path, "/b/logs/2");

        let args = LastArgs {
            path: "/b/logs/".to_string(),
            content: true,
        };
        assert_eq!(execute(&fs, args, &quiet()).await.unwrap(), ExitCode::Success);
    }

    #[test]
    fn test_json_output_omits_content() {
        let object = bucketfs_core::ObjectData::file(
            "f",
            "/b/f",
            bucketfs_core::ObjectInfo::file("f", 3),
            b"abc".to_vec(),
        );
        let json = serde_json::to_value(&object).unwrap();
        assert_eq!(json["full_path"], "/b/f");
        assert_eq!(json["kind"], "file");
        assert!(json.get("data").is_none());
    }
}
