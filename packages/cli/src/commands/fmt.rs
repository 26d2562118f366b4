use super::{display_path, workspace_path};
use anyhow::{bail, Context, Result};
use arbor_common::{FileSystem, RealFileSystem};
use arbor_parser::{parse, Serializer};
use arbor_workspace::WorkspaceConfig;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct FmtArgs {
    /// Documents to format
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Report files that are not formatted instead of rewriting them
    #[arg(long)]
    pub check: bool,
}

pub async fn fmt(args: FmtArgs, root: &Path) -> Result<()> {
    let fs = RealFileSystem;
    let config = WorkspaceConfig::load(&fs, root).await?;
    let mut unformatted = Vec::new();

    for file in &args.files {
        let path = workspace_path(root, file);
        let Some(source) = fs.read_file(&path).await? else {
            bail!("File not found: {}", path.display());
        };

        let document = parse(&source.content).with_context(|| format!("Failed to parse {}", path.display()))?;
        let formatted = Serializer::with_indent(config.indent).serialize(&document);

        if formatted == source.content {
            continue;
        }

        if args.check {
            println!("  {} {}", "✗".red(), display_path(root, &path));
        } else {
            fs.write_file(&path, &formatted).await?;
            println!("  {} {}", "✓".green(), display_path(root, &path));
        }
        unformatted.push(path);
    }

    if args.check && !unformatted.is_empty() {
        bail!("{} files are not formatted", unformatted.len());
    }
    if unformatted.is_empty() {
        println!("{} All files formatted", "✓".green());
    }

    Ok(())
}
