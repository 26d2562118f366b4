use super::{display_path, workspace_path};
use anyhow::{bail, Context, Result};
use arbor_common::{FileSystem, RealFileSystem};
use arbor_model::ComponentId;
use arbor_parser::parse;
use arbor_workspace::{SaveOutcome, Workspace};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct SaveArgs {
    /// Document to save
    pub file: PathBuf,

    /// Components to propagate (defaults to every embedded component)
    #[arg(short, long = "component", value_name = "ID")]
    pub components: Vec<ComponentId>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Treats the document as it is on disk as the edited state: the chosen
/// components are merged into the library and pushed to every other
/// document that uses them.
pub async fn save(args: SaveArgs, root: &Path) -> Result<()> {
    let mut workspace = Workspace::open(RealFileSystem, root).await?;
    let path = workspace_path(root, &args.file);

    let Some(file) = workspace.fs().read_file(&path).await? else {
        bail!("File not found: {}", path.display());
    };
    let mut document = parse(&file.content).with_context(|| format!("Failed to parse {}", path.display()))?;

    let ids: Vec<ComponentId> = if args.components.is_empty() {
        document.embedded_components.keys().cloned().collect()
    } else {
        args.components.clone()
    };
    for id in ids {
        if !document.embedded_components.contains_key(&id) {
            bail!("{} does not embed component '{}'", display_path(root, &path), id);
        }
        document.mark_modified(id);
    }

    let outcome = workspace.save_document(&path, &mut document).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{} {}", "Saved".green().bold(), display_path(root, &path));
        print_outcome(root, &outcome);
    }

    Ok(())
}

pub(crate) fn print_outcome(root: &Path, outcome: &SaveOutcome) {
    for path in &outcome.rewritten {
        println!("  {} {}", "✓".green(), display_path(root, path));
    }
    for failure in &outcome.failures {
        println!(
            "  {} {} ({} failed: {})",
            "✗".red(),
            display_path(root, &failure.path),
            failure.stage,
            failure.message
        );
    }
    println!(
        "  {} rewritten, {} untouched, {} failed",
        outcome.rewritten.len(),
        outcome.untouched.len(),
        outcome.failures.len()
    );
}
