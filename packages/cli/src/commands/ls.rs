use super::display_path;
use anyhow::Result;
use arbor_common::RealFileSystem;
use arbor_workspace::{IndexedFile, Shape, Workspace};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Args)]
pub struct LsArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ComponentSummary<'a> {
    id: &'a str,
    #[serde(flatten)]
    shape: Shape,
    ports: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Listing<'a> {
    root: &'a Path,
    documents: &'a [IndexedFile],
    components: Vec<ComponentSummary<'a>>,
}

pub async fn ls(args: LsArgs, root: &Path) -> Result<()> {
    let workspace = Workspace::open(RealFileSystem, root).await?;

    let components: Vec<_> = workspace
        .library()
        .components()
        .values()
        .map(|c| ComponentSummary {
            id: &c.id,
            shape: Shape::of(c),
            ports: c.ports.len(),
        })
        .collect();

    if args.json {
        let listing = Listing {
            root: workspace.root(),
            documents: workspace.index().files(),
            components,
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("{}", "Documents".bright_white().bold());
    if workspace.index().is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for file in workspace.index().files() {
        println!(
            "  {}  {}",
            display_path(root, &file.path),
            file.last_known_modified_time.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }

    println!();
    println!("{}", "Library".bright_white().bold());
    if components.is_empty() {
        println!("  {}", "(empty)".dimmed());
    }
    for component in &components {
        println!(
            "  {}  {}",
            component.id.bright_cyan(),
            format!("{}, {} ports", component.shape, component.ports).dimmed()
        );
    }

    Ok(())
}
