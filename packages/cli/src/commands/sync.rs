use super::save::print_outcome;
use super::{display_path, workspace_path};
use anyhow::{bail, Result};
use arbor_common::RealFileSystem;
use arbor_workspace::{DiscrepancyReport, ReconcilePolicy, Workspace, WorkspaceError};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Document to reconcile with the library
    pub file: PathBuf,

    /// What to do when components differ from the library
    #[arg(long, value_name = "overwrite|abort")]
    pub policy: Option<ReconcilePolicy>,
}

pub async fn sync(args: SyncArgs, root: &Path) -> Result<()> {
    let mut workspace = Workspace::open(RealFileSystem, root).await?;
    let path = workspace_path(root, &args.file);
    let mut seen: Option<DiscrepancyReport> = None;

    let opened = workspace
        .open_document(&path, |report| {
            seen = Some(report.clone());
            args.policy.unwrap_or(ReconcilePolicy::Abort)
        })
        .await;

    let mut document = match opened {
        Ok(document) => document,
        Err(WorkspaceError::OpenAborted { ids, .. }) => {
            if let Some(report) = &seen {
                print_report(report);
            }
            if args.policy.is_none() {
                bail!(
                    "{} components differ from the library; rerun with --policy overwrite or --policy abort",
                    ids.len()
                );
            }
            println!("{} {} left as is", "Aborted:".yellow().bold(), display_path(root, &path));
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let Some(report) = seen else {
        println!("{} {} matches the library", "✓".green(), display_path(root, &path));
        return Ok(());
    };

    print_report(&report);
    let outcome = workspace.save_document(&path, &mut document).await?;
    println!(
        "{} {} from the library",
        "Updated".green().bold(),
        display_path(root, &path)
    );
    print_outcome(root, &outcome);

    Ok(())
}

fn print_report(report: &DiscrepancyReport) {
    println!("{}", "Components differing from the library:".bright_white().bold());
    for discrepancy in &report.discrepancies {
        println!(
            "  {}  document: {}  library: {}",
            discrepancy.id.bright_cyan(),
            discrepancy.document,
            discrepancy.library
        );
    }
}
