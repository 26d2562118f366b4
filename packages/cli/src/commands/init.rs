use anyhow::Result;
use arbor_common::{FileSystem, RealFileSystem};
use arbor_workspace::{Workspace, WorkspaceConfig, CONFIG_FILE_NAME};
use clap::Args;
use colored::Colorize;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Indentation width written into the config
    #[arg(long)]
    pub indent: Option<usize>,

    /// Overwrite an existing config
    #[arg(short, long)]
    pub force: bool,
}

pub async fn init(args: InitArgs, root: &Path) -> Result<()> {
    let fs = RealFileSystem;
    let config_path = root.join(CONFIG_FILE_NAME);

    println!("{}", "Initializing Arbor workspace...".bright_blue().bold());

    if fs.read_file(&config_path).await?.is_some() && !args.force {
        println!("  {} {} already exists", "-".yellow(), CONFIG_FILE_NAME);
    } else {
        let mut config = WorkspaceConfig::default();
        if let Some(indent) = args.indent {
            config.indent = indent;
        }
        fs.write_file(&config_path, &config.to_json()?).await?;
        println!("  {} Created {}", "✓".green(), CONFIG_FILE_NAME);
    }

    let library_existed = fs.read_file(&root.join(arbor_library::LIBRARY_FILE_NAME)).await?.is_some();
    let workspace = Workspace::open(fs, root).await?;
    if !library_existed {
        println!("  {} Created {}", "✓".green(), arbor_library::LIBRARY_FILE_NAME);
    }

    println!();
    println!(
        "{} {} documents, {} library components",
        "Workspace ready:".green().bold(),
        workspace.index().len(),
        workspace.library().len()
    );

    Ok(())
}
