mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    check, fmt, init, ls, save, sync, CheckArgs, FmtArgs, InitArgs, LsArgs, SaveArgs, SyncArgs,
};
use std::path::PathBuf;
use tracing::Level;

/// Arbor CLI - behavior tree workspaces with a shared component library
#[derive(Parser, Debug)]
#[command(name = "arbor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log pipeline details
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Workspace directory (defaults to the current directory)
    #[arg(short = 'C', long = "workspace", global = true, value_name = "DIR")]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the workspace config and an empty library
    Init(InitArgs),

    /// List workspace documents and library components
    Ls(LsArgs),

    /// Parse and lint documents
    Check(CheckArgs),

    /// Rewrite documents in canonical form
    Fmt(FmtArgs),

    /// Reconcile a document with the library
    Sync(SyncArgs),

    /// Save a document and propagate its components to the workspace
    Save(SaveArgs),
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let root = match cli.workspace {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Command::Init(args) => init(args, &root).await,
        Command::Ls(args) => ls(args, &root).await,
        Command::Check(args) => check(args, &root).await,
        Command::Fmt(args) => fmt(args, &root).await,
        Command::Sync(args) => sync(args, &root).await,
        Command::Save(args) => save(args, &root).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(err) = run(cli).await {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
