use super::{display_path, workspace_path};
use anyhow::{bail, Result};
use arbor_common::{FileSystem, RealFileSystem};
use arbor_library::{LibraryStore, LIBRARY_FILE_NAME};
use arbor_linter::{lint_document, Diagnostic, DiagnosticLevel, LintOptions};
use arbor_parser::{format_error, parse, CodecError};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Documents to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Show info level diagnostics
    #[arg(long)]
    pub all: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileReport {
    path: PathBuf,
    error: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    fn failed(&self) -> bool {
        self.error.is_some() || self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

pub async fn check(args: CheckArgs, root: &Path) -> Result<()> {
    let fs = RealFileSystem;
    // Reading only; a missing library is not created here
    let library = LibraryStore::load(&fs, &root.join(LIBRARY_FILE_NAME)).await?;

    let mut reports = Vec::new();
    for file in &args.files {
        let path = workspace_path(root, file);
        reports.push(check_file(&fs, &path, &library, args.json).await?);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(root, report, args.all);
        }
    }

    let failed = reports.iter().filter(|r| r.failed()).count();
    if failed > 0 {
        bail!("{} of {} files failed the check", failed, reports.len());
    }

    if !args.json {
        println!("{} {} files checked", "✓".green(), reports.len());
    }
    Ok(())
}

async fn check_file(fs: &RealFileSystem, path: &Path, library: &LibraryStore, quiet: bool) -> Result<FileReport> {
    let Some(file) = fs.read_file(path).await? else {
        bail!("File not found: {}", path.display());
    };

    let document = match parse(&file.content) {
        Ok(document) => document,
        Err(err) => {
            if !quiet {
                if let CodecError::Parse(parse_error) = &err {
                    eprintln!("{}", format_error(&file.content, &path.display().to_string(), parse_error));
                }
            }
            return Ok(FileReport {
                path: path.to_path_buf(),
                error: Some(err.to_string()),
                diagnostics: Vec::new(),
            });
        }
    };

    let diagnostics = lint_document(
        &document,
        LintOptions {
            registry: None,
            library: Some(library.components()),
        },
    );

    Ok(FileReport {
        path: path.to_path_buf(),
        error: None,
        diagnostics,
    })
}

fn print_report(root: &Path, report: &FileReport, all: bool) {
    let shown: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| all || !matches!(d.level, DiagnosticLevel::Info))
        .collect();

    if report.error.is_none() && shown.is_empty() {
        return;
    }

    println!("{}", display_path(root, &report.path).bright_white());

    if let Some(error) = &report.error {
        println!("  {} {}", "error".red().bold(), error);
    }

    for diagnostic in shown {
        let level = match diagnostic.level {
            DiagnosticLevel::Error => "error".red().bold(),
            DiagnosticLevel::Warning => "warning".yellow().bold(),
            DiagnosticLevel::Info => "info".blue().bold(),
        };
        let location = match &diagnostic.node {
            Some(node) => format!("{}/{}", diagnostic.component, node),
            None => diagnostic.component.clone(),
        };

        println!("  {} [{}] {} {}", level, diagnostic.rule, diagnostic.message, location.dimmed());
        if let Some(suggestion) = &diagnostic.suggestion {
            println!("    {}", suggestion.dimmed());
        }
    }

    println!();
}
