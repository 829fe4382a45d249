//! A tool to collect public visibility metrics for a catalog of research repositories.
//!
//! # Overview
//!
//! `catalog-metrics` reads a directory of repository descriptor YAML files and gathers
//! engagement data for each entry from GitHub (via the `gh` CLI) and PyPI, writing the
//! results as JSON documents that a static catalog site consumes at build time.
//!
//! # Commands
//!
//! **Collect GitHub metrics (stars, forks, traffic):**
//! ```bash
//! catalog-metrics github
//! ```
//!
//! **Collect PyPI download metrics:**
//! ```bash
//! catalog-metrics packages
//! ```
//!
//! **Analyze fork activity and geography:**
//! ```bash
//! catalog-metrics forks
//! ```
//!
//! **Sync the repository listing to JSON:**
//! ```bash
//! catalog-metrics sync
//! ```
//!
//! The `github` and `forks` commands require an authenticated `gh` CLI
//! (`gh auth login`). Output locations default to the catalog site's data
//! directories and can be overridden with `--output-dir`.

use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod commands;

use crate::commands::{
    ForksArgs, GithubArgs, PackagesArgs, SyncArgs, analyze_forks, collect_github, collect_packages, sync_repositories,
};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "catalog-metrics", version, about)]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect GitHub engagement metrics for catalog repositories
    Github(GithubArgs),
    /// Collect PyPI download metrics for catalog packages
    Packages(PackagesArgs),
    /// Analyze fork activity and geographic distribution
    Forks(ForksArgs),
    /// Sync repository descriptors into the site's JSON listing
    Sync(SyncArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = tokio::select! {
        result = run(&cli.command) => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\nCollection interrupted by user.");
            return ExitCode::from(130);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("FATAL ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: &Command) -> catalog_metrics::Result<()> {
    match command {
        Command::Github(args) => collect_github(args).await,
        Command::Packages(args) => collect_packages(args).await,
        Command::Forks(args) => analyze_forks(args).await,
        Command::Sync(args) => sync_repositories(args),
    }
}
