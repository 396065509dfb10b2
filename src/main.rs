//! # compile-all CLI Entry Point
//!
//! Runs all combinations of boards and test sketches. With no arguments the
//! built-in board list and sketch patterns are used.
//!
//! Exit codes: 0 every compile passed, 1 at least one failed, 2 the run could
//! not be carried out (bad config, build driver missing).

use clap::Parser;
use colored::*;
use std::path::PathBuf;

use sketch_ci::commands::{self, CompileOptions};

#[derive(Parser)]
#[command(name = "compile-all")]
#[command(about = "Compile every test sketch for every configured board", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct Cli {
    /// Config file [default: compile_all.toml if present, else built-in boards]
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Number of compiles to run at once
    #[arg(long, short, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    jobs: u16,
    /// Show what would be executed without running
    #[arg(long)]
    dry_run: bool,
    /// Fail when no sketch matched or no board is configured
    #[arg(long)]
    require_sketches: bool,
    /// Write a JSON summary of all attempts to this path
    #[arg(long)]
    report: Option<PathBuf>,
    /// Show each build command and a closing summary
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let options = CompileOptions {
        config: cli.config,
        jobs: usize::from(cli.jobs),
        dry_run: cli.dry_run,
        require_sketches: cli.require_sketches,
        report: cli.report,
        verbose: cli.verbose,
    };

    match commands::compile_all(&options) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "x".red(), e);
            std::process::exit(2);
        }
    }
}
