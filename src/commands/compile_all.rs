//! `compile-all` command handler.
//!
//! Wires config, discovery, the runner and the console report together and
//! turns the result into a process exit code.

use anyhow::Result;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Instant;

use crate::config::{self, RunnerConfig};
use crate::discovery;
use crate::driver::ProcessDriver;
use crate::error::RunError;
use crate::report::Console;
use crate::runner::Runner;

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub config: Option<PathBuf>,
    pub jobs: usize,
    pub dry_run: bool,
    pub require_sketches: bool,
    pub report: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            config: None,
            jobs: 1,
            dry_run: false,
            require_sketches: false,
            report: None,
            verbose: false,
        }
    }
}

/// Run every sketch against every board. Returns the exit code: 0 when all
/// compiles passed (or there was nothing to compile), 1 otherwise.
pub fn compile_all(opts: &CompileOptions) -> Result<i32> {
    let config = config::load_config(opts.config.as_deref())?;
    let sketches = discovery::resolve_sketches(&config.sketches)?;

    check_workload(&config, &sketches, opts.require_sketches)?;

    if opts.dry_run {
        print_plan(&config, &sketches);
        return Ok(0);
    }

    let start_time = Instant::now();
    let driver = ProcessDriver::new(config.env_var.clone());
    let runner = Runner::new(&driver, &config.boards).jobs(opts.jobs);
    let color = io::stdout().is_terminal() && colored::control::SHOULD_COLORIZE.should_colorize();
    let console = Console::new(color, config.boards.len());

    let pb = if opts.jobs > 1 {
        let pb = ProgressBar::new(runner.planned(&sketches) as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    // Echo before the compile so a hung driver still shows what it was running.
    let summary = runner.run_observed(
        &sketches,
        |sketch, board| {
            if opts.verbose {
                pb.suspend(|| {
                    eprintln!("   {} {}", "→".dimmed(), driver.describe(board, sketch));
                });
            }
        },
        |attempt| {
            pb.suspend(|| println!("{}", console.attempt_line(attempt)));
            pb.inc(1);
        },
    )?;
    pb.finish_and_clear();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    console.write_failures(&mut out, &summary)?;
    out.flush()?;

    if let Some(path) = &opts.report {
        summary.write_json(path)?;
        if opts.verbose {
            eprintln!("   {} Wrote report to {}", "✓".green(), path.display());
        }
    }

    if opts.verbose {
        let failed = summary.attempts.len() - summary.passed();
        let glyph = if failed == 0 { "✓".green() } else { "x".red() };
        eprintln!(
            "{} {} passed, {} failed in {:.2?}",
            glyph,
            summary.passed(),
            failed,
            start_time.elapsed()
        );
    }

    Ok(summary.exit_code())
}

/// An empty sketch set or board list compiles nothing and would report
/// success. Warn about it, or fail when the caller asked for that.
fn check_workload(
    config: &RunnerConfig,
    sketches: &[PathBuf],
    require_sketches: bool,
) -> Result<(), RunError> {
    let problem = if sketches.is_empty() {
        Some(format!(
            "no sketches matched {}",
            config.sketches.join(", ")
        ))
    } else if config.boards.is_empty() {
        Some("no boards are configured".to_string())
    } else {
        None
    };

    match problem {
        Some(msg) if require_sketches => Err(RunError::NothingToDo(msg)),
        Some(msg) => {
            eprintln!("   {} {}", "⚠".yellow(), msg);
            Ok(())
        }
        None => Ok(()),
    }
}

fn print_plan(config: &RunnerConfig, sketches: &[PathBuf]) {
    let driver = ProcessDriver::new(config.env_var.clone());

    println!("{} Sketches ({}):", "→".dimmed(), sketches.len());
    for sketch in sketches {
        println!("   {}", sketch.display());
    }
    println!("{} Boards ({}):", "→".dimmed(), config.boards.len());
    for board in &config.boards {
        println!("   {}", board.label().cyan());
    }
    println!();
    for sketch in sketches {
        for board in &config.boards {
            println!("   {}", driver.describe(board, sketch));
        }
    }
}
