//! Run results and how they are printed.
//!
//! Log lines look like `PASS: tests/a.ino`. When more than one board is
//! configured the board label is appended, `FAIL: tests/a.ino [uno]`, so a
//! line can be traced back to its board. After the run every failure is
//! dumped in attempt order:
//!
//! ```text
//! Compile output for tests/a.ino:
//!
//! <captured output>
//!
//! ```

use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::driver::Outcome;

/// One (sketch, board) compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub sketch: PathBuf,
    #[serde(skip)]
    pub board_index: usize,
    pub board: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Everything a finished run produced, in enumeration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub attempts: Vec<Attempt>,
}

impl RunSummary {
    pub fn new(attempts: Vec<Attempt>) -> Self {
        Self { attempts }
    }

    pub fn passed(&self) -> usize {
        self.attempts.iter().filter(|a| a.outcome.is_pass()).count()
    }

    /// Failure records: (attempt, captured output), in attempt order.
    pub fn failures(&self) -> impl Iterator<Item = (&Attempt, &str)> {
        self.attempts.iter().filter_map(|a| match &a.outcome {
            Outcome::Fail { output, .. } => Some((a, output.as_str())),
            Outcome::Pass => None,
        })
    }

    /// True until any attempt fails; an empty run counts as success.
    pub fn succeeded(&self) -> bool {
        self.attempts.iter().all(|a| a.outcome.is_pass())
    }

    pub fn exit_code(&self) -> i32 {
        if self.succeeded() { 0 } else { 1 }
    }

    /// Write a machine-readable copy of the results.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        #[derive(Serialize)]
        struct JsonReport<'a> {
            exit_code: i32,
            passed: usize,
            failed: usize,
            attempts: &'a [Attempt],
        }

        let report = JsonReport {
            exit_code: self.exit_code(),
            passed: self.passed(),
            failed: self.attempts.len() - self.passed(),
            attempts: &self.attempts,
        };
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }
}

/// Formats attempts and the failure section for a terminal or a CI log.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    color: bool,
    show_board: bool,
}

impl Console {
    pub fn new(color: bool, board_count: usize) -> Self {
        Self {
            color,
            show_board: board_count > 1,
        }
    }

    fn target(&self, attempt: &Attempt) -> String {
        if self.show_board {
            format!("{} [{}]", attempt.sketch.display(), attempt.board)
        } else {
            attempt.sketch.display().to_string()
        }
    }

    pub fn attempt_line(&self, attempt: &Attempt) -> String {
        let label = match (&attempt.outcome, self.color) {
            (Outcome::Pass, true) => "PASS:".green().bold().to_string(),
            (Outcome::Pass, false) => "PASS:".to_string(),
            (Outcome::Fail { .. }, true) => "FAIL:".red().bold().to_string(),
            (Outcome::Fail { .. }, false) => "FAIL:".to_string(),
        };
        format!("{} {}", label, self.target(attempt))
    }

    pub fn write_failures<W: Write>(&self, out: &mut W, summary: &RunSummary) -> io::Result<()> {
        for (attempt, output) in summary.failures() {
            let header = format!("Compile output for {}:", self.target(attempt));
            if self.color {
                writeln!(out, "{}", header.bold())?;
            } else {
                writeln!(out, "{}", header)?;
            }
            writeln!(out)?;
            writeln!(out, "{}", output)?;
            writeln!(out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(sketch: &str, board: &str, outcome: Outcome) -> Attempt {
        Attempt {
            sketch: PathBuf::from(sketch),
            board_index: 0,
            board: board.to_string(),
            outcome,
        }
    }

    fn fail(output: &str) -> Outcome {
        Outcome::Fail {
            code: Some(1),
            output: output.to_string(),
        }
    }

    #[test]
    fn test_empty_run_succeeds() {
        let summary = RunSummary::default();
        assert!(summary.succeeded());
        assert_eq!(summary.exit_code(), 0);

        let mut out = Vec::new();
        Console::new(false, 1)
            .write_failures(&mut out, &summary)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_single_board_lines_have_no_suffix() {
        let console = Console::new(false, 1);
        let line = console.attempt_line(&attempt("a.ino", "lightblue-bean", Outcome::Pass));
        assert_eq!(line, "PASS: a.ino");
    }

    #[test]
    fn test_multi_board_lines_name_the_board() {
        let console = Console::new(false, 2);
        let line = console.attempt_line(&attempt("a.ino", "uno", fail("boom")));
        assert_eq!(line, "FAIL: a.ino [uno]");
    }

    #[test]
    fn test_failure_section_layout() {
        let summary = RunSummary::new(vec![attempt(
            "b.ino",
            "lightblue-bean",
            fail("error: undefined symbol"),
        )]);
        let mut out = Vec::new();
        Console::new(false, 1)
            .write_failures(&mut out, &summary)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Compile output for b.ino:\n\nerror: undefined symbol\n\n"
        );
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_one_failure_fails_the_run_for_good() {
        let summary = RunSummary::new(vec![
            attempt("a.ino", "x", Outcome::Pass),
            attempt("a.ino", "y", fail("nope")),
            attempt("c.ino", "x", Outcome::Pass),
        ]);
        assert!(!summary.succeeded());
        assert_eq!(summary.passed(), 2);
        assert_eq!(summary.failures().count(), 1);
    }

    #[test]
    fn test_failures_keep_attempt_order() {
        let summary = RunSummary::new(vec![
            attempt("z.ino", "x", fail("first")),
            attempt("m.ino", "x", Outcome::Pass),
            attempt("a.ino", "x", fail("second")),
        ]);
        let outputs: Vec<&str> = summary.failures().map(|(_, out)| out).collect();
        assert_eq!(outputs, vec!["first", "second"]);
    }

    #[test]
    fn test_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let summary = RunSummary::new(vec![
            attempt("a.ino", "bean", Outcome::Pass),
            attempt("b.ino", "bean", fail("error: undefined symbol")),
        ]);
        summary.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["exit_code"], 1);
        assert_eq!(value["passed"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["attempts"][0]["status"], "pass");
        assert_eq!(value["attempts"][1]["status"], "fail");
        assert_eq!(value["attempts"][1]["output"], "error: undefined symbol");
        assert_eq!(value["attempts"][1]["sketch"], "b.ino");
    }
}
