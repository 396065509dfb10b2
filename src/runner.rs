//! The sketch × board loop.
//!
//! Sketches are the outer loop and boards the inner one. With `jobs == 1`
//! pairs run one after another; otherwise they go through a bounded rayon
//! pool and the results are put back in enumeration order before they are
//! returned.

use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::config::BoardConfig;
use crate::driver::BuildDriver;
use crate::error::RunError;
use crate::report::{Attempt, RunSummary};

pub struct Runner<'a, D: BuildDriver> {
    driver: &'a D,
    boards: &'a [BoardConfig],
    jobs: usize,
}

impl<'a, D: BuildDriver> Runner<'a, D> {
    pub fn new(driver: &'a D, boards: &'a [BoardConfig]) -> Self {
        Self {
            driver,
            boards,
            jobs: 1,
        }
    }

    /// Worker count; 0 is treated as 1.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Number of compiles a run over `sketches` will perform.
    pub fn planned(&self, sketches: &[PathBuf]) -> usize {
        sketches.len() * self.boards.len()
    }

    /// Compile every sketch for every board.
    ///
    /// `on_attempt` sees each attempt as soon as it finishes, from whichever
    /// worker ran it. Build failures never stop the run; only a driver that
    /// cannot be started does.
    pub fn run<F>(&self, sketches: &[PathBuf], on_attempt: F) -> Result<RunSummary, RunError>
    where
        F: Fn(&Attempt) + Sync,
    {
        self.run_observed(sketches, |_, _| {}, on_attempt)
    }

    /// Like [`Runner::run`], with `on_start` called right before each
    /// compile is handed to the driver.
    pub fn run_observed<S, F>(
        &self,
        sketches: &[PathBuf],
        on_start: S,
        on_attempt: F,
    ) -> Result<RunSummary, RunError>
    where
        S: Fn(&Path, &BoardConfig) + Sync,
        F: Fn(&Attempt) + Sync,
    {
        let attempts = if self.jobs == 1 {
            let mut attempts = Vec::with_capacity(self.planned(sketches));
            for sketch in sketches {
                for board_index in 0..self.boards.len() {
                    on_start(sketch, &self.boards[board_index]);
                    let attempt = self.attempt(sketch, board_index)?;
                    on_attempt(&attempt);
                    attempts.push(attempt);
                }
            }
            attempts
        } else {
            let pairs: Vec<(&PathBuf, usize)> = sketches
                .iter()
                .flat_map(|sketch| (0..self.boards.len()).map(move |b| (sketch, b)))
                .collect();

            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()
                .map_err(|e| RunError::IoError(std::io::Error::other(e)))?;

            // Indexed collect keeps enumeration order whatever order the
            // workers finish in.
            pool.install(|| {
                pairs
                    .par_iter()
                    .map(|(sketch, board_index)| {
                        on_start(sketch, &self.boards[*board_index]);
                        let attempt = self.attempt(sketch, *board_index)?;
                        on_attempt(&attempt);
                        Ok(attempt)
                    })
                    .collect::<Result<Vec<_>, RunError>>()
            })?
        };

        Ok(RunSummary::new(attempts))
    }

    fn attempt(&self, sketch: &Path, board_index: usize) -> Result<Attempt, RunError> {
        let board = &self.boards[board_index];
        let outcome = self.driver.compile(board, sketch)?;
        Ok(Attempt {
            sketch: sketch.to_path_buf(),
            board_index,
            board: board.label(),
            outcome,
        })
    }
}
