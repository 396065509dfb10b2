//! Build driver invocation.
//!
//! The driver (PlatformIO by default) is a black box: it gets the sketch path
//! through one environment variable, its stdout and stderr are captured as a
//! single blob, and only the exit status is interpreted.

use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::config::BoardConfig;
use crate::error::RunError;

/// Result of compiling one sketch for one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail {
        /// Exit code, `None` when the driver was killed by a signal
        code: Option<i32>,
        /// Combined stdout/stderr, verbatim
        output: String,
    },
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }
}

/// Something that can compile a sketch for a board.
///
/// `Err` is reserved for failures to run the driver at all; a driver that ran
/// and reported errors is an `Ok(Outcome::Fail { .. })`.
pub trait BuildDriver: Sync {
    fn compile(&self, board: &BoardConfig, sketch: &Path) -> Result<Outcome, RunError>;
}

/// Runs the board's command as a child process.
#[derive(Debug, Clone)]
pub struct ProcessDriver {
    env_var: String,
}

impl ProcessDriver {
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }

    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Shell-style rendering of what `compile` will execute, for dry runs
    /// and verbose logs.
    pub fn describe(&self, board: &BoardConfig, sketch: &Path) -> String {
        format!(
            "{}={} {}",
            self.env_var,
            sketch.display(),
            board.command.join(" ")
        )
    }
}

impl BuildDriver for ProcessDriver {
    fn compile(&self, board: &BoardConfig, sketch: &Path) -> Result<Outcome, RunError> {
        let (program, args) = board
            .command
            .split_first()
            .ok_or_else(|| RunError::EmptyCommand {
                board: board.label(),
            })?;

        // One pipe for both streams keeps the output interleaved as written.
        let (reader, writer) = std::io::pipe()?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .env(&self.env_var, sketch)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer);

        let spawned = cmd.spawn();
        // The builder holds the parent's copy of the write end; the read below
        // only sees EOF once it is gone.
        drop(cmd);

        let mut child = spawned.map_err(|source| RunError::Spawn {
            board: board.label(),
            program: program.clone(),
            source,
        })?;

        let raw = drain_output(&mut child, reader)?;
        let status = child.wait()?;

        if status.success() {
            Ok(Outcome::Pass)
        } else {
            Ok(Outcome::Fail {
                code: status.code(),
                output: String::from_utf8_lossy(&raw).into_owned(),
            })
        }
    }
}

/// Read the child's output to EOF. If reading fails the child is killed and
/// reaped before the error is returned.
fn drain_output<R: Read>(child: &mut Child, mut reader: R) -> Result<Vec<u8>, RunError> {
    let mut raw = Vec::new();
    if let Err(e) = reader.read_to_end(&mut raw) {
        let _ = child.kill();
        let _ = child.wait();
        return Err(e.into());
    }
    Ok(raw)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> BoardConfig {
        BoardConfig::new(["sh", "-c", script]).with_name("test-board")
    }

    #[test]
    fn test_zero_exit_is_pass() {
        let driver = ProcessDriver::new("SKETCH_CI_TEST_SRC");
        let outcome = driver
            .compile(&sh("echo compiled"), Path::new("a.ino"))
            .unwrap();
        assert_eq!(outcome, Outcome::Pass);
    }

    #[test]
    fn test_failure_captures_both_streams_in_order() {
        let driver = ProcessDriver::new("SKETCH_CI_TEST_SRC");
        let outcome = driver
            .compile(
                &sh("echo first; echo 'error: undefined symbol' >&2; echo last; exit 3"),
                Path::new("b.ino"),
            )
            .unwrap();

        match outcome {
            Outcome::Fail { code, output } => {
                assert_eq!(code, Some(3));
                assert_eq!(output, "first\nerror: undefined symbol\nlast\n");
            }
            Outcome::Pass => panic!("expected failure"),
        }
    }

    #[test]
    fn test_sketch_path_is_injected_into_child_only() {
        let var = "SKETCH_CI_DRIVER_INJECT";
        let driver = ProcessDriver::new(var);
        let outcome = driver
            .compile(
                &sh(&format!("echo \"${}\"; exit 1", var)),
                Path::new("tests/blink.ino"),
            )
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Fail {
                code: Some(1),
                output: "tests/blink.ino\n".to_string()
            }
        );
        assert!(std::env::var(var).is_err());
    }

    #[test]
    fn test_parent_environment_is_passed_through() {
        let driver = ProcessDriver::new("SKETCH_CI_TEST_SRC");
        let outcome = driver
            .compile(&sh("test -n \"$PATH\""), Path::new("a.ino"))
            .unwrap();
        assert!(outcome.is_pass());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let driver = ProcessDriver::new("SKETCH_CI_TEST_SRC");
        let board = BoardConfig::new(["sketch-ci-no-such-driver", "ci"]);
        let err = driver.compile(&board, Path::new("a.ino")).unwrap_err();
        match err {
            RunError::Spawn { program, source, .. } => {
                assert_eq!(program, "sketch-ci-no-such-driver");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let driver = ProcessDriver::new("SKETCH_CI_TEST_SRC");
        let board = BoardConfig::new(Vec::<String>::new()).with_name("blank");
        let err = driver.compile(&board, Path::new("a.ino")).unwrap_err();
        assert!(matches!(err, RunError::EmptyCommand { .. }));
    }

    #[test]
    fn test_describe() {
        let driver = ProcessDriver::new("PLATFORMIO_CI_SRC");
        let board = BoardConfig::new(["platformio", "ci", "--board=lightblue-bean"]);
        assert_eq!(
            driver.describe(&board, Path::new("a.ino")),
            "PLATFORMIO_CI_SRC=a.ino platformio ci --board=lightblue-bean"
        );
    }

    #[test]
    fn test_signal_death_is_failure_without_code() {
        let driver = ProcessDriver::new("SKETCH_CI_TEST_SRC");
        let outcome = driver
            .compile(&sh("echo partial; kill -9 $$"), Path::new("a.ino"))
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Fail {
                code: None,
                output: "partial\n".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_utf8_output_is_replaced() {
        let driver = ProcessDriver::new("SKETCH_CI_TEST_SRC");
        let outcome = driver
            .compile(&sh("printf 'a\\377b'; exit 1"), Path::new("a.ino"))
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Fail {
                code: Some(1),
                output: "a\u{FFFD}b".to_string()
            }
        );
    }

    struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("pipe went away"))
        }
    }

    #[test]
    fn test_read_failure_reaps_the_child() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let err = drain_output(&mut child, BrokenPipe).unwrap_err();
        assert!(matches!(err, RunError::IoError(_)));

        let status = child.try_wait().unwrap().expect("child should be reaped");
        assert!(!status.success());
    }
}
