//! Run configuration (`compile_all.toml`).
//!
//! Without a config file the runner uses the built-in board list and sketch
//! patterns below. A file only needs the keys it wants to change:
//!
//! ```toml
//! env_var = "PLATFORMIO_CI_SRC"
//! sketches = ["tests/resources/test_sketches/*.ino"]
//!
//! [[boards]]
//! name = "lightblue-bean"
//! command = ["platformio", "ci", "--board=lightblue-bean"]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "compile_all.toml";

/// Variable the build driver reads to find the sketch it should compile.
pub const DEFAULT_ENV_VAR: &str = "PLATFORMIO_CI_SRC";

// Adding more boards? Add them here:
// &["platformio", "ci", "--board=your-board-here"],
const DEFAULT_BOARDS: &[&[&str]] = &[&["platformio", "ci", "--board=lightblue-bean"]];

const DEFAULT_SKETCHES: &[&str] = &[
    "tests/resources/test_sketches/*.ino",
    "examples/LightBlueBean/01.Basics/*/*.ino",
];

/// One invocation profile of the build driver.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Label used in log lines. Derived from the command when absent.
    pub name: Option<String>,
    /// Program followed by its arguments.
    pub command: Vec<String>,
}

impl BoardConfig {
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            command: command.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display label: explicit name, else the value of a `--board=` flag,
    /// else the whole command line.
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.command
            .iter()
            .find_map(|arg| arg.strip_prefix("--board="))
            .map(str::to_string)
            .unwrap_or_else(|| self.command.join(" "))
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    pub env_var: String,
    pub sketches: Vec<String>,
    pub boards: Vec<BoardConfig>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            env_var: DEFAULT_ENV_VAR.to_string(),
            sketches: DEFAULT_SKETCHES.iter().map(|s| s.to_string()).collect(),
            boards: DEFAULT_BOARDS
                .iter()
                .map(|cmd| BoardConfig::new(cmd.iter().copied()))
                .collect(),
        }
    }
}

impl RunnerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RunnerConfig = toml::from_str(content).context(
            "Failed to parse config - check for syntax errors (missing quotes, brackets)",
        )?;
        if config.env_var.trim().is_empty() {
            anyhow::bail!("'env_var' must not be empty");
        }
        Ok(config)
    }
}

/// Load the run configuration.
///
/// An explicit path must exist. Otherwise `compile_all.toml` is used when
/// present, and the built-in defaults when it is not.
pub fn load_config(explicit: Option<&Path>) -> Result<RunnerConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(anyhow::anyhow!(
                    "{} not found.\n\n\
                    💡 Tip: Drop --config to use the built-in board list, or create {}.",
                    path.display(),
                    DEFAULT_CONFIG_FILE
                ));
            }
            path
        }
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(RunnerConfig::default());
            }
            default
        }
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} - check file permissions", path.display()))?;
    RunnerConfig::from_toml_str(&content)
        .with_context(|| format!("Invalid config in {}", path.display()))
}
