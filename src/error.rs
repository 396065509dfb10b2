/// Conditions that stop a run outright.
///
/// A build driver exiting non-zero is not one of these; it is recorded as a
/// failed attempt and the run carries on.
#[derive(Debug)]
pub enum RunError {
    /// A sketch glob pattern is malformed
    BadPattern { pattern: String, reason: String },
    /// A board entry has no program to run
    EmptyCommand { board: String },
    /// The build driver could not be started at all
    Spawn {
        board: String,
        program: String,
        source: std::io::Error,
    },
    /// Nothing to compile and the caller asked for that to be an error
    NothingToDo(String),
    /// IO error while talking to a running build driver
    IoError(std::io::Error),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::BadPattern { pattern, reason } => {
                write!(f, "Invalid sketch pattern '{}': {}", pattern, reason)
            }
            RunError::EmptyCommand { board } => {
                write!(f, "Board '{}' has an empty command", board)
            }
            RunError::Spawn {
                board,
                program,
                source,
            } if source.kind() == std::io::ErrorKind::NotFound => write!(
                f,
                "Build driver '{}' for board '{}' was not found on PATH",
                program, board
            ),
            RunError::Spawn {
                board,
                program,
                source,
            } => write!(
                f,
                "Failed to start '{}' for board '{}': {}",
                program, board, source
            ),
            RunError::NothingToDo(msg) => write!(f, "Nothing to compile: {}", msg),
            RunError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Spawn { source, .. } => Some(source),
            RunError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RunError {
    fn from(e: std::io::Error) -> Self {
        RunError::IoError(e)
    }
}
