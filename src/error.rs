use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the command layer.
///
/// None of these leave a pipeline stage: the dispatcher turns them into
/// [`Outcome::Failure`](crate::command::Outcome::Failure). Causes are part of
/// the message and are not exposed as `source()`, so a rendered error chain
/// mentions each of them once.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("missing pattern")]
    MissingPattern,
    #[error("missing file parameter")]
    MissingSource,
    #[error("{}: {cause}", path.display())]
    SourceUnavailable { path: PathBuf, cause: io::Error },
    #[error("invalid pattern: {0}")]
    InvalidPattern(regex::Error),
    #[error("{0}")]
    UnknownOption(String),
    #[error("command not found: {0}")]
    CommandNotFound(String),
    #[error("failed to run {command}: {cause}")]
    ProcessSpawnFailure { command: String, cause: io::Error },
}

impl From<regex::Error> for ShellError {
    fn from(err: regex::Error) -> Self {
        ShellError::InvalidPattern(err)
    }
}

/// Category of a failed stage, without the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingPattern,
    MissingSource,
    SourceUnavailable,
    InvalidPattern,
    UnknownOption,
    ProcessSpawnFailure,
    /// Any other failure reported by a built-in.
    CommandFailed,
}

impl ShellError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShellError::MissingPattern => ErrorKind::MissingPattern,
            ShellError::MissingSource => ErrorKind::MissingSource,
            ShellError::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            ShellError::InvalidPattern(_) => ErrorKind::InvalidPattern,
            ShellError::UnknownOption(_) => ErrorKind::UnknownOption,
            ShellError::CommandNotFound(_) | ShellError::ProcessSpawnFailure { .. } => {
                ErrorKind::ProcessSpawnFailure
            }
        }
    }
}

impl ErrorKind {
    /// Recover the kind from an error chain, if a [`ShellError`] is in it.
    pub fn of(err: &anyhow::Error) -> Self {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<ShellError>())
            .map_or(ErrorKind::CommandFailed, ShellError::kind)
    }
}
