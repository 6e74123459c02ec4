use crate::env::Environment;
use crate::error::{ErrorKind, ShellError};
use std::fmt;

/// Prefix of a rendered failure.
pub const ERROR_PREFIX: &str = "ERROR: ";
/// Prefix of a rendered option-parsing failure.
pub const OPTION_ERROR_PREFIX: &str = "ERR: ";

/// A single command of a pipeline: a name and its arguments, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    arguments: Vec<String>,
    literal_match: bool,
}

impl Command {
    pub fn new(name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
            literal_match: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// True when the search pattern was single-quoted and must match as plain text.
    pub fn literal_match(&self) -> bool {
        self.literal_match
    }

    pub fn set_literal_match(&mut self, literal: bool) {
        self.literal_match = literal;
    }

    /// The name followed by the arguments.
    pub fn full_command(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.arguments.iter().map(String::as_str))
            .collect()
    }
}

/// Result of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure { kind: ErrorKind, message: String },
}

impl Outcome {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Outcome::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }

    /// Text shown to the user: the output itself, or the prefixed error message.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success(text) => f.write_str(text),
            Outcome::Failure {
                kind: ErrorKind::UnknownOption,
                message,
            } => write!(f, "{OPTION_ERROR_PREFIX}{message}"),
            Outcome::Failure { message, .. } => write!(f, "{ERROR_PREFIX}{message}"),
        }
    }
}

impl From<ShellError> for Outcome {
    fn from(err: ShellError) -> Self {
        Outcome::failure(err.kind(), err.to_string())
    }
}

impl From<anyhow::Error> for Outcome {
    fn from(err: anyhow::Error) -> Self {
        Outcome::failure(ErrorKind::of(&err), format!("{err:#}"))
    }
}

/// Anything that can run one pipeline stage.
///
/// Handlers never fail across the stage boundary: every problem is reported
/// as an [`Outcome::Failure`].
pub trait CommandHandler {
    fn handle(&self, command: &Command, input: Option<String>, env: &mut Environment) -> Outcome;
}
