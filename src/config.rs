use argh::FromArgs;
use std::path::PathBuf;

/// Default prompt of the interactive loop.
pub const DEFAULT_PROMPT: &str = "> ";

#[derive(FromArgs, Debug, Clone, PartialEq, Eq)]
/// A small command interpreter with pipes, variables and a built-in grep.
pub struct ShellConfig {
    #[argh(option, short = 'c')]
    /// run a single command line, print its result and exit.
    pub command: Option<String>,

    #[argh(option, default = "DEFAULT_PROMPT.to_string()")]
    /// prompt shown before each line in interactive mode.
    pub prompt: String,

    #[argh(option)]
    /// file used to load and save the line-editing history.
    pub history: Option<PathBuf>,

    #[argh(option, default = "String::from(\"warn\")")]
    /// log filter used when RUST_LOG is not set (e.g. "debug" or "cli_shell=trace").
    pub log_level: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            command: None,
            prompt: DEFAULT_PROMPT.to_string(),
            history: None,
            log_level: String::from("warn"),
        }
    }
}
