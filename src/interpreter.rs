use crate::command::Outcome;
use crate::config::ShellConfig;
use crate::dispatch::Dispatcher;
use crate::env::Environment;
use crate::parser;
use crate::pipeline::Pipeline;
use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter owns the session's [`Environment`] and a [`Dispatcher`] that
/// maps command names to handlers.
///
/// Example
/// ```
/// use cli_shell::Interpreter;
/// let mut sh = Interpreter::default();
/// sh.execute_line("set NAME=world");
/// let out = sh.execute_line("echo hello $NAME | grep -w world");
/// assert_eq!(out.render(), "hello world\n");
/// ```
pub struct Interpreter {
    env: Environment,
    dispatcher: Dispatcher,
}

impl Interpreter {
    /// Create a new interpreter with a custom environment and set of commands.
    pub fn new(env: Environment, dispatcher: Dispatcher) -> Self {
        Self { env, dispatcher }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Parse and run one line of input.
    pub fn execute_line(&mut self, line: &str) -> Outcome {
        let pipeline = Pipeline::new(parser::parse(line, &self.env));
        pipeline.execute(&self.dispatcher, &mut self.env)
    }

    /// Read-Eval-Print Loop.
    ///
    /// Failures are printed and the loop goes on; it ends on `exit`, Ctrl-C or Ctrl-D.
    pub fn repl(&mut self, config: &ShellConfig) -> Result<()> {
        let mut rl = DefaultEditor::new().context("failed to initialize line editor")?;
        if let Some(history) = &config.history {
            // A missing history file is normal on first start.
            if let Err(err) = rl.load_history(history) {
                tracing::debug!(error = %err, "no history loaded");
            }
        }

        let stdout = std::io::stdout();
        while !self.env.should_exit() {
            match rl.readline(&config.prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    history_ok(rl.add_history_entry(line.as_str()));
                    let outcome = self.execute_line(&line);
                    if let Outcome::Failure { kind, message } = &outcome {
                        tracing::debug!(?kind, error = %message, "line failed");
                    }
                    print_outcome(&mut stdout.lock(), &outcome)?;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    tracing::warn!(error = %err, "readline failed");
                    return Err(err).context("failed to read input");
                }
            }
        }

        if let Some(history) = &config.history {
            rl.save_history(history)
                .with_context(|| format!("failed to save history to {}", history.display()))?;
        }
        Ok(())
    }
}

/// Report a line-history problem without ending the session.
fn history_ok<T>(result: rustyline::Result<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(error = %err, "failed to record history entry");
            false
        }
    }
}

/// Write the rendered outcome, ending it with a newline when it has none.
pub fn print_outcome(out: &mut dyn Write, outcome: &Outcome) -> std::io::Result<()> {
    let text = outcome.render();
    if text.is_empty() {
        return Ok(());
    }
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()
}

impl Default for Interpreter {
    /// An interpreter over the process environment with every built-in.
    fn default() -> Self {
        Self::new(Environment::new(), Dispatcher::default())
    }
}
