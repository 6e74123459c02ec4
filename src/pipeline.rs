use crate::command::{Command, Outcome};
use crate::dispatch::Dispatcher;
use crate::env::Environment;

/// Commands connected by `|`, run left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    commands: Vec<Command>,
}

impl Pipeline {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run every stage, feeding each one's output to the next.
    ///
    /// The first stage gets no input. Execution stops at the first failing
    /// stage and its failure is the result; later stages never run. An empty
    /// pipeline succeeds with no output.
    pub fn execute(&self, dispatcher: &Dispatcher, env: &mut Environment) -> Outcome {
        let mut current_input: Option<String> = None;

        for (stage, command) in self.commands.iter().enumerate() {
            match dispatcher.dispatch(command, current_input.take(), env) {
                Outcome::Success(output) => {
                    tracing::debug!(
                        stage,
                        command = command.name(),
                        bytes = output.len(),
                        "stage done"
                    );
                    current_input = Some(output);
                }
                failure @ Outcome::Failure { .. } => {
                    tracing::debug!(stage, command = command.name(), "stage failed, stopping");
                    return failure;
                }
            }
        }

        Outcome::Success(current_input.unwrap_or_default())
    }
}

impl From<Vec<Command>> for Pipeline {
    fn from(commands: Vec<Command>) -> Self {
        Self::new(commands)
    }
}
