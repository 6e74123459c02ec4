use crate::builtin::split_assignment;
use crate::command::{Command, CommandHandler, Outcome};
use crate::env::Environment;
use std::collections::HashMap;

/// Handler for the built-in `T`.
///
/// Only supports commands defined in this crate, see `BuiltinCommand`.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Maps command names to the handlers that run them.
///
/// A name with no registered handler is first checked for a bare `NAME=value`
/// assignment and otherwise given to the fallback handler, which by default
/// launches an external program.
pub struct Dispatcher {
    handlers: HashMap<String, Box<dyn CommandHandler>>,
    fallback: Box<dyn CommandHandler>,
}

impl Dispatcher {
    /// A dispatcher with no built-ins.
    pub fn new(fallback: Box<dyn CommandHandler>) -> Self {
        Self {
            handlers: HashMap::new(),
            fallback,
        }
    }

    /// Add a handler for `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, handler: Box<dyn CommandHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Run a single pipeline stage.
    pub fn dispatch(
        &self,
        command: &Command,
        input: Option<String>,
        env: &mut Environment,
    ) -> Outcome {
        if let Some(handler) = self.handlers.get(command.name()) {
            tracing::debug!(command = command.name(), "dispatching to built-in");
            return handler.handle(command, input, env);
        }
        if command.arguments().is_empty()
            && let Some((name, value)) = split_assignment(command.name())
        {
            tracing::debug!(name, "assigning variable");
            env.set_var(name, value);
            return Outcome::Success(String::new());
        }
        tracing::debug!(command = command.name(), "dispatching to fallback");
        self.fallback.handle(command, input, env)
    }

    fn with_builtins(mut self) -> Self {
        use crate::builtin::*;
        self.register(Pwd::name(), Box::new(Factory::<Pwd>::default()));
        self.register(Cd::name(), Box::new(Factory::<Cd>::default()));
        self.register(Echo::name(), Box::new(Factory::<Echo>::default()));
        self.register(Exit::name(), Box::new(Factory::<Exit>::default()));
        self.register(Cat::name(), Box::new(Factory::<Cat>::default()));
        self.register(WC::name(), Box::new(Factory::<WC>::default()));
        self.register(Ls::name(), Box::new(Factory::<Ls>::default()));
        self.register(Set::name(), Box::new(Factory::<Set>::default()));
        self.register(Grep::name(), Box::new(Factory::<Grep>::default()));
        self
    }
}

impl Default for Dispatcher {
    /// Create a dispatcher with the default set of commands:
    /// - built-ins: `pwd`, `cd`, `echo`, `exit`, `cat`, `wc`, `ls`, `set`, `grep`
    /// - external command launcher as the fallback
    fn default() -> Self {
        use crate::external::ExternalCommand;
        Self::new(Box::new(Factory::<ExternalCommand>::default())).with_builtins()
    }
}
