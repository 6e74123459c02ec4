use crate::command::{Command, CommandHandler, Outcome};
use crate::dispatch::Factory;
use crate::env::Environment;
use crate::error::ShellError;
use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::thread;

/// Command that is not a builtin.
pub struct ExternalCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }

    /// Run the program to completion and collect its standard output.
    ///
    /// The input is written from a separate thread so that a child blocked on
    /// a full stdout pipe cannot deadlock against us.
    fn run(&self, input: Option<String>, env: &Environment) -> Result<String, ShellError> {
        let spawn_failure = |cause: io::Error| ShellError::ProcessSpawnFailure {
            command: self.program.display().to_string(),
            cause,
        };

        let mut child = std::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::inherit()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .envs(env.vars())
            .current_dir(env.current_dir())
            .spawn()
            .map_err(spawn_failure)?;

        let writer = match (input, child.stdin.take()) {
            (Some(text), Some(mut stdin)) => {
                Some(thread::spawn(move || stdin.write_all(text.as_bytes())))
            }
            _ => None,
        };

        let output = child.wait_with_output().map_err(spawn_failure)?;

        if let Some(writer) = writer {
            match writer.join() {
                // The child may exit without reading all of its input.
                Ok(Err(e)) if e.kind() != io::ErrorKind::BrokenPipe => {
                    return Err(spawn_failure(e));
                }
                _ => {}
            }
        }

        tracing::debug!(
            program = %self.program.display(),
            code = exit_code(output.status),
            bytes = output.stdout.len(),
            "external command finished"
        );
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl CommandHandler for Factory<ExternalCommand> {
    fn handle(&self, command: &Command, input: Option<String>, env: &mut Environment) -> Outcome {
        let search_paths = env.lookup("PATH").unwrap_or_default();
        let Some(program) = find_command_path(
            OsStr::new(search_paths),
            env.current_dir(),
            Path::new(command.name()),
        ) else {
            return ShellError::CommandNotFound(command.name().to_string()).into();
        };

        let external = ExternalCommand::new(program, command.arguments().to_vec());
        match external.run(input, env) {
            Ok(output) => Outcome::Success(output),
            Err(err) => err.into(),
        }
    }
}

/// Conventional exit code of a finished process.
fn exit_code(exit_status: ExitStatus) -> i32 {
    match exit_status.code() {
        Some(x) => x,
        None => terminated_by_signal(exit_status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - A single plain component (no separators): search each directory in
///   `search_paths` (PATH) and return the first existing match.
/// - Anything else (`./foo`, `bin/sh`, `..`): resolved against `cwd`,
///   returned if it exists.
/// - Empty path: returns `None`.
pub fn find_command_path(search_paths: &OsStr, cwd: &Path, path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return find_by_path(path);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        // Empty path -> not found
        (None, _) => None,
        // Single component -> search in PATH
        (Some(Component::Normal(name)), None) => find_in_path(search_paths, name),
        // Multiple components -> search in current dir
        _ => find_by_path(&cwd.join(path)),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths).find_map(|dir| find_by_path(&dir.join(cmd)))
}

fn find_by_path(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        Some(path.to_path_buf())
    } else {
        None
    }
}
