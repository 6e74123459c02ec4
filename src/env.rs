use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Mutable, user-level state of a shell session.
///
/// The environment contains:
/// - the shell variables that `$NAME` expands to and that external commands see;
/// - the current working directory used to resolve relative paths;
/// - a flag that the read loop checks to know when to terminate.
///
/// It is created once per session and passed explicitly to the parser,
/// the dispatcher and every command handler.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: HashMap<String, String>,
    current_dir: PathBuf,
    should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// This copies variables from `std::env::vars()` and initializes the
    /// working directory from `std::env::current_dir()`.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// An environment with no variables, rooted at `dir`.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            vars: HashMap::new(),
            current_dir: dir.into(),
            should_exit: false,
        }
    }

    /// Value of a variable, or an empty string when it is not set.
    pub fn get_var(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_default().to_string()
    }

    /// Value of a variable, `None` when it is not set.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override a variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub fn set_current_dir(&mut self, dir: impl Into<PathBuf>) {
        self.current_dir = dir.into();
    }

    /// Resolve `path` against the current directory unless it is absolute.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join(path)
        }
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    pub fn request_exit(&mut self) {
        self.should_exit = true;
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
