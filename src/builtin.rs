use crate::command::{Command, CommandHandler, Outcome};
use crate::dispatch::Factory;
use crate::env::Environment;
use crate::error::ShellError;
use crate::grep::{self, MatchOptions};
use anyhow::{Context, Result, bail};
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process. They take the previous stage's output as input and return their
/// own output as text.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Executes the command against the piped input and the environment.
    fn execute(
        self,
        command: &Command,
        input: Option<String>,
        env: &mut Environment,
    ) -> Result<String>;
}

impl<T: BuiltinCommand> CommandHandler for Factory<T> {
    fn handle(&self, command: &Command, input: Option<String>, env: &mut Environment) -> Outcome {
        let args: Vec<&str> = command.arguments().iter().map(String::as_str).collect();
        match T::from_args(&[T::name()], &args) {
            Ok(cmd) => match cmd.execute(command, input, env) {
                Ok(output) => Outcome::Success(output),
                Err(err) => err.context(T::name()).into(),
            },
            // `--help` also ends up here, with a successful status.
            Err(EarlyExit { output, status }) => match status {
                Ok(()) => Outcome::Success(output),
                Err(()) => {
                    ShellError::UnknownOption(format!("{}: {}", T::name(), output.trim_end()))
                        .into()
                }
            },
        }
    }
}

fn read_file(env: &Environment, name: &str) -> Result<String> {
    let path = env.resolve(name);
    let bytes = fs::read(&path).with_context(|| name.to_string())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(
        self,
        _command: &Command,
        _input: Option<String>,
        env: &mut Environment,
    ) -> Result<String> {
        Ok(format!("{}\n", env.current_dir().display()))
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _command: &Command,
        _input: Option<String>,
        env: &mut Environment,
    ) -> Result<String> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match env.lookup("HOME") {
                Some(home) => PathBuf::from(home),
                None => bail!("no target and HOME not set"),
            },
        };

        let new_dir = env.resolve(&target);
        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("{}", target.display()))?;
        if !canonical.is_dir() {
            bail!("{}: Not a directory", target.display());
        }

        env.set_current_dir(canonical);
        Ok(String::new())
    }
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; accepted for compatibility with `exit N`.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        _command: &Command,
        _input: Option<String>,
        env: &mut Environment,
    ) -> Result<String> {
        env.request_exit();
        Ok(String::new())
    }
}

#[derive(FromArgs)]
/// write the arguments to standard output, separated by spaces.
/// by default, a trailing newline is printed.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(
        self,
        _command: &Command,
        _input: Option<String>,
        _env: &mut Environment,
    ) -> Result<String> {
        let mut s = self.args.join(" ");
        if !self.no_newline {
            s.push('\n');
        }
        Ok(s)
    }
}

#[derive(FromArgs)]
/// count lines, words and bytes
pub struct WC {
    #[argh(positional, greedy)]
    /// files to count; the piped input is counted when none are given.
    pub files: Vec<String>,
}

fn counts(s: &str) -> (usize, usize, usize) {
    (s.lines().count(), s.split_whitespace().count(), s.len())
}

impl BuiltinCommand for WC {
    fn name() -> &'static str {
        "wc"
    }

    fn execute(
        self,
        _command: &Command,
        input: Option<String>,
        env: &mut Environment,
    ) -> Result<String> {
        if self.files.is_empty() {
            let (lines, words, bytes) = counts(input.as_deref().unwrap_or_default());
            return Ok(format!("{} {} {}\n", lines, words, bytes));
        }
        let mut out = String::new();
        for fname in &self.files {
            let (lines, words, bytes) = counts(&read_file(env, fname)?);
            out.push_str(&format!("{} {} {} {}\n", lines, words, bytes, fname));
        }
        Ok(out)
    }
}

#[derive(FromArgs)]
/// print file(s) to stdout
pub struct Cat {
    #[argh(positional, greedy)]
    /// files to print; the piped input is passed through when none are given.
    pub files: Vec<String>,
}

impl BuiltinCommand for Cat {
    fn name() -> &'static str {
        "cat"
    }

    fn execute(
        self,
        _command: &Command,
        input: Option<String>,
        env: &mut Environment,
    ) -> Result<String> {
        if self.files.is_empty() {
            return Ok(input.unwrap_or_default());
        }
        let mut out = String::new();
        for fname in &self.files {
            out.push_str(&read_file(env, fname)?);
        }
        Ok(out)
    }
}

#[derive(FromArgs)]
/// list directory contents
pub struct Ls {
    #[argh(positional)]
    /// directory to list; defaults to the current directory.
    pub dir: Option<String>,
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn execute(
        self,
        _command: &Command,
        _input: Option<String>,
        env: &mut Environment,
    ) -> Result<String> {
        let shown = self.dir.unwrap_or_else(|| ".".to_string());
        let dir = env.resolve(&shown);
        if !dir.is_dir() {
            bail!("cannot access '{}': No such directory", shown);
        }

        let mut names = fs::read_dir(&dir)
            .with_context(|| format!("cannot open directory '{}'", shown))?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<Vec<String>>>()?;
        names.sort();

        Ok(names.iter().map(|name| format!("{}\n", name)).collect())
    }
}

#[derive(FromArgs)]
/// set a shell variable
pub struct Set {
    #[argh(positional)]
    /// assignment in the form NAME=value.
    pub assignment: Option<String>,
}

/// Split `NAME=value`, checking that `NAME` is a valid variable name.
pub(crate) fn split_assignment(text: &str) -> Option<(&str, &str)> {
    let (name, value) = text.split_once('=')?;
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some((name, value))
}

impl BuiltinCommand for Set {
    fn name() -> &'static str {
        "set"
    }

    fn execute(
        self,
        _command: &Command,
        _input: Option<String>,
        env: &mut Environment,
    ) -> Result<String> {
        let Some(assignment) = self.assignment else {
            bail!("missing variable name or value");
        };
        let Some((name, value)) = split_assignment(&assignment) else {
            bail!("invalid syntax. Use: set NAME=value");
        };
        env.set_var(name, value);
        Ok(String::new())
    }
}

#[derive(FromArgs)]
/// print lines matching a pattern
pub struct Grep {
    #[argh(positional)]
    /// the pattern to search for (a regular expression), then an optional file.
    /// Reads the piped input when no file is given.
    pub operands: Vec<String>,

    #[argh(switch, short = 'w')]
    /// match only whole words (using non-word characters as boundaries)
    pub word_regexp: bool,

    #[argh(switch, short = 'i')]
    /// ignore case distinctions
    pub ignore_case: bool,

    #[argh(option, short = 'A', default = "0")]
    /// print NUM lines of trailing context after matching lines
    pub after_context: usize,
}

impl BuiltinCommand for Grep {
    fn name() -> &'static str {
        "grep"
    }

    fn execute(
        self,
        command: &Command,
        input: Option<String>,
        env: &mut Environment,
    ) -> Result<String> {
        let mut operands = self.operands.into_iter();
        let pattern = operands.next();
        let file = operands.next();
        if let Some(extra) = operands.next() {
            return Err(ShellError::UnknownOption(format!("unexpected argument: {}", extra)).into());
        }

        let options = MatchOptions {
            pattern,
            whole_word: self.word_regexp,
            ignore_case: self.ignore_case,
            after_context: self.after_context,
            literal_match: command.literal_match(),
            file_name: file.map(|f| env.resolve(f)),
        };
        Ok(grep::search(&options, input.as_deref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    fn command(line: &[&str]) -> Command {
        Command::new(line[0], line[1..].iter().map(|s| s.to_string()).collect())
    }

    fn run<T: BuiltinCommand>(line: &[&str], input: Option<&str>, env: &mut Environment) -> Outcome {
        Factory::<T>::default().handle(&command(line), input.map(str::to_string), env)
    }

    fn ok(outcome: Outcome) -> String {
        match outcome {
            Outcome::Success(text) => text,
            failure => panic!("expected success, got {:?}", failure),
        }
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let mut env = Environment::with_dir("/tmp/somewhere");
        assert_eq!(ok(run::<Pwd>(&["pwd"], None, &mut env)), "/tmp/somewhere\n");
    }

    #[test]
    fn test_echo_with_and_without_newline() {
        let mut env = Environment::with_dir("/");
        assert_eq!(ok(run::<Echo>(&["echo", "hello", "world"], None, &mut env)), "hello world\n");
        assert_eq!(ok(run::<Echo>(&["echo", "-n", "foo", "bar"], None, &mut env)), "foo bar");
    }

    #[test]
    fn test_echo_ignores_input() {
        let mut env = Environment::with_dir("/");
        assert_eq!(ok(run::<Echo>(&["echo", "x"], Some("piped"), &mut env)), "x\n");
    }

    #[test]
    fn test_help_is_success() {
        let mut env = Environment::with_dir("/");
        let out = ok(run::<Echo>(&["echo", "--help"], None, &mut env));
        assert!(out.contains("Usage: echo"));
    }

    #[test]
    fn test_cd_to_absolute_path_only_moves_cursor() {
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();
        let orig = std::env::current_dir().unwrap();

        let mut env = Environment::with_dir("/");
        let target = canonical_temp.to_string_lossy().to_string();
        ok(run::<Cd>(&["cd", &target], None, &mut env));

        assert_eq!(env.current_dir(), canonical_temp.as_path());
        assert_eq!(std::env::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_relative_path() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("inner")).unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();

        let mut env = Environment::with_dir(&canonical_temp);
        ok(run::<Cd>(&["cd", "inner"], None, &mut env));
        assert_eq!(env.current_dir(), canonical_temp.join("inner").as_path());

        ok(run::<Cd>(&["cd", ".."], None, &mut env));
        assert_eq!(env.current_dir(), canonical_temp.as_path());
    }

    #[test]
    fn test_cd_to_home_when_none() {
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();

        let mut env = Environment::with_dir("/");
        env.set_var("HOME", canonical_temp.to_string_lossy().to_string());

        ok(run::<Cd>(&["cd"], None, &mut env));
        assert_eq!(env.current_dir(), canonical_temp.as_path());
    }

    #[test]
    fn test_cd_without_home_fails() {
        let mut env = Environment::with_dir("/");
        let outcome = run::<Cd>(&["cd"], None, &mut env);
        assert_eq!(
            outcome,
            Outcome::failure(ErrorKind::CommandFailed, "cd: no target and HOME not set")
        );
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = Environment::with_dir(temp.path());

        let outcome = run::<Cd>(&["cd", "nonexistent_dir"], None, &mut env);
        assert!(outcome.render().starts_with("ERROR: cd: nonexistent_dir"));
        assert_eq!(env.current_dir(), temp.path());
    }

    #[test]
    fn test_cd_to_file_errors() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("plain.txt"), "x").unwrap();
        let mut env = Environment::with_dir(temp.path());

        let outcome = run::<Cd>(&["cd", "plain.txt"], None, &mut env);
        assert!(outcome.render().ends_with("Not a directory"));
    }

    #[test]
    fn test_cat_reads_file_relative_to_current_dir() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "hello\nworld\n").unwrap();
        let mut env = Environment::with_dir(temp.path());

        assert_eq!(ok(run::<Cat>(&["cat", "a.txt"], None, &mut env)), "hello\nworld\n");
    }

    #[test]
    fn test_cat_and_wc_accept_non_utf8_files() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("latin1.txt"), b"caf\xe9\nplain\n").unwrap();
        let mut env = Environment::with_dir(temp.path());

        assert_eq!(
            ok(run::<Cat>(&["cat", "latin1.txt"], None, &mut env)),
            "caf\u{FFFD}\nplain\n"
        );
        assert_eq!(
            ok(run::<WC>(&["wc", "latin1.txt"], None, &mut env)),
            "2 2 13 latin1.txt\n"
        );
    }

    #[test]
    fn test_cat_concatenates_files() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a"), "1\n").unwrap();
        fs::write(temp.path().join("b"), "2\n").unwrap();
        let mut env = Environment::with_dir(temp.path());

        assert_eq!(ok(run::<Cat>(&["cat", "a", "b"], None, &mut env)), "1\n2\n");
    }

    #[test]
    fn test_cat_passes_input_through_when_no_args() {
        let mut env = Environment::with_dir("/");
        let out = ok(run::<Cat>(&["cat"], Some("from stdin\nline2\n"), &mut env));
        assert_eq!(out, "from stdin\nline2\n");
        assert_eq!(ok(run::<Cat>(&["cat"], None, &mut env)), "");
    }

    #[test]
    fn test_cat_missing_file_fails() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = Environment::with_dir(temp.path());
        let outcome = run::<Cat>(&["cat", "missing.txt"], None, &mut env);
        assert!(outcome.is_failure());
        assert!(outcome.render().starts_with("ERROR: cat: missing.txt: "));
    }

    #[test]
    fn test_wc_counts_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        // two lines, three words, bytes include newlines
        write!(tmp, "one two\nthree\n").unwrap();
        let name = tmp.path().to_string_lossy().to_string();

        let mut env = Environment::with_dir("/");
        let out = ok(run::<WC>(&["wc", &name], None, &mut env));
        assert_eq!(out, format!("2 3 14 {}\n", name));
    }

    #[test]
    fn test_wc_counts_input_when_no_args() {
        let mut env = Environment::with_dir("/");
        // 1 line, 3 words, bytes = 6 (including newline)
        assert_eq!(ok(run::<WC>(&["wc"], Some("a b c\n"), &mut env)), "1 3 6\n");
        assert_eq!(ok(run::<WC>(&["wc"], None, &mut env)), "0 0 0\n");
    }

    #[test]
    fn test_wc_multiple_files_output_contains_each_filename() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("f1"), "a b\n").unwrap();
        fs::write(temp.path().join("f2"), "c\n").unwrap();
        let mut env = Environment::with_dir(temp.path());

        let out = ok(run::<WC>(&["wc", "f1", "f2"], None, &mut env));
        assert_eq!(out, "1 2 4 f1\n1 1 2 f2\n");
    }

    #[test]
    fn test_ls_lists_sorted_names() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("b.txt"), "").unwrap();
        fs::write(temp.path().join("a.txt"), "").unwrap();
        fs::create_dir(temp.path().join("c")).unwrap();
        let mut env = Environment::with_dir(temp.path());

        assert_eq!(ok(run::<Ls>(&["ls"], None, &mut env)), "a.txt\nb.txt\nc\n");
        assert_eq!(ok(run::<Ls>(&["ls", "c"], None, &mut env)), "");
    }

    #[test]
    fn test_ls_missing_dir_fails() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = Environment::with_dir(temp.path());
        let outcome = run::<Ls>(&["ls", "nope"], None, &mut env);
        assert!(outcome.render().starts_with("ERROR: ls: cannot access 'nope'"));
    }

    #[test]
    fn test_set_assigns_variable() {
        let mut env = Environment::with_dir("/");
        ok(run::<Set>(&["set", "GREETING=hello=there"], None, &mut env));
        assert_eq!(env.get_var("GREETING"), "hello=there");
    }

    #[test]
    fn test_set_rejects_malformed_assignment() {
        let mut env = Environment::with_dir("/");
        assert!(run::<Set>(&["set", "novalue"], None, &mut env).is_failure());
        assert!(run::<Set>(&["set", "=x"], None, &mut env).is_failure());
        assert!(run::<Set>(&["set"], None, &mut env).is_failure());
    }

    #[test]
    fn test_exit_sets_flag() {
        let mut env = Environment::with_dir("/");
        ok(run::<Exit>(&["exit", "3"], None, &mut env));
        assert!(env.should_exit());
    }

    #[test]
    fn test_grep_ignore_case_on_file() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("data.txt"), "Target 1\nTaRgEt 2\nNo match\n").unwrap();
        let mut env = Environment::with_dir(temp.path());

        let out = ok(run::<Grep>(&["grep", "-i", "target", "data.txt"], None, &mut env));
        assert_eq!(out, "Target 1\nTaRgEt 2\n");
    }

    #[test]
    fn test_grep_after_context_option() {
        let mut env = Environment::with_dir("/");
        let input = "Line 1\nMATCH 1\nLine 3\nLine 4\n";
        let out = ok(run::<Grep>(&["grep", "-A", "1", "MATCH"], Some(input), &mut env));
        assert_eq!(out, "MATCH 1\nLine 3\n");
    }

    #[test]
    fn test_grep_options_after_pattern() {
        let mut env = Environment::with_dir("/");
        let out = ok(run::<Grep>(&["grep", "cat", "-w"], Some("Category\nThe cat sat"), &mut env));
        assert_eq!(out, "The cat sat\n");
    }

    #[test]
    fn test_grep_uses_literal_flag_of_command() {
        let mut env = Environment::with_dir("/");
        let mut cmd = command(&["grep", "a.c"]);
        cmd.set_literal_match(true);
        let outcome = Factory::<Grep>::default().handle(&cmd, Some("abc\na.c".into()), &mut env);
        assert_eq!(outcome, Outcome::Success("a.c\n".into()));
    }

    #[test]
    fn test_grep_unknown_option() {
        let mut env = Environment::with_dir("/");
        let outcome = run::<Grep>(&["grep", "-z", "x"], Some("x"), &mut env);
        assert!(matches!(
            outcome,
            Outcome::Failure {
                kind: ErrorKind::UnknownOption,
                ..
            }
        ));
        assert!(outcome.render().starts_with("ERR: grep: "));
    }

    #[test]
    fn test_grep_negative_context_is_option_error() {
        let mut env = Environment::with_dir("/");
        let outcome = run::<Grep>(&["grep", "-A", "-1", "x"], Some("x"), &mut env);
        assert!(outcome.render().starts_with("ERR: grep: "));
    }

    #[test]
    fn test_grep_missing_pattern() {
        let mut env = Environment::with_dir("/");
        let outcome = run::<Grep>(&["grep"], Some("x"), &mut env);
        assert_eq!(
            outcome,
            Outcome::failure(ErrorKind::MissingPattern, "grep: missing pattern")
        );
    }

    #[test]
    fn test_grep_missing_source() {
        let mut env = Environment::with_dir("/");
        let outcome = run::<Grep>(&["grep", "x"], None, &mut env);
        assert_eq!(outcome.render(), "ERROR: grep: missing file parameter");
    }

    #[test]
    fn test_grep_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        let mut env = Environment::with_dir(temp.path());
        let outcome = run::<Grep>(&["grep", "pattern", "nonexistent.txt"], None, &mut env);
        assert!(matches!(
            outcome,
            Outcome::Failure {
                kind: ErrorKind::SourceUnavailable,
                ..
            }
        ));
        assert!(outcome.render().contains("nonexistent.txt"));
    }

    #[test]
    fn test_grep_invalid_pattern() {
        let mut env = Environment::with_dir("/");
        let outcome = run::<Grep>(&["grep", "[invalid"], Some("x"), &mut env);
        assert!(outcome.render().starts_with("ERROR: grep: invalid pattern"));
    }

    #[test]
    fn test_grep_too_many_operands() {
        let mut env = Environment::with_dir("/");
        let outcome = run::<Grep>(&["grep", "x", "a", "b"], Some("x"), &mut env);
        assert!(outcome.render().starts_with("ERR: grep: unexpected argument: b"));
    }
}
