use crate::command::Command;
use crate::env::Environment;
use crate::lexer::{self, QuoteKind, Token, Word};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z0-9_]+)").expect("variable pattern is valid"));

/// Options of `grep` that consume the following word as their value.
const GREP_OPTIONS_WITH_VALUE: &[&str] = &["-A", "--after-context"];

/// Replace every `$NAME` in `line` with the value of `NAME`.
///
/// Unset variables expand to an empty string. When such a reference is an
/// unquoted word on its own it becomes `""`, so the command still receives an
/// (empty) argument in its place. The whole line is expanded before it is
/// split, so a value containing `|` adds pipeline stages.
pub fn substitute_variables(line: &str, env: &Environment) -> String {
    let quoted = lexer::quoted_chars(line);
    VARIABLE
        .replace_all(line, |caps: &Captures<'_>| match env.lookup(&caps[1]) {
            Some(value) => value.to_string(),
            None => {
                let whole = caps.get(0).map_or(0..0, |m| m.range());
                let in_quotes = quoted
                    .get(line[..whole.start].chars().count())
                    .copied()
                    .unwrap_or(false);
                let before = line[..whole.start].chars().next_back();
                let after = line[whole.end..].chars().next();
                if !in_quotes && is_word_boundary(before) && is_word_boundary(after) {
                    "\"\"".to_string()
                } else {
                    String::new()
                }
            }
        })
        .into_owned()
}

fn is_word_boundary(ch: Option<char>) -> bool {
    ch.is_none_or(|c| c.is_whitespace() || c == '|')
}

/// Turn a line of input into the commands of a pipeline, in order.
///
/// Empty or blank lines give an empty pipeline. Parsing never fails.
pub fn parse(line: &str, env: &Environment) -> Vec<Command> {
    if line.trim().is_empty() {
        return Vec::new();
    }

    let resolved = substitute_variables(line, env);
    tracing::trace!(line, resolved = %resolved, "variables substituted");

    let tokens = lexer::split_into_tokens(&resolved);
    let commands: Vec<Command> = tokens
        .split(|token| *token == Token::Pipe)
        .filter_map(build_command)
        .collect();

    tracing::debug!(stages = commands.len(), "parsed line");
    commands
}

fn build_command(segment: &[Token]) -> Option<Command> {
    let mut words = segment.iter().filter_map(|token| match token {
        Token::Word(word) => Some(word),
        Token::Pipe => None,
    });
    let name = words.next()?;
    let rest: Vec<&Word> = words.collect();

    let mut command = Command::new(
        name.value.clone(),
        rest.iter().map(|word| word.value.clone()).collect(),
    );
    if name.value == "grep" {
        let literal = grep_pattern(&rest).is_some_and(|word| word.quote == QuoteKind::Single);
        command.set_literal_match(literal);
    }
    Some(command)
}

/// The word holding the pattern of a `grep` invocation: the first argument
/// that is neither an option nor the value of an option.
fn grep_pattern<'a>(args: &[&'a Word]) -> Option<&'a Word> {
    let mut iter = args.iter().copied();
    while let Some(word) = iter.next() {
        let is_option = word.quote == QuoteKind::None
            && word.value.starts_with('-')
            && word.value.len() > 1;
        if !is_option {
            return Some(word);
        }
        if GREP_OPTIONS_WITH_VALUE.contains(&word.value.as_str()) {
            iter.next();
        }
    }
    None
}
