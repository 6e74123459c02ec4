//! Line-oriented pattern search with trailing context.

use crate::error::ShellError;
use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::PathBuf;

/// Everything a search needs besides the text itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOptions {
    pub pattern: Option<String>,
    /// Match only whole words (Unicode word boundaries on both sides).
    pub whole_word: bool,
    pub ignore_case: bool,
    /// Number of lines printed after each matching line.
    pub after_context: usize,
    /// Treat the pattern as plain text. Takes precedence over `whole_word`.
    pub literal_match: bool,
    /// File read when no input is piped in.
    pub file_name: Option<PathBuf>,
}

impl MatchOptions {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// The regular expression actually compiled for this search.
    fn effective_pattern(&self, pattern: &str) -> String {
        if self.literal_match {
            regex::escape(pattern)
        } else if self.whole_word {
            format!(r"\b(?:{pattern})\b")
        } else {
            pattern.to_string()
        }
    }

    fn compile(&self, pattern: &str) -> Result<Regex, ShellError> {
        let re = RegexBuilder::new(&self.effective_pattern(pattern))
            .case_insensitive(self.ignore_case)
            .unicode(true)
            .build()?;
        Ok(re)
    }
}

/// Search `input`, or the file named in `options` when there is no input.
///
/// Returns the matching lines, and up to `after_context` lines following each
/// match, every one terminated by `\n`. A line is never printed twice, even
/// when context windows overlap. No match gives an empty string.
pub fn search(options: &MatchOptions, input: Option<&str>) -> Result<String, ShellError> {
    let pattern = options
        .pattern
        .as_deref()
        .ok_or(ShellError::MissingPattern)?;

    let content = match (input, &options.file_name) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => {
            let bytes = fs::read(path).map_err(|cause| ShellError::SourceUnavailable {
                path: path.clone(),
                cause,
            })?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
        (None, None) => return Err(ShellError::MissingSource),
    };

    let re = options.compile(pattern)?;
    tracing::trace!(pattern = re.as_str(), "compiled search pattern");

    let mut out = String::new();
    for line in select_lines(&re, split_lines(&content), options.after_context) {
        out.push_str(line);
        out.push('\n');
    }
    Ok(out)
}

/// Lines of `content`, split on `\n`. A final newline does not start a new line.
fn split_lines(content: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = content.split('\n').collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

fn select_lines<'a>(re: &Regex, lines: Vec<&'a str>, after_context: usize) -> Vec<&'a str> {
    let mut selected = Vec::new();
    let mut pending_context = 0;
    let mut last_emitted: Option<usize> = None;
    let is_new = |index: usize, last: Option<usize>| last.is_none_or(|last| index > last);

    for (index, line) in lines.into_iter().enumerate() {
        if re.is_match(line) {
            if is_new(index, last_emitted) {
                selected.push(line);
                last_emitted = Some(index);
            }
            pending_context = after_context;
        } else if pending_context > 0 && is_new(index, last_emitted) {
            selected.push(line);
            last_emitted = Some(index);
            pending_context -= 1;
        }
    }
    selected
}
