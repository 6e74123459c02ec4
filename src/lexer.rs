//! A module implementing lexical analysis (tokenization) of a command line.

/// How a word was delimited in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteKind {
    /// A plain run of non-whitespace characters.
    None,
    /// A run enclosed in `'...'`.
    Single,
    /// A run enclosed in `"..."`.
    Double,
}

/// A word of the command line with its surrounding quotes already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub value: String,
    pub quote: QuoteKind,
}

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A command name or argument.
    Word(Word),
    /// The pipe operator, `|`.
    Pipe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Normal,
    InSingleQuote,
    InDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    /// Whether `buffer` holds a word in progress (it may legitimately be empty, e.g. `""`).
    in_word: bool,
    buffer: String,
    out: Vec<Token>,
    /// For every character consumed so far, whether it was read inside quotes.
    quoted: Vec<bool>,
}

impl LexingFSM {
    /// Creates a new instance of the lexical analysis Finite State Machine.
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Normal,
            in_word: false,
            buffer: String::new(),
            out: Vec::new(),
            quoted: Vec::new(),
        }
    }

    /// Runs the machine over the whole input.
    ///
    /// Quotes open a quoted word only at the start of a word; in the middle of
    /// an unquoted word they are ordinary characters. A closing quote always
    /// ends its word. An unterminated quote extends to the end of the line.
    fn run(&mut self) {
        while let Some(ch) = self.read_char() {
            self.quoted.push(self.state != LexingState::Normal);
            match self.state {
                LexingState::Normal => self.handle_normal(ch),
                LexingState::InSingleQuote => self.handle_quoted(ch, '\'', QuoteKind::Single),
                LexingState::InDoubleQuote => self.handle_quoted(ch, '"', QuoteKind::Double),
            }
        }

        // If something remains
        match self.state {
            LexingState::InSingleQuote => self.finish_word(QuoteKind::Single),
            LexingState::InDoubleQuote => self.finish_word(QuoteKind::Double),
            LexingState::Normal => self.finish_word(QuoteKind::None),
        }
    }

    fn make_tokens(mut self) -> Vec<Token> {
        self.run();
        self.out
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_normal(&mut self, ch: char) {
        match ch {
            c if c.is_whitespace() => self.finish_word(QuoteKind::None),
            '|' => {
                self.finish_word(QuoteKind::None);
                self.out.push(Token::Pipe);
            }
            '\'' if !self.in_word => {
                self.in_word = true;
                self.state = LexingState::InSingleQuote;
            }
            '"' if !self.in_word => {
                self.in_word = true;
                self.state = LexingState::InDoubleQuote;
            }
            c => {
                self.in_word = true;
                self.buffer.push(c);
            }
        }
    }

    fn handle_quoted(&mut self, ch: char, closing: char, kind: QuoteKind) {
        if ch == closing {
            self.finish_word(kind);
            self.state = LexingState::Normal;
        } else {
            self.buffer.push(ch);
        }
    }

    fn finish_word(&mut self, quote: QuoteKind) {
        if self.in_word {
            self.out.push(Token::Word(Word {
                value: std::mem::take(&mut self.buffer),
                quote,
            }));
            self.in_word = false;
        }
    }
}

/// The main entry point function to perform lexical analysis.
///
/// Never fails: malformed quoting is resolved by the rules of the state machine.
pub fn split_into_tokens(line: &str) -> Vec<Token> {
    LexingFSM::new(line).make_tokens()
}

/// For each character of `line`, whether it lies inside a quoted word.
///
/// Uses the same rules as [`split_into_tokens`]; quote characters themselves
/// count as quoted only when they close a word.
pub(crate) fn quoted_chars(line: &str) -> Vec<bool> {
    let mut fsm = LexingFSM::new(line);
    fsm.run();
    fsm.quoted
}
