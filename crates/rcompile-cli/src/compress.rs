//! Whitespace-only bundle compression.
//!
//! Indentation and trailing whitespace are stripped and blank lines dropped,
//! except where a line boundary falls inside a template literal or a
//! backslash-continued string. Line breaks are kept, so automatic semicolon
//! insertion and line comments behave as before.

/// Characters after which `/` starts a regular expression literal
const REGEX_PRECEDERS: &str = "(,=:[!&|?{};+-*%<>~^";

const REGEX_KEYWORDS: [&str; 13] = [
    "return",
    "typeof",
    "instanceof",
    "case",
    "do",
    "else",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "yield",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Quote(char),
    Template,
    LineComment,
    BlockComment,
    Regex { in_class: bool },
}

/// Tracks just enough JavaScript lexical state to tell whether a newline is
/// part of a literal.
#[derive(Debug)]
struct Lexer {
    state: State,
    escaped: bool,
    /// Open `${` substitutions, each with its count of unclosed `{`
    substitutions: Vec<usize>,
    last: Option<char>,
    word: String,
    in_word: bool,
}

impl Default for Lexer {
    fn default() -> Self {
        Self {
            state: State::Code,
            escaped: false,
            substitutions: Vec::new(),
            last: None,
            word: String::new(),
            in_word: false,
        }
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

impl Lexer {
    /// Whether the next line starts inside a literal.
    fn in_literal(&self) -> bool {
        match self.state {
            State::Template => true,
            State::Quote(_) => self.escaped,
            _ => false,
        }
    }

    fn scan_line(&mut self, line: &str) {
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            if self.escaped {
                self.escaped = false;
                continue;
            }

            match self.state {
                State::Code => match c {
                    '"' | '\'' => self.open(State::Quote(c)),
                    '`' => self.open(State::Template),
                    '/' if chars.peek() == Some(&'/') => {
                        chars.next();
                        self.state = State::LineComment;
                    }
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        self.state = State::BlockComment;
                    }
                    '/' if self.regex_allowed() => self.open(State::Regex { in_class: false }),
                    '{' => {
                        if let Some(depth) = self.substitutions.last_mut() {
                            *depth += 1;
                        }
                        self.mark(c);
                    }
                    '}' => match self.substitutions.last().copied() {
                        Some(0) => {
                            self.substitutions.pop();
                            self.state = State::Template;
                        }
                        Some(_) => {
                            if let Some(depth) = self.substitutions.last_mut() {
                                *depth -= 1;
                            }
                            self.mark(c);
                        }
                        None => self.mark(c),
                    },
                    c if c.is_whitespace() => self.in_word = false,
                    c => self.mark(c),
                },
                State::Quote(quote) => match c {
                    '\\' => self.escaped = true,
                    c if c == quote => self.close(),
                    _ => {}
                },
                State::Template => match c {
                    '\\' => self.escaped = true,
                    '`' => self.close(),
                    '$' if chars.peek() == Some(&'{') => {
                        chars.next();
                        self.substitutions.push(0);
                        self.state = State::Code;
                        self.last = Some('{');
                        self.in_word = false;
                    }
                    _ => {}
                },
                State::LineComment => {}
                State::BlockComment => {
                    if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        self.state = State::Code;
                    }
                }
                State::Regex { in_class } => match c {
                    '\\' => self.escaped = true,
                    '[' => self.state = State::Regex { in_class: true },
                    ']' if in_class => self.state = State::Regex { in_class: false },
                    '/' if !in_class => self.close(),
                    _ => {}
                },
            }
        }
    }

    fn end_line(&mut self) {
        self.in_word = false;
        if self.in_literal() {
            self.escaped = false;
            return;
        }
        self.escaped = false;
        if matches!(
            self.state,
            State::LineComment | State::Quote(_) | State::Regex { .. }
        ) {
            self.state = State::Code;
        }
    }

    fn regex_allowed(&self) -> bool {
        match self.last {
            None => true,
            Some(c) if is_identifier_char(c) => REGEX_KEYWORDS.contains(&self.word.as_str()),
            Some(c) => REGEX_PRECEDERS.contains(c),
        }
    }

    fn open(&mut self, state: State) {
        self.state = state;
        self.in_word = false;
    }

    /// A closed literal is a value, so a following `/` divides.
    fn close(&mut self) {
        self.state = State::Code;
        self.last = Some(')');
        self.in_word = false;
    }

    fn mark(&mut self, c: char) {
        if is_identifier_char(c) {
            if !self.in_word {
                self.word.clear();
            }
            self.word.push(c);
            self.in_word = true;
        } else {
            self.in_word = false;
        }
        self.last = Some(c);
    }
}

pub fn compress(code: &str) -> String {
    let mut lexer = Lexer::default();
    let mut out = String::with_capacity(code.len());

    for line in code.split('\n') {
        let starts_inside = lexer.in_literal();
        lexer.scan_line(line);
        let ends_inside = lexer.in_literal();
        lexer.end_line();

        let mut kept = line;
        if !starts_inside {
            kept = kept.trim_start();
        }
        if !ends_inside {
            kept = kept.trim_end();
        }
        if kept.is_empty() && !starts_inside && !ends_inside {
            continue;
        }

        out.push_str(kept);
        out.push('\n');
    }
    out
}
