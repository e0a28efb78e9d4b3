// src/core/scanner.rs

/// Token kinds of the invocation language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Comma,
    Equal,
    Command,
    ShortParameter,
    LongParameter,
    String,
    Number,
    Error,
    Eos,
}

/// A scanned token. For `Error` tokens `lexeme` holds the message instead
/// of source text. `column` is the 1-based byte offset of the token start
/// inside the invocation string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
    pub column: u32,
}

impl Default for Token<'_> {
    fn default() -> Self {
        Self {
            kind: TokenKind::Eos,
            lexeme: "",
            column: 1,
        }
    }
}

/// Tokenizer for the invocation string. Produces one `Error` token per
/// lexical problem and keeps scanning, so the parser decides how much to
/// report.
pub struct Scanner<'src> {
    source: &'src str,
    start: usize,
    current: usize,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
        }
    }

    pub fn scan_token(&mut self) -> Token<'src> {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eos);
        }

        let c = self.advance();

        if c.is_ascii_digit() {
            return self.number();
        }
        if is_alpha(c) {
            return self.command();
        }

        match c {
            b',' => self.make_token(TokenKind::Comma),
            b'=' => self.make_token(TokenKind::Equal),
            b'-' => {
                if self.matches(b'-') {
                    self.long_parameter()
                } else {
                    self.short_parameter()
                }
            }
            b'"' => self.string(),
            _ => self.error_token("Unexpected character."),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\r' | b'\t' => {
                    self.current += 1;
                }
                _ => return,
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.current).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.source.as_bytes().get(self.current + 1).copied()
    }

    fn advance(&mut self) -> u8 {
        let c = self.source.as_bytes()[self.current];
        self.current += 1;
        c
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            return true;
        }
        false
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn make_token(&self, kind: TokenKind) -> Token<'src> {
        Token {
            kind,
            lexeme: &self.source[self.start..self.current],
            column: self.start as u32 + 1,
        }
    }

    fn error_token(&self, message: &'static str) -> Token<'src> {
        Token {
            kind: TokenKind::Error,
            lexeme: message,
            column: self.start as u32 + 1,
        }
    }

    fn string(&mut self) -> Token<'src> {
        while let Some(c) = self.peek() {
            if c == b'"' {
                break;
            }
            self.current += 1;
        }

        if self.is_at_end() {
            return self.error_token("Unterminated string.");
        }

        // The closing quote.
        self.current += 1;
        self.make_token(TokenKind::String)
    }

    fn number(&mut self) -> Token<'src> {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.current += 1;
        }

        // Look for a fractional part.
        if self.peek() == Some(b'.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            // Consume the ".".
            self.current += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.current += 1;
            }
        }

        self.make_token(TokenKind::Number)
    }

    fn command(&mut self) -> Token<'src> {
        while self.peek().is_some_and(|c| is_alpha(c) || c.is_ascii_digit()) {
            self.current += 1;
        }

        self.make_token(TokenKind::Command)
    }

    fn long_parameter(&mut self) -> Token<'src> {
        let mut has_error = false;

        match self.peek() {
            Some(c) if !c.is_ascii_alphabetic() => {
                self.current += 1;
                has_error = true;
            }
            None => has_error = true,
            _ => {}
        }

        while self.peek().is_some_and(|c| is_alpha(c) || c.is_ascii_digit()) {
            self.current += 1;
        }

        if has_error {
            return self.error_token("A parameter can only start with the characters A-Za-z.");
        }

        self.make_token(TokenKind::LongParameter)
    }

    fn short_parameter(&mut self) -> Token<'src> {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.current += 1;
            }
            Some(_) => {
                self.current += 1;
                return self.error_token("A short parameter can only be A-Za-z as name.");
            }
            None => {
                return self.error_token("A short parameter can only be A-Za-z as name.");
            }
        }

        let mut length = 1;
        while self.peek().is_some_and(is_alpha) {
            self.current += 1;
            length += 1;
        }

        if length > 1 {
            return self.error_token("A short parameter can only contain one character (A-Za-z).");
        }

        self.make_token(TokenKind::ShortParameter)
    }
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}
