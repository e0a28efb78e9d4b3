// src/core/script/scanner.rs

/// Token kinds of the script template language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Single-character tokens.
    LeftParen,
    RightParen,
    Comma,

    // Literals.
    Untouched,
    Identifier,
    String,

    // Keywords.
    Or,

    StartSeq,
    EndSeq,
    Error,
    Eos,
}

/// A scanned template token. `column` is the 1-based byte offset of the
/// token start inside the script string; for `Error` tokens `lexeme`
/// holds the message.
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Pass source through verbatim until a `%{` sequence opens.
    Untouched,
    /// Inside `%{ … }`: whitespace-insensitive expression tokens.
    Expression,
}

/// Two-mode lexer for script templates. The mode stack switches on `%{`
/// and `}`; a backslash in front of `%` keeps the scanner in untouched
/// mode.
pub struct Scanner<'src> {
    source: &'src str,
    start: usize,
    current: usize,
    modes: Vec<Mode>,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            modes: vec![Mode::Untouched],
        }
    }

    pub fn scan_token(&mut self) -> Token<'src> {
        match self.modes.last().copied().unwrap_or(Mode::Untouched) {
            Mode::Untouched => self.scan_untouched_token(),
            Mode::Expression => self.scan_expression_token(),
        }
    }

    fn scan_untouched_token(&mut self) -> Token<'src> {
        self.start = self.current;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eos);
        }

        let c = self.advance();
        if c == b'%' && self.matches(b'{') {
            return self.start_sequence();
        }

        self.untouched()
    }

    fn scan_expression_token(&mut self) -> Token<'src> {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eos);
        }

        let c = self.advance();

        if is_alpha(c) {
            return self.identifier();
        }

        match c {
            b',' => self.make_token(TokenKind::Comma),
            b'(' => self.make_token(TokenKind::LeftParen),
            b')' => self.make_token(TokenKind::RightParen),
            b'}' => self.end_sequence(),
            b'\'' => self.string(),
            _ => self.error_token("Unexpected character."),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\r' | b'\t' | b'\n' => {
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

    fn previous_byte(&self) -> u8 {
        self.source.as_bytes()[self.current - 1]
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

    fn start_sequence(&mut self) -> Token<'src> {
        self.modes.push(Mode::Expression);
        self.make_token(TokenKind::StartSeq)
    }

    fn end_sequence(&mut self) -> Token<'src> {
        self.modes.pop();
        self.make_token(TokenKind::EndSeq)
    }

    fn untouched(&mut self) -> Token<'src> {
        while !self.is_at_end() {
            if self.peek() == Some(b'%')
                && self.peek_next() == Some(b'{')
                && self.previous_byte() != b'\\'
            {
                break;
            }
            self.current += 1;
        }

        self.make_token(TokenKind::Untouched)
    }

    fn string(&mut self) -> Token<'src> {
        while let Some(c) = self.peek() {
            if c == b'\'' {
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

    fn identifier(&mut self) -> Token<'src> {
        while self.peek().is_some_and(|c| is_alpha(c) || c.is_ascii_digit()) {
            self.current += 1;
        }

        let lexeme = &self.source[self.start..self.current];
        let kind = if lexeme == "or" {
            TokenKind::Or
        } else {
            TokenKind::Identifier
        };

        Token {
            kind,
            lexeme,
            column: self.start as u32 + 1,
        }
    }
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}
