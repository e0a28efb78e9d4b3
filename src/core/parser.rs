// src/core/parser.rs

use crate::core::errors::{ErrorKind, Errors, RunError};
use crate::core::instruction::{Instruction, OpCode};
use crate::core::scanner::{Scanner, Token, TokenKind};
use crate::models::Location;

/// Recursive-descent parser over the invocation token stream, emitting
/// bytecode for the interpreter. Parse problems go into the error sink
/// with panic-mode recovery: after the first error in a construct,
/// further reports are suppressed until the next top-level comma.
pub struct Parser<'src, 'err> {
    source: &'src str,
    scanner: Scanner<'src>,
    instruction: Instruction,
    current: Token<'src>,
    previous: Token<'src>,
    scope: Vec<String>,
    panic_mode: bool,
    errors: &'err mut Errors,
}

impl<'src, 'err> Parser<'src, 'err> {
    /// Compiles the invocation string into bytecode. Diagnostics land in
    /// `errors`; the returned instruction stream is only meaningful when
    /// the sink stayed clean.
    pub fn parse(source: &'src str, errors: &'err mut Errors) -> Instruction {
        let mut parser = Self {
            source,
            scanner: Scanner::new(source),
            instruction: Instruction::new(),
            current: Token::default(),
            previous: Token::default(),
            scope: Vec::new(),
            panic_mode: false,
            errors,
        };

        parser.advance();
        parser.arguments();
        parser.end_of_string();
        parser.instruction
    }

    fn advance(&mut self) {
        self.previous = self.current;

        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            self.error_at_current(self.current.lexeme);
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> bool {
        if self.current.kind == kind {
            self.advance();
            return true;
        }

        self.error_at_current(message);
        false
    }

    fn peek(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn arguments(&mut self) {
        self.advance();

        match self.previous.kind {
            TokenKind::Equal => {
                self.error("You are missing a parameter in front of the assignment.");
            }
            TokenKind::String | TokenKind::Number | TokenKind::Error => {
                self.error("This is not allowed here.");
            }
            TokenKind::Command => {
                self.commands();
                self.arguments();
            }
            TokenKind::ShortParameter | TokenKind::LongParameter => {
                self.parameters();
                self.arguments();
            }
            TokenKind::Comma => {
                self.comma();
                self.arguments();
            }
            _ => {}
        }
    }

    fn commands(&mut self) {
        self.emit_scope(self.previous.lexeme.to_string());
    }

    fn parameters(&mut self) {
        let name = self.previous.lexeme.trim_start_matches('-').to_string();
        self.emit_definition(name);

        if self.peek(TokenKind::Equal) {
            self.advance();
            if self.consume(TokenKind::String, "Value assignment missing.") {
                let value = self.previous.lexeme.trim_matches('"').to_string();
                self.emit_constant(value);
            }
        }
    }

    fn comma(&mut self) {
        if self.scope.is_empty() {
            self.error("Unexpected comma.");
            return;
        }

        if self.peek(TokenKind::Comma) {
            self.error_at_current("Duplicated comma.");
            return;
        }

        // Synchronization point: one invocation ends here.
        self.panic_mode = false;

        self.emit_execution();
        self.emit_clear();
    }

    fn end_of_string(&mut self) {
        if !self.scope.is_empty() {
            self.emit_execution();
        }

        self.consume(TokenKind::Eos, "Expected end.");
    }

    fn emit_definition(&mut self, name: String) {
        let index = self.instruction.write_constant(name);
        self.instruction.write(OpCode::Define);
        self.instruction.write_byte(index);
    }

    fn emit_constant(&mut self, value: String) {
        let index = self.instruction.write_constant(value);
        self.instruction.write(OpCode::Constant);
        self.instruction.write_byte(index);
    }

    fn emit_scope(&mut self, name: String) {
        self.scope.push(name.clone());
        let index = self.instruction.write_constant(name);
        self.instruction.write(OpCode::BeginScope);
        self.instruction.write_byte(index);
    }

    fn emit_execution(&mut self) {
        let path = self.scope.join(".");
        let index = self.instruction.write_constant(path);
        self.instruction.write(OpCode::Execute);
        self.instruction.write_byte(index);
    }

    fn emit_clear(&mut self) {
        self.instruction.write(OpCode::Clear);
        self.scope.pop();
    }

    fn error(&mut self, message: &str) {
        let token = self.previous;
        self.error_at(token, message);
    }

    fn error_at_current(&mut self, message: &str) {
        let token = self.current;
        self.error_at(token, message);
    }

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;

        let mut out = String::from("Cannot parse");
        match token.kind {
            TokenKind::Eos => out.push_str(" at end"),
            TokenKind::Error => {}
            _ => out.push_str(&format!(" at `{}`", token.lexeme)),
        }
        out.push_str(&format!(": {message}"));

        self.errors.push(RunError::located(
            ErrorKind::CliParse,
            out,
            Location::new(1, token.column, self.source.trim()),
        ));
    }
}
