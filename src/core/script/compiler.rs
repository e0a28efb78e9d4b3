// src/core/script/compiler.rs

use std::collections::HashMap;

use crate::core::errors::{ErrorKind, Errors, RunError};
use crate::core::script::scanner::{Scanner, Token, TokenKind};
use crate::models::{Location, Variable, VariableValue};

/// Expands one script template against the bound variables.
///
/// Untouched runs are copied through, `%{…}` sequences are resolved:
/// strings emit their inner text, string variables their value, boolean
/// variables select the following sequence (with an optional `or`
/// alternative). Diagnostics carry the script's configuration-file
/// location shifted by the token column.
pub struct Compiler<'src, 'err> {
    scanner: Scanner<'src>,
    location: &'src Location,
    variables: &'src HashMap<String, Variable>,
    current: Token<'src>,
    previous: Token<'src>,
    panic_mode: bool,
    script: String,
    errors: &'err mut Errors,
}

impl<'src, 'err> Compiler<'src, 'err> {
    pub fn compile(
        source: &'src str,
        location: &'src Location,
        variables: &'src HashMap<String, Variable>,
        errors: &'err mut Errors,
    ) -> String {
        let mut compiler = Self {
            scanner: Scanner::new(source),
            location,
            variables,
            current: Token::default(),
            previous: Token::default(),
            panic_mode: false,
            script: String::new(),
            errors,
        };

        compiler.advance();
        compiler.source_text();
        compiler.end_of_script();
        compiler.script
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

    fn source_text(&mut self) {
        self.advance();

        match self.previous.kind {
            TokenKind::Untouched => {
                self.untouched();
                self.source_text();
            }
            TokenKind::StartSeq => self.sequence(),
            _ => {}
        }
    }

    fn untouched(&mut self) {
        self.script.push_str(self.previous.lexeme);
    }

    fn sequence(&mut self) {
        self.advance();

        match self.previous.kind {
            TokenKind::String => self.string_literal(),
            TokenKind::Identifier => self.identifier(),
            _ => self.error("Unexpected character."),
        }

        self.end_of_sequence();
        self.source_text();
    }

    fn identifier(&mut self) {
        let name = self.previous.lexeme;

        let Some(variable) = self.variables.get(name) else {
            self.error("Undefined parameter.");
            return;
        };

        match variable.value.clone() {
            VariableValue::String(value) => self.script.push_str(&value),
            VariableValue::Boolean(value) => self.statement(value),
        }
    }

    fn statement(&mut self, condition: bool) {
        self.advance();

        if self.peek(TokenKind::Or) {
            self.or_statement(condition);
        } else {
            self.if_statement(condition);
        }
    }

    fn or_statement(&mut self, condition: bool) {
        if condition {
            self.expression();
            self.consume(TokenKind::Or, "Expected `or` after expression.");
            // Skip the alternative.
            self.advance();
        } else {
            // Skip over the selected branch.
            while !self.peek(TokenKind::Or) && !self.peek(TokenKind::Eos) {
                self.advance();
            }

            self.consume(TokenKind::Or, "Expected `or` after expression.");
            self.advance();
            self.expression();
        }
    }

    fn if_statement(&mut self, condition: bool) {
        if condition {
            self.expression();
        }
    }

    fn expression(&mut self) {
        match self.previous.kind {
            TokenKind::String => self.string_literal(),
            TokenKind::Identifier => self.identifier(),
            _ => {}
        }
    }

    fn string_literal(&mut self) {
        let lexeme = self.previous.lexeme;
        self.script.push_str(&lexeme[1..lexeme.len() - 1]);
    }

    fn end_of_sequence(&mut self) {
        if self.consume(TokenKind::EndSeq, "Expected `}`.") {
            // Synchronization point: one sequence ends here.
            self.panic_mode = false;
        }
    }

    fn end_of_script(&mut self) {
        self.consume(TokenKind::Eos, "Expected end.");
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
            ErrorKind::ScriptParse,
            out,
            Location::new(
                self.location.line,
                self.location.column + token.column,
                self.location.line_text.clone(),
            ),
        ));
    }
}

/// Walks a script template and records, in order of first appearance,
/// every identifier the compiler would try to resolve — both branches of
/// an `or` clause included. Produces no output and no diagnostics; used
/// to discover which parameters a command depends on.
pub fn collect_references(source: &str) -> Vec<String> {
    let mut scanner = Scanner::new(source);
    let mut names: Vec<String> = Vec::new();

    loop {
        let token = scanner.scan_token();
        match token.kind {
            TokenKind::Identifier => {
                if !names.iter().any(|name| name == token.lexeme) {
                    names.push(token.lexeme.to_string());
                }
            }
            TokenKind::Eos => break,
            _ => {}
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Variable;

    fn compile(source: &str, variables: &[Variable]) -> (String, Vec<RunError>) {
        let map: HashMap<String, Variable> = variables
            .iter()
            .map(|v| (v.name.clone(), v.clone()))
            .collect();
        let location = Location::new(1, 1, format!("script = \"{source}\""));
        let mut errors = Errors::new();
        let script = Compiler::compile(source, &location, &map, &mut errors);
        (script, errors.iter().cloned().collect())
    }

    #[test]
    fn plain_text_passes_through() {
        let (script, errors) = compile("echo hi", &[]);
        assert!(errors.is_empty());
        assert_eq!(script, "echo hi");
    }

    #[test]
    fn single_string_sequence() {
        let (script, errors) = compile("echo '%{'Hello'}'", &[]);
        assert!(errors.is_empty());
        assert_eq!(script, "echo 'Hello'");
    }

    #[test]
    fn single_string_in_the_middle() {
        let (script, errors) = compile("echo '%{'Hello'}' and more", &[]);
        assert!(errors.is_empty());
        assert_eq!(script, "echo 'Hello' and more");
    }

    #[test]
    fn string_variable_substitution() {
        let (script, errors) = compile("echo '%{target}'", &[Variable::string("target", "Hello")]);
        assert!(errors.is_empty());
        assert_eq!(script, "echo 'Hello'");
    }

    #[test]
    fn true_boolean_emits_sequence() {
        let (script, errors) = compile("echo %{target 'Hello'}", &[Variable::boolean("target", true)]);
        assert!(errors.is_empty());
        assert_eq!(script, "echo Hello");
    }

    #[test]
    fn false_boolean_emits_nothing() {
        let (script, errors) =
            compile("echo %{target 'Hello'}", &[Variable::boolean("target", false)]);
        assert!(errors.is_empty());
        assert_eq!(script, "echo ");
    }

    #[test]
    fn boolean_selects_second_variable() {
        let variables = [
            Variable::boolean("target", true),
            Variable::string("value", "Hello"),
        ];
        let (script, errors) = compile("echo '%{target value}'", &variables);
        assert!(errors.is_empty());
        assert_eq!(script, "echo 'Hello'");
    }

    #[test]
    fn false_boolean_skips_second_variable() {
        let variables = [
            Variable::boolean("target", false),
            Variable::string("value", "Hello"),
        ];
        let (script, errors) = compile("echo '%{target value}'", &variables);
        assert!(errors.is_empty());
        assert_eq!(script, "echo ''");
    }

    #[test]
    fn or_clause_picks_the_true_branch() {
        let (script, errors) = compile(
            "run %{nolog '--quiet' or '--verbose'}",
            &[Variable::boolean("nolog", true)],
        );
        assert!(errors.is_empty());
        assert_eq!(script, "run --quiet");
    }

    #[test]
    fn or_clause_picks_the_false_branch() {
        let (script, errors) = compile(
            "run %{nolog '--quiet' or '--verbose'}",
            &[Variable::boolean("nolog", false)],
        );
        assert!(errors.is_empty());
        assert_eq!(script, "run --verbose");
    }

    #[test]
    fn escaped_sequence_stays_verbatim() {
        let (script, errors) = compile(r"echo \%{target}", &[]);
        assert!(errors.is_empty());
        assert_eq!(script, r"echo \%{target}");
    }

    #[test]
    fn undefined_parameter_reports_its_column() {
        let (_, errors) = compile("echo %{x}", &[]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Cannot parse at `x`: Undefined parameter.");
        assert_eq!(errors[0].kind, ErrorKind::ScriptParse);

        // Token column 8 inside the script, shifted by the line column.
        let location = errors[0].location.as_ref().expect("location");
        assert_eq!(location.column, 9);
    }

    #[test]
    fn stray_or_is_rejected() {
        let (_, errors) = compile("echo %{or}", &[]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Cannot parse at `or`: Unexpected character.");
    }

    #[test]
    fn bare_parens_are_rejected() {
        let (_, errors) = compile("echo %{(}", &[]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Cannot parse at `(`: Unexpected character.");
    }

    #[test]
    fn nested_boolean_in_or_clause_misses_closing_brace() {
        let variables = [
            Variable::boolean("a", true),
            Variable::boolean("b", true),
        ];
        let (_, errors) = compile("%{a b 'x' or 'y'}", &variables);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Expected `}`."), "got {:?}", errors[0].message);
    }

    #[test]
    fn multi_token_sequence_misses_closing_brace() {
        let (_, errors) = compile("echo %{'a' 'b'}", &[]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Expected `}`."));
    }

    #[test]
    fn collects_references_in_order_of_first_appearance() {
        let names = collect_references("a %{x} b %{y} c %{x}");
        assert_eq!(names, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn collects_both_branches_of_an_or_clause() {
        let names = collect_references("%{nolog quiet or loud}");
        assert_eq!(
            names,
            vec!["nolog".to_string(), "quiet".to_string(), "loud".to_string()]
        );
    }

    #[test]
    fn collection_is_idempotent() {
        let source = "run %{nolog '--quiet' or '--verbose'} %{target}";
        assert_eq!(collect_references(source), collect_references(source));
        assert_eq!(
            collect_references(source),
            vec!["nolog".to_string(), "target".to_string()]
        );
    }
}
