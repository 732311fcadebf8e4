//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including the error type, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser is a recursive descent parser with one routine per grammar
//! production, organised as:
//! - This module: Parser struct, lookahead helpers, and coordination
//! - `declarations`: program skeleton, variable and method declarations, types
//! - `statements`: statements (assignment, `IF`, `WHILE`, `SWITCH`, ...)
//! - `expressions`: simple expressions and the single trailing operator clause
//!
//! Parser methods are split across these files using `impl Parser` blocks.
//! The only state is the position in the token stream; the first unexpected
//! token aborts the parse.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token, TokenKind};
use std::fmt;

/// Parser error type
///
/// Syntax errors carry the offending token and the token kinds that would have
/// been accepted in its place. Errors raised by the lexer have neither.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
    pub found: Option<Token>,
    pub expected: Vec<TokenKind>,
}

impl ParseError {
    /// A syntax error at `found`, listing the acceptable token kinds.
    pub fn unexpected(found: &Token, expected: &[TokenKind]) -> Self {
        let alternatives = expected
            .iter()
            .map(|kind| kind.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let message = match expected.len() {
            0 => format!("Unexpected {}", found),
            1 => format!("Expected {}, found {}", alternatives, found),
            _ => format!("Expected one of {}, found {}", alternatives, found),
        };
        ParseError {
            message,
            location: found.location,
            found: Some(found.clone()),
            expected: expected.to_vec(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
            found: None,
            expected: Vec::new(),
        }
    }
}

/// Recursive descent parser for LPL
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
}

impl Parser {
    /// Tokenize `source` and prepare to parse it.
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self::from_tokens(tokens))
    }

    /// Parse an already tokenized stream. An `Eof` token is appended if the
    /// stream does not end with one.
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let location = tokens.last().map(|t| t.location).unwrap_or_default();
            tokens.push(Token::eof(location));
        }
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parse the entire program. Trailing input after the last method is an error.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let program = self.parse_program_body()?;
        if !self.check(TokenKind::Eof) {
            return Err(self.unexpected(&[TokenKind::Fun, TokenKind::Proc, TokenKind::Eof]));
        }

        tracing::debug!(
            globals = program.globals.len(),
            statements = program.body.len(),
            methods = program.methods.len(),
            "parsed program"
        );

        Ok(program)
    }

    // ===== Helper methods =====

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.tokens[self.position].clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    /// Consume a token of the given kind or fail with a syntax error.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&[kind]))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        Ok(self.expect(TokenKind::Ident)?.lexeme)
    }

    /// Syntax error at the current token.
    pub(crate) fn unexpected(&self, expected: &[TokenKind]) -> ParseError {
        ParseError::unexpected(self.peek(), expected)
    }
}
