//! Statement parsing implementation
//!
//! This module handles parsing of all LPL statement types:
//!
//! - Assignments: `x = e;`, `a[i][j] = e;`
//! - Procedure calls: `p(e1, e2);`
//! - Control flow: `IF`, `WHILE`, `SWITCH`
//! - Output: `PRINT`, `PRINTLN`, `PRINTCH`, `NEWLINE`
//! - `RETURN` with or without a value
//! - Blocks: `{ ... }`
//!
//! # Grammar
//!
//! ```text
//! stm ::= identifier "(" actuals ")" ";"
//!       | identifier ( "[" exp "]" )* "=" exp ";"
//!       | "IF" "(" exp ")" stm ( "ELSE" stm )?
//!       | "WHILE" "(" exp ")" stm
//!       | "SWITCH" "(" exp ")" "{" ( "CASE" signed_int ":" stm )* "DEFAULT" ":" stm "}"
//!       | "{" stm* "}"
//!       | "PRINT" exp ";" | "PRINTLN" exp ";" | "PRINTCH" exp ";" | "NEWLINE" ";"
//!       | "RETURN" exp? ";"
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

/// Token kinds that can start a statement, reported on a syntax error
const STATEMENT_START: &[TokenKind] = &[
    TokenKind::Ident,
    TokenKind::If,
    TokenKind::While,
    TokenKind::Switch,
    TokenKind::LBrace,
    TokenKind::Print,
    TokenKind::Println,
    TokenKind::PrintChar,
    TokenKind::Newline,
    TokenKind::Return,
];

impl Parser {
    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();

        match self.peek_kind() {
            TokenKind::Ident => {
                let name = self.expect_identifier()?;
                self.parse_identifier_statement(name, location)
            }
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::LBrace => {
                self.advance();
                let statements = self.parse_statements_until(TokenKind::RBrace, false)?;
                self.expect(TokenKind::RBrace)?;
                Ok(Stmt::Block {
                    statements,
                    location,
                })
            }
            TokenKind::Print => self.parse_print_statement(PrintKind::Print),
            TokenKind::Println => self.parse_print_statement(PrintKind::Println),
            TokenKind::PrintChar => self.parse_print_statement(PrintKind::PrintChar),
            TokenKind::Newline => {
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Newline { location })
            }
            TokenKind::Return => self.parse_return_statement(),
            _ => Err(self.unexpected(STATEMENT_START)),
        }
    }

    /// Statements up to, not including, `terminator`.
    ///
    /// A syntax error at a statement position also lists the terminator, and
    /// `int` when `declarations_open` and no statement has been parsed yet,
    /// since a declaration could still have appeared there.
    pub(crate) fn parse_statements_until(
        &mut self,
        terminator: TokenKind,
        declarations_open: bool,
    ) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(terminator) {
            if !STATEMENT_START.contains(&self.peek_kind()) {
                let mut expected = STATEMENT_START.to_vec();
                expected.push(terminator);
                if declarations_open && statements.is_empty() {
                    expected.push(TokenKind::Int);
                }
                return Err(self.unexpected(&expected));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    /// After a leading identifier: a procedure call or a (possibly indexed) assignment
    fn parse_identifier_statement(
        &mut self,
        name: String,
        location: SourceLocation,
    ) -> Result<Stmt, ParseError> {
        if self.match_token(TokenKind::LParen) {
            let args = self.parse_actuals()?;
            self.expect(TokenKind::RParen)?;
            self.expect(TokenKind::Semicolon)?;
            return Ok(Stmt::Call {
                name,
                args,
                location,
            });
        }

        let indices = self.parse_indexers()?;
        if !self.match_token(TokenKind::Assign) {
            let expected: &[TokenKind] = if indices.is_empty() {
                &[TokenKind::LParen, TokenKind::LBracket, TokenKind::Assign]
            } else {
                &[TokenKind::LBracket, TokenKind::Assign]
            };
            return Err(self.unexpected(expected));
        }
        let value = self.parse_expression()?;
        self.expect(TokenKind::Semicolon)?;

        if indices.is_empty() {
            Ok(Stmt::Assign {
                name,
                value,
                location,
            })
        } else {
            Ok(Stmt::ArrayAssign {
                name,
                indices,
                value,
                location,
            })
        }
    }

    /// Parse `( "[" exp "]" )*`
    pub(crate) fn parse_indexers(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut indices = Vec::new();
        while self.match_token(TokenKind::LBracket) {
            indices.push(self.parse_expression()?);
            self.expect(TokenKind::RBracket)?;
        }
        Ok(indices)
    }

    /// Parse if statement; a dangling ELSE binds to the nearest IF
    fn parse_if_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.expect(TokenKind::If)?.location;

        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_token(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            location,
        })
    }

    /// Parse while statement
    fn parse_while_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.expect(TokenKind::While)?.location;

        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::While {
            condition,
            body,
            location,
        })
    }

    /// Parse switch statement; the DEFAULT arm is mandatory and comes last
    fn parse_switch_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.expect(TokenKind::Switch)?.location;

        self.expect(TokenKind::LParen)?;
        let subject = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;

        let mut cases = Vec::new();
        while !self.check(TokenKind::Default) {
            let case_location = self.current_location();
            if !self.match_token(TokenKind::Case) {
                return Err(self.unexpected(&[TokenKind::Case, TokenKind::Default]));
            }
            let value = self.parse_signed_int()?;
            self.expect(TokenKind::Colon)?;
            let body = self.parse_statement()?;
            cases.push(SwitchCase {
                value,
                body,
                location: case_location,
            });
        }

        self.expect(TokenKind::Default)?;
        self.expect(TokenKind::Colon)?;
        let default = Box::new(self.parse_statement()?);
        self.expect(TokenKind::RBrace)?;

        Ok(Stmt::Switch {
            subject,
            cases,
            default,
            location,
        })
    }

    fn parse_print_statement(&mut self, kind: PrintKind) -> Result<Stmt, ParseError> {
        let location = self.advance().location;
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Print {
            kind,
            expr,
            location,
        })
    }

    /// Parse return statement
    fn parse_return_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.expect(TokenKind::Return)?.location;

        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::Return { value, location })
    }
}
