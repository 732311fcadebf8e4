//! Declaration parsing implementation
//!
//! This module handles the program skeleton and everything that declares a name:
//!
//! - Program: `BEGIN` globals, main statements, `END`, then methods
//! - Variable declarations: `int x;`, `int[][] grid;`
//! - Method definitions: `FUN int f(int a) { ... }` and `PROC p() { ... }`
//! - Types: `int` followed by any number of `[]`
//!
//! # Grammar
//!
//! ```text
//! program   ::= "BEGIN" var_decl* stm* "END" method*
//! var_decl  ::= type identifier ";"
//! method    ::= "FUN" type identifier "(" formals ")" method_body
//!             | "PROC" identifier "(" formals ")" method_body
//! method_body ::= "{" var_decl* stm* "}"
//! formals   ::= ( type identifier ( "," type identifier )* )?
//! type      ::= "int" ( "[" "]" )*
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse `BEGIN ... END` followed by the method definitions
    pub(crate) fn parse_program_body(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        self.expect(TokenKind::Begin)?;
        program.globals = self.parse_var_decls()?;
        program.body = self.parse_statements_until(TokenKind::End, true)?;
        self.expect(TokenKind::End)?;

        while matches!(self.peek_kind(), TokenKind::Fun | TokenKind::Proc) {
            program.methods.push(self.parse_method_definition()?);
        }

        Ok(program)
    }

    /// Parse consecutive variable declarations (globals or method locals)
    fn parse_var_decls(&mut self) -> Result<Vec<VarDecl>, ParseError> {
        let mut decls = Vec::new();
        while self.check(TokenKind::Int) {
            let location = self.current_location();
            let var_type = self.parse_type()?;
            let name = self.expect_identifier()?;
            self.expect(TokenKind::Semicolon)?;
            decls.push(VarDecl {
                name,
                var_type,
                location,
            });
        }
        Ok(decls)
    }

    /// Parse type: `int` followed by zero or more `[]`
    pub(crate) fn parse_type(&mut self) -> Result<VarType, ParseError> {
        self.expect(TokenKind::Int)?;

        let mut var_type = VarType::Int;
        while self.match_token(TokenKind::LBracket) {
            self.expect(TokenKind::RBracket)?;
            var_type = var_type.with_array();
        }
        Ok(var_type)
    }

    /// Parse `FUN type name(...) {...}` or `PROC name(...) {...}`
    fn parse_method_definition(&mut self) -> Result<MethodDecl, ParseError> {
        let location = self.current_location();

        let return_type = if self.match_token(TokenKind::Fun) {
            Some(self.parse_type()?)
        } else if self.match_token(TokenKind::Proc) {
            None
        } else {
            return Err(self.unexpected(&[TokenKind::Fun, TokenKind::Proc]));
        };

        let name = self.expect_identifier()?;

        self.expect(TokenKind::LParen)?;
        let params = self.parse_formals()?;
        self.expect(TokenKind::RParen)?;

        self.expect(TokenKind::LBrace)?;
        let locals = self.parse_var_decls()?;
        let body = self.parse_statements_until(TokenKind::RBrace, true)?;
        self.expect(TokenKind::RBrace)?;

        Ok(MethodDecl {
            name,
            return_type,
            params,
            locals,
            body,
            location,
        })
    }

    /// Parse formal parameter list (without the parentheses)
    fn parse_formals(&mut self) -> Result<Vec<VarDecl>, ParseError> {
        let mut params = Vec::new();

        if !self.check(TokenKind::Int) {
            return Ok(params);
        }

        loop {
            let location = self.current_location();
            let var_type = self.parse_type()?;
            let name = self.expect_identifier()?;
            params.push(VarDecl {
                name,
                var_type,
                location,
            });

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }
}
