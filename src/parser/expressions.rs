//! Expression parsing implementation
//!
//! LPL has no operator precedence. An expression is a simple expression
//! optionally followed by exactly one binary operator and a second simple
//! expression; anything longer must be parenthesised, so `(a + b) * c` parses
//! and `a + b * c` does not.
//!
//! # Grammar
//!
//! ```text
//! exp        ::= simple_exp ( op simple_exp )?
//! op         ::= "*" | "/" | "+" | "-" | "<" | "<=" | "==" | "&&" | "||"
//! simple_exp ::= identifier "(" actuals ")"
//!              | identifier ( "[" exp "]" )* ( "." "length" )?
//!              | signed_int | "-" simple_exp | "!" simple_exp
//!              | "new" "int" "[" exp "]" ( "[" exp "]" )* ( "[" "]" )*
//!              | "null" | "(" exp ")"
//! signed_int ::= "-"? integer_literal
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

/// Token kinds that can start a simple expression, reported on a syntax error
const EXPRESSION_START: &[TokenKind] = &[
    TokenKind::Ident,
    TokenKind::Minus,
    TokenKind::IntLiteral,
    TokenKind::New,
    TokenKind::Bang,
    TokenKind::Null,
    TokenKind::LParen,
];

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_simple_expression()?;
        self.parse_operator_clause(left)
    }

    /// At most one trailing `op simple_exp`
    fn parse_operator_clause(&mut self, left: Expr) -> Result<Expr, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Le => BinOp::Le,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::AndAnd => BinOp::And,
            TokenKind::OrOr => BinOp::Or,
            _ => return Ok(left),
        };
        let location = self.advance().location;
        let right = self.parse_simple_expression()?;

        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            location,
        })
    }

    fn parse_simple_expression(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();

        match self.peek_kind() {
            TokenKind::Ident => {
                let name = self.expect_identifier()?;
                self.parse_identifier_expression(name, location)
            }
            TokenKind::IntLiteral => Ok(Expr::IntLiteral(self.parse_signed_int()?, location)),
            TokenKind::Minus => {
                // A minus directly in front of a literal is part of the literal,
                // so `-2147483648` is representable.
                if self.tokens.get(self.position + 1).map(|t| t.kind)
                    == Some(TokenKind::IntLiteral)
                {
                    return Ok(Expr::IntLiteral(self.parse_signed_int()?, location));
                }
                self.advance();
                let operand = self.parse_simple_expression()?;
                Ok(Expr::Unary {
                    op: UnOp::Neg,
                    operand: Box::new(operand),
                    location,
                })
            }
            TokenKind::Bang => {
                self.advance();
                let operand = self.parse_simple_expression()?;
                Ok(Expr::Unary {
                    op: UnOp::Not,
                    operand: Box::new(operand),
                    location,
                })
            }
            TokenKind::New => {
                self.advance();
                self.parse_new_array(location)
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Null(location))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected(EXPRESSION_START)),
        }
    }

    /// After a leading identifier: a call, a variable, an indexed element, or `.length`
    fn parse_identifier_expression(
        &mut self,
        name: String,
        location: SourceLocation,
    ) -> Result<Expr, ParseError> {
        if self.match_token(TokenKind::LParen) {
            let args = self.parse_actuals()?;
            self.expect(TokenKind::RParen)?;
            return Ok(Expr::Call {
                name,
                args,
                location,
            });
        }

        let indices = self.parse_indexers()?;
        let base = if indices.is_empty() {
            Expr::Variable(name, location)
        } else {
            Expr::ArrayIndex {
                name,
                indices,
                location,
            }
        };

        if self.match_token(TokenKind::Dot) {
            self.expect(TokenKind::Length)?;
            return Ok(Expr::ArrayLength {
                array: Box::new(base),
                location,
            });
        }

        Ok(base)
    }

    /// `new int[e1][e2]...[]...` (the `new` keyword is already consumed)
    fn parse_new_array(&mut self, location: SourceLocation) -> Result<Expr, ParseError> {
        self.expect(TokenKind::Int)?;

        let mut dimensions = Vec::new();
        self.expect(TokenKind::LBracket)?;
        dimensions.push(self.parse_expression()?);
        self.expect(TokenKind::RBracket)?;

        let mut unsized_dims = 0;
        while self.match_token(TokenKind::LBracket) {
            if self.match_token(TokenKind::RBracket) {
                unsized_dims += 1;
                continue;
            }
            if unsized_dims > 0 {
                // Once a dimension is left open, the rest must be open too
                return Err(self.unexpected(&[TokenKind::RBracket]));
            }
            dimensions.push(self.parse_expression()?);
            self.expect(TokenKind::RBracket)?;
        }

        Ok(Expr::NewArray {
            dimensions,
            unsized_dims,
            location,
        })
    }

    /// Parse the argument list of a call (without the parentheses)
    pub(crate) fn parse_actuals(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();

        if self.check(TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok(args)
    }

    /// `"-"? integer_literal`, range-checked against `i32`
    pub(crate) fn parse_signed_int(&mut self) -> Result<i32, ParseError> {
        let negative = self.match_token(TokenKind::Minus);
        let literal = self.expect(TokenKind::IntLiteral)?;

        let magnitude: i64 = literal
            .lexeme
            .parse()
            .map_err(|_| ParseError::unexpected(&literal, &[TokenKind::IntLiteral]))?;
        let value = if negative { -magnitude } else { magnitude };

        i32::try_from(value).map_err(|_| ParseError {
            message: format!("Integer literal out of range: {}", value),
            location: literal.location,
            found: Some(literal.clone()),
            expected: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::lexer::TokenKind;
    use crate::parser::parse::Parser;

    fn parse_expr(expr: &str) -> Expr {
        let source = format!("BEGIN PRINT {}; END", expr);
        let program = Parser::new(&source).unwrap().parse_program().unwrap();
        match program.body.into_iter().next() {
            Some(Stmt::Print { expr, .. }) => expr,
            other => panic!("Expected print statement, got {:?}", other),
        }
    }

    #[test]
    fn test_single_operator_clause() {
        match parse_expr("x * 9") {
            Expr::Binary { op, left, right, .. } => {
                assert_eq!(op, BinOp::Mul);
                assert!(matches!(*left, Expr::Variable(ref n, _) if n == "x"));
                assert!(matches!(*right, Expr::IntLiteral(9, _)));
            }
            other => panic!("Expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_operators_need_parentheses() {
        let err = Parser::new("BEGIN PRINT 1 + 2 * 3; END")
            .unwrap()
            .parse_program()
            .unwrap_err();
        assert_eq!(err.found.unwrap().kind, TokenKind::Star);

        match parse_expr("(1 + 2) * 3") {
            Expr::Binary { op: BinOp::Mul, left, .. } => {
                assert!(matches!(*left, Expr::Binary { op: BinOp::Add, .. }));
            }
            other => panic!("Expected product, got {:?}", other),
        }
    }

    #[test]
    fn test_signed_literals_and_negation() {
        assert!(matches!(parse_expr("-5"), Expr::IntLiteral(-5, _)));
        assert!(matches!(parse_expr("-2147483648"), Expr::IntLiteral(i32::MIN, _)));
        assert!(matches!(
            parse_expr("-x"),
            Expr::Unary { op: UnOp::Neg, .. }
        ));
        assert!(matches!(
            parse_expr("x - -1"),
            Expr::Binary { op: BinOp::Sub, .. }
        ));
    }

    #[test]
    fn test_literal_out_of_range() {
        let err = Parser::new("BEGIN PRINT 2147483648; END")
            .unwrap()
            .parse_program()
            .unwrap_err();
        assert!(err.message.contains("out of range"));
    }

    #[test]
    fn test_array_expressions() {
        match parse_expr("a[i][j + 1]") {
            Expr::ArrayIndex { name, indices, .. } => {
                assert_eq!(name, "a");
                assert_eq!(indices.len(), 2);
            }
            other => panic!("Expected array index, got {:?}", other),
        }

        match parse_expr("a[0].length") {
            Expr::ArrayLength { array, .. } => {
                assert!(matches!(*array, Expr::ArrayIndex { .. }));
            }
            other => panic!("Expected array length, got {:?}", other),
        }

        match parse_expr("new int[n][2][]") {
            Expr::NewArray {
                dimensions,
                unsized_dims,
                ..
            } => {
                assert_eq!(dimensions.len(), 2);
                assert_eq!(unsized_dims, 1);
            }
            other => panic!("Expected array allocation, got {:?}", other),
        }
    }

    #[test]
    fn test_calls_not_and_null() {
        match parse_expr("f(1, g(), x)") {
            Expr::Call { name, args, .. } => {
                assert_eq!(name, "f");
                assert_eq!(args.len(), 3);
                assert!(matches!(args[1], Expr::Call { ref args, .. } if args.is_empty()));
            }
            other => panic!("Expected call, got {:?}", other),
        }
        assert!(matches!(parse_expr("!x"), Expr::Unary { op: UnOp::Not, .. }));
        assert!(matches!(parse_expr("null"), Expr::Null(_)));
    }
}
