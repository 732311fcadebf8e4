//! LPL source code parser
//!
//! This module transforms LPL source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: The [`parse::Parser`] and its error type
//! - [`ast`]: AST node definitions
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser, one routine per grammar production,
//! split across `declarations`, `statements` and `expressions`. Binary
//! operators have no precedence: an expression admits at most one operator.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;
