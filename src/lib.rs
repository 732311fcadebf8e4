//! # Introduction
//!
//! lplc compiles LPL, a small imperative language with integers, nested
//! integer arrays, procedures and functions, into textual assembly for the
//! SSM stack machine.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Symbol table → Code generator → Assembly
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds an AST by recursive descent.
//! 2. [`compiler::symbols`]: assigns every global, parameter and local its
//!    storage slot and hands out control-flow labels.
//! 3. [`compiler::codegen`]: walks the AST once, appending instructions to an
//!    [`compiler::instructions::Assembly`].
//! 4. [`config`]: word size and the policy for locals that hide globals.
//!
//! The first error at any stage aborts the compile; no partial assembly is
//! ever produced.
//!
//! ```
//! use lplc::{compile_source, config::CompilerConfig};
//!
//! let asm = compile_source("BEGIN PRINT 6 * 7; END", &CompilerConfig::default()).unwrap();
//! assert_eq!(asm.to_string(), "push 6\npush 7\nmul\nsysc OUT_DEC\nhalt\n");
//! ```

pub mod compiler;
pub mod config;
pub mod parser;

use std::fmt;
use std::io;

use compiler::codegen::compile_program;
use compiler::errors::CompileError;
use compiler::instructions::Assembly;
use config::CompilerConfig;
use parser::parse::{ParseError, Parser};

/// Any failure of a compile, from reading the source to generating code
#[derive(Debug)]
pub enum Error {
    Parse(ParseError),
    Compile(CompileError),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "{}", e),
            Error::Compile(e) => write!(f, "Compile error: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Compile(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<CompileError> for Error {
    fn from(e: CompileError) -> Self {
        Error::Compile(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Parse and compile one LPL program.
pub fn compile_source(source: &str, config: &CompilerConfig) -> Result<Assembly, Error> {
    let program = Parser::new(source)?.parse_program()?;
    Ok(compile_program(&program, config)?)
}
