//! Compile-time error types
//!
//! This module defines [`CompileError`], the errors raised while building the
//! symbol table or generating code (as opposed to syntax errors, which are
//! [`ParseError`](crate::parser::parse::ParseError)s).
//!
//! All compile errors are fatal: the first one aborts the compile and no
//! assembly is produced.

use crate::parser::ast::SourceLocation;
use std::fmt;

pub type CompileResult<T> = Result<T, CompileError>;

/// The kind of name that failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Variable,
    Method,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Variable => write!(f, "variable"),
            NameKind::Method => write!(f, "method"),
        }
    }
}

/// Errors that can occur during symbol table construction and code generation
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Reference to a variable or method that is not declared anywhere visible
    UndeclaredName {
        name: String,
        kind: NameKind,
        location: Option<SourceLocation>,
    },

    /// A name declared twice in one scope (or a rejected shadowing of a global)
    DuplicateDeclaration {
        name: String,
        scope: String,
        location: Option<SourceLocation>,
    },

    /// Code generation ran with an inconsistent method context,
    /// e.g. `RETURN` in the main body or a nested method entry
    ScopeContext {
        message: String,
        location: Option<SourceLocation>,
    },

    /// Storage offsets that cannot be expressed with the configured word size
    InvalidLayout { message: String },
}

impl CompileError {
    pub fn undeclared_variable(name: &str) -> Self {
        CompileError::UndeclaredName {
            name: name.to_string(),
            kind: NameKind::Variable,
            location: None,
        }
    }

    pub fn undeclared_method(name: &str) -> Self {
        CompileError::UndeclaredName {
            name: name.to_string(),
            kind: NameKind::Method,
            location: None,
        }
    }

    pub fn scope_context(message: impl Into<String>) -> Self {
        CompileError::ScopeContext {
            message: message.into(),
            location: None,
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            CompileError::UndeclaredName { location, .. }
            | CompileError::DuplicateDeclaration { location, .. }
            | CompileError::ScopeContext { location, .. } => location.as_ref(),
            CompileError::InvalidLayout { .. } => None,
        }
    }

    /// Attach a source location, keeping one that is already set
    pub fn at(mut self, loc: SourceLocation) -> Self {
        match &mut self {
            CompileError::UndeclaredName { location, .. }
            | CompileError::DuplicateDeclaration { location, .. }
            | CompileError::ScopeContext { location, .. } => {
                location.get_or_insert(loc);
            }
            CompileError::InvalidLayout { .. } => {}
        }
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UndeclaredName { name, kind, .. } => {
                write!(f, "Undeclared {} '{}'", kind, name)?;
            }
            CompileError::DuplicateDeclaration { name, scope, .. } => {
                write!(f, "Duplicate declaration of '{}' in {}", name, scope)?;
            }
            CompileError::ScopeContext { message, .. } => {
                write!(f, "Invalid method context: {}", message)?;
            }
            CompileError::InvalidLayout { message } => {
                write!(f, "Invalid storage layout: {}", message)?;
            }
        }
        if let Some(location) = self.location() {
            write!(f, " at line {}, column {}", location.line, location.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}
