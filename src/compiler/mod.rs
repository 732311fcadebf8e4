//! LPL to SSM code generation
//!
//! This module turns a parsed [`Program`](crate::parser::ast::Program) into
//! SSM assembly:
//! - [`symbols`]: Name resolution, method context and label allocation
//! - [`instructions`]: The instruction set and the [`Assembly`](instructions::Assembly) sink
//! - [`codegen`]: The [`Compile`](codegen::Compile) trait, program and method
//!   layout, calling convention
//! - `expressions` / `statements`: Per-node code generation
//! - [`errors`]: Compile error types
//!
//! Compilation is a single traversal after the symbol table is built; the
//! first error aborts it and no partial assembly is returned.

pub mod codegen;
pub mod errors;
mod expressions;
pub mod instructions;
mod statements;
pub mod symbols;
