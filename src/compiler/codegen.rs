//! Code generation driver
//!
//! Every AST node implements [`Compile`], which appends the node's SSM code
//! to an [`Assembly`]. Compiled expressions leave exactly one value on the
//! runtime stack; compiled statements leave the stack as they found it.
//!
//! # Frame layout
//!
//! The stack grows toward lower addresses.
//!
//! ```text
//! caller: push argN ... push arg1, push N, calli $_m
//! calli : pops N, pushes the return address, pushes the caller's fp, fp := sp
//!         param k  at fp + (k + 1) * word_size
//!         local k  at fp -  k      * word_size
//! ret   : pops the cleanup count C (params + locals) and the return value,
//!         releases C slots and the two linkage words, restores fp,
//!         pushes the return value and jumps back
//! ```
//!
//! Globals live in the data segment at `dp + index * word_size`.

use crate::compiler::errors::CompileResult;
use crate::compiler::instructions::{Assembly, Instruction};
use crate::compiler::symbols::{ScopeKind, SymbolTable, VarInfo};
use crate::config::CompilerConfig;
use crate::parser::ast::{Expr, MethodDecl, Program, SourceLocation};

/// Words `calli` pushes between the arguments and the frame pointer
pub const FRAME_LINKAGE_WORDS: i32 = 2;

pub trait Compile {
    fn compile(&self, st: &mut SymbolTable, out: &mut Assembly) -> CompileResult<()>;
}

/// Compile a parsed program with a fresh symbol table.
pub fn compile_program(program: &Program, config: &CompilerConfig) -> CompileResult<Assembly> {
    let mut st = SymbolTable::new(program, config)?;
    let mut out = Assembly::new();
    program.compile(&mut st, &mut out)?;

    tracing::debug!(instructions = out.len(), "generated assembly");
    Ok(out)
}

impl Compile for Program {
    fn compile(&self, st: &mut SymbolTable, out: &mut Assembly) -> CompileResult<()> {
        for stmt in &self.body {
            stmt.compile(st, out).map_err(|e| e.at(stmt.location()))?;
        }
        out.emit(Instruction::Halt);

        for method in &self.methods {
            method.compile(st, out)?;
        }

        let words: Vec<String> = st
            .globals()
            .map(|name| st.variable_label(name))
            .chain(st.scratch_words().map(str::to_string))
            .collect();
        if !words.is_empty() {
            out.emit(Instruction::DataSegment);
            for label in words {
                out.emit(Instruction::Word { label, value: 0 });
            }
        }

        Ok(())
    }
}

impl Compile for MethodDecl {
    fn compile(&self, st: &mut SymbolTable, out: &mut Assembly) -> CompileResult<()> {
        let mut scope = st
            .enter_method(&self.name)
            .map_err(|e| e.at(self.location))?;
        tracing::debug!(method = %self.name, "compiling method");

        out.label(scope.method_label(&self.name));
        for _ in 0..scope.local_count()? {
            out.emit(Instruction::Push(0));
        }

        for stmt in &self.body {
            stmt.compile(&mut scope, out)
                .map_err(|e| e.at(stmt.location()))?;
        }

        // Falling off the end returns 0
        let frame = scope.frame_size()?;
        out.emit(Instruction::Push(0));
        out.emit(Instruction::Push(frame as i32));
        out.emit(Instruction::Ret);

        Ok(())
    }
}

/// Push the address of a resolved variable's storage
pub(crate) fn emit_variable_address(info: &VarInfo, st: &SymbolTable, out: &mut Assembly) {
    let ws = st.word_size();
    let (base, offset) = match info.kind {
        ScopeKind::Global => (Instruction::GetDp, info.offset),
        ScopeKind::Parameter => (Instruction::GetFp, (info.offset + FRAME_LINKAGE_WORDS - 1) * ws),
        ScopeKind::Local => (Instruction::GetFp, -info.offset * ws),
    };
    out.emit(base);
    out.emit(Instruction::Push(offset));
    out.emit(Instruction::Add);
}

/// `push argN ... push arg1, push N, calli label`, shared by call expressions
/// and call statements
pub(crate) fn emit_call(
    name: &str,
    args: &[Expr],
    location: SourceLocation,
    st: &mut SymbolTable,
    out: &mut Assembly,
) -> CompileResult<()> {
    st.method(name).map_err(|e| e.at(location))?;
    let label = st.method_label(name);

    for arg in args.iter().rev() {
        arg.compile(st, out)?;
    }
    out.emit(Instruction::Push(args.len() as i32));
    out.emit(Instruction::Call(label));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::errors::CompileError;
    use crate::parser::parse::Parser;

    fn compile(source: &str) -> CompileResult<Assembly> {
        let program = Parser::new(source).unwrap().parse_program().unwrap();
        compile_program(&program, &CompilerConfig::default())
    }

    fn listing(source: &str) -> Vec<String> {
        compile(source)
            .unwrap()
            .instructions()
            .iter()
            .map(|i| i.to_string())
            .collect()
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(listing("BEGIN END"), vec!["halt"]);
    }

    #[test]
    fn test_global_access() {
        let expected = vec![
            "get_dp", "push 4", "add", "push 3", "store", // y = 3
            "halt", ".data", "$v_x: 0", "$v_y: 0",
        ];
        assert_eq!(listing("BEGIN int x; int y; y = 3; END"), expected);
    }

    #[test]
    fn test_method_frame() {
        let source = "BEGIN END FUN int f(int a, int b) { int c; c = b; RETURN c; }";
        let expected = vec![
            "halt",
            "$_f:",
            "push 0",
            // c = b
            "get_fp", "push -4", "add",
            "get_fp", "push 12", "add", "load",
            "store",
            // RETURN c
            "get_fp", "push -4", "add", "load",
            "push 3", "ret",
            // fall-through
            "push 0", "push 3", "ret",
        ];
        assert_eq!(listing(source), expected);
    }

    #[test]
    fn test_word_size_scales_offsets() {
        let program = Parser::new("BEGIN int x; int y; y = 1; END")
            .unwrap()
            .parse_program()
            .unwrap();
        let asm = compile_program(&program, &CompilerConfig::default().with_word_size(8)).unwrap();
        assert_eq!(asm.instructions()[1], Instruction::Push(8));
    }

    #[test]
    fn test_call_pushes_arguments_in_reverse() {
        let source = "BEGIN p(1, 2); END PROC p(int a, int b) { }";
        let out = listing(source);
        assert_eq!(
            &out[..5],
            &["push 2", "push 1", "push 2", "calli $_p", "storei $s_discard"]
        );
        assert_eq!(out.last().map(String::as_str), Some("$s_discard: 0"));
    }

    #[test]
    fn test_unknown_method() {
        let err = compile("BEGIN q(); END").unwrap_err();
        assert!(matches!(err, CompileError::UndeclaredName { ref name, .. } if name == "q"));
        assert_eq!(err.location().map(|l| l.line), Some(1));
    }

    #[test]
    fn test_return_outside_method() {
        let err = compile("BEGIN RETURN 1; END").unwrap_err();
        assert!(matches!(err, CompileError::ScopeContext { .. }));
    }

    #[test]
    fn test_errors_inside_nested_statements_carry_a_line() {
        let err = compile("BEGIN\n  WHILE (1) {\n    x = 1;\n  }\nEND").unwrap_err();
        assert_eq!(err.location().map(|l| l.line), Some(3));

        let err = compile("BEGIN END\nPROC p() {\n  IF (1) q();\n}").unwrap_err();
        assert_eq!(err.location().map(|l| l.line), Some(3));
    }

    #[test]
    fn test_huge_word_size_is_a_layout_error() {
        let program = Parser::new("BEGIN END PROC p(int a, int b) { }")
            .unwrap()
            .parse_program()
            .unwrap();
        let config = CompilerConfig::default().with_word_size(i32::MAX);
        let err = compile_program(&program, &config).unwrap_err();
        assert!(matches!(err, CompileError::InvalidLayout { .. }));
    }
}
