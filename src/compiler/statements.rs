//! Statement code generation
//!
//! Compiled statements leave the runtime stack as they found it. Every
//! control-flow target is a fresh label from the symbol table.

use rustc_hash::FxHashSet;

use crate::compiler::codegen::{emit_call, emit_variable_address, Compile};
use crate::compiler::errors::{CompileError, CompileResult};
use crate::compiler::instructions::{Assembly, Instruction, Syscall};
use crate::compiler::symbols::SymbolTable;
use crate::parser::ast::{Expr, PrintKind, SourceLocation, Stmt, SwitchCase};

const NEWLINE_CHAR: i32 = 10;

impl Compile for Stmt {
    fn compile(&self, st: &mut SymbolTable, out: &mut Assembly) -> CompileResult<()> {
        match self {
            Stmt::Assign {
                name,
                value,
                location,
            } => {
                let info = st.resolve(name).map_err(|e| e.at(*location))?;
                emit_variable_address(&info, st, out);
                value.compile(st, out)?;
                out.emit(Instruction::Store);
            }

            Stmt::ArrayAssign {
                name,
                indices,
                value,
                location,
            } => compile_array_assign(name, indices, value, *location, st, out)?,

            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                condition.compile(st, out)?;
                match else_branch {
                    Some(else_branch) => {
                        let else_label = st.fresh_label("if_else");
                        let end_label = st.fresh_label("if_end");
                        out.emit(Instruction::JumpIfZero(else_label.clone()));
                        then_branch.compile(st, out)?;
                        out.emit(Instruction::Jump(end_label.clone()));
                        out.label(else_label);
                        else_branch.compile(st, out)?;
                        out.label(end_label);
                    }
                    None => {
                        let end_label = st.fresh_label("if_end");
                        out.emit(Instruction::JumpIfZero(end_label.clone()));
                        then_branch.compile(st, out)?;
                        out.label(end_label);
                    }
                }
            }

            Stmt::While {
                condition, body, ..
            } => {
                let start_label = st.fresh_label("while_start");
                let end_label = st.fresh_label("while_end");
                out.label(start_label.clone());
                condition.compile(st, out)?;
                out.emit(Instruction::JumpIfZero(end_label.clone()));
                body.compile(st, out)?;
                out.emit(Instruction::Jump(start_label));
                out.label(end_label);
            }

            Stmt::Switch {
                subject,
                cases,
                default,
                ..
            } => compile_switch(subject, cases, default, st, out)?,

            Stmt::Block { statements, .. } => {
                for stmt in statements {
                    stmt.compile(st, out)?;
                }
            }

            Stmt::Print { kind, expr, .. } => {
                expr.compile(st, out)?;
                match kind {
                    PrintKind::Print => out.emit(Instruction::Syscall(Syscall::OutDec)),
                    PrintKind::Println => {
                        out.emit(Instruction::Syscall(Syscall::OutDec));
                        emit_newline(out);
                    }
                    PrintKind::PrintChar => out.emit(Instruction::Syscall(Syscall::OutChar)),
                }
            }

            Stmt::Newline { .. } => emit_newline(out),

            Stmt::Return { value, location } => {
                let method = st.current_method().ok_or_else(|| {
                    CompileError::scope_context("RETURN outside of any method body").at(*location)
                })?;
                if value.is_none() && st.method(method)?.return_type.is_some() {
                    tracing::warn!(
                        method,
                        line = location.line,
                        "RETURN without a value in a function returns 0"
                    );
                }
                let frame = st.frame_size().map_err(|e| e.at(*location))?;
                match value {
                    Some(value) => value.compile(st, out)?,
                    None => out.emit(Instruction::Push(0)),
                }
                out.emit(Instruction::Push(frame as i32));
                out.emit(Instruction::Ret);
            }

            Stmt::Call {
                name,
                args,
                location,
            } => {
                emit_call(name, args, *location, st, out)?;
                let discard = st.scratch_label("discard");
                out.emit(Instruction::StoreI(discard));
            }
        }

        Ok(())
    }
}

fn emit_newline(out: &mut Assembly) {
    out.emit(Instruction::Push(NEWLINE_CHAR));
    out.emit(Instruction::Syscall(Syscall::OutChar));
}

/// `a[i][j] = v`: the element address is on the stack before `v` is evaluated
fn compile_array_assign(
    name: &str,
    indices: &[Expr],
    value: &Expr,
    location: SourceLocation,
    st: &mut SymbolTable,
    out: &mut Assembly,
) -> CompileResult<()> {
    let info = st.resolve(name).map_err(|e| e.at(location))?;
    emit_variable_address(&info, st, out);

    if let Some((last, leading)) = indices.split_last() {
        out.emit(Instruction::Load);
        for index in leading {
            index.compile(st, out)?;
            out.emit(Instruction::ArrayIndex);
            out.emit(Instruction::Load);
        }
        last.compile(st, out)?;
        out.emit(Instruction::ArrayIndex);
    }

    value.compile(st, out)?;
    out.emit(Instruction::Store);
    Ok(())
}

/// Case bodies first, then a dispatch block comparing the parked subject
/// against each key, falling through to the default.
fn compile_switch(
    subject: &Expr,
    cases: &[SwitchCase],
    default: &Stmt,
    st: &mut SymbolTable,
    out: &mut Assembly,
) -> CompileResult<()> {
    let mut seen = FxHashSet::default();
    for case in cases {
        if !seen.insert(case.value) {
            return Err(CompileError::DuplicateDeclaration {
                name: format!("case {}", case.value),
                scope: "one SWITCH statement".to_string(),
                location: Some(case.location),
            });
        }
    }

    let dispatch_label = st.fresh_label("switch_dispatch");
    let end_label = st.fresh_label("switch_end");
    let default_label = st.fresh_label("switch_default");
    let case_labels: Vec<String> = cases
        .iter()
        .map(|case| st.fresh_label(&case_label_prefix(case.value)))
        .collect();

    out.emit(Instruction::Jump(dispatch_label.clone()));
    for (case, label) in cases.iter().zip(&case_labels) {
        out.label(label.clone());
        case.body.compile(st, out)?;
        out.emit(Instruction::Jump(end_label.clone()));
    }

    out.label(dispatch_label);
    subject.compile(st, out)?;
    let scratch = st.scratch_label("switch");
    out.emit(Instruction::StoreI(scratch.clone()));
    for (case, label) in cases.iter().zip(case_labels) {
        out.emit(Instruction::LoadI(scratch.clone()));
        out.emit(Instruction::Push(case.value));
        out.emit(Instruction::Sub);
        out.emit(Instruction::JumpIfZero(label));
    }

    out.label(default_label);
    default.compile(st, out)?;
    out.label(end_label);
    Ok(())
}

/// `-` is not a label character, so negative keys are spelled with an `m`
fn case_label_prefix(value: i32) -> String {
    if value < 0 {
        format!("case_m{}", value.unsigned_abs())
    } else {
        format!("case_{}", value)
    }
}
