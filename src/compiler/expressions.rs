//! Expression code generation
//!
//! Each compiled expression nets exactly one value on the runtime stack.
//! Comparisons and logical operators produce 0 or 1 using only `sub`,
//! `test_z`, `test_n` and `mul`; the SSM has no dedicated boolean
//! instructions.

use crate::compiler::codegen::{emit_call, emit_variable_address, Compile};
use crate::compiler::errors::CompileResult;
use crate::compiler::instructions::{Assembly, Instruction};
use crate::compiler::symbols::SymbolTable;
use crate::parser::ast::{BinOp, Expr, UnOp};

impl Compile for Expr {
    fn compile(&self, st: &mut SymbolTable, out: &mut Assembly) -> CompileResult<()> {
        match self {
            Expr::IntLiteral(value, _) => out.emit(Instruction::Push(*value)),

            Expr::Null(_) => out.emit(Instruction::Push(0)),

            Expr::Variable(name, location) => {
                let info = st.resolve(name).map_err(|e| e.at(*location))?;
                emit_variable_address(&info, st, out);
                out.emit(Instruction::Load);
            }

            Expr::Unary { op, operand, .. } => match op {
                UnOp::Not => {
                    operand.compile(st, out)?;
                    out.emit(Instruction::TestZ);
                }
                UnOp::Neg => {
                    out.emit(Instruction::Push(0));
                    operand.compile(st, out)?;
                    out.emit(Instruction::Sub);
                }
            },

            Expr::Binary {
                op, left, right, ..
            } => compile_binary(*op, left, right, st, out)?,

            Expr::ArrayIndex {
                name,
                indices,
                location,
            } => {
                let info = st.resolve(name).map_err(|e| e.at(*location))?;
                emit_variable_address(&info, st, out);
                out.emit(Instruction::Load);
                for index in indices {
                    index.compile(st, out)?;
                    out.emit(Instruction::ArrayIndex);
                    out.emit(Instruction::Load);
                }
            }

            Expr::ArrayLength { array, .. } => {
                array.compile(st, out)?;
                out.emit(Instruction::ArrayLength);
            }

            // Trailing `[]` dimensions are left for later assignments to fill
            Expr::NewArray { dimensions, .. } => {
                for dimension in dimensions {
                    dimension.compile(st, out)?;
                }
                out.emit(Instruction::NewArray(dimensions.len()));
            }

            Expr::Call {
                name,
                args,
                location,
            } => emit_call(name, args, *location, st, out)?,
        }

        Ok(())
    }
}

fn compile_binary(
    op: BinOp,
    left: &Expr,
    right: &Expr,
    st: &mut SymbolTable,
    out: &mut Assembly,
) -> CompileResult<()> {
    let combine = match op {
        BinOp::Add => vec![Instruction::Add],
        BinOp::Sub => vec![Instruction::Sub],
        BinOp::Mul => vec![Instruction::Mul],
        BinOp::Div => vec![Instruction::Div],
        BinOp::Lt => vec![Instruction::Sub, Instruction::TestN],
        // l <= r  iff  l - r - 1 < 0
        BinOp::Le => vec![
            Instruction::Sub,
            Instruction::Push(1),
            Instruction::Sub,
            Instruction::TestN,
        ],
        BinOp::Eq => vec![Instruction::Sub, Instruction::TestZ],

        // Logical operators normalise each operand to 0/1 before combining
        BinOp::And => {
            left.compile(st, out)?;
            out.emit(Instruction::TestZ);
            out.emit(Instruction::TestZ);
            right.compile(st, out)?;
            out.emit(Instruction::TestZ);
            out.emit(Instruction::TestZ);
            out.emit(Instruction::Mul);
            return Ok(());
        }
        BinOp::Or => {
            // !( !l * !r )
            left.compile(st, out)?;
            out.emit(Instruction::TestZ);
            right.compile(st, out)?;
            out.emit(Instruction::TestZ);
            out.emit(Instruction::Mul);
            out.emit(Instruction::TestZ);
            return Ok(());
        }
    };

    left.compile(st, out)?;
    right.compile(st, out)?;
    for instruction in combine {
        out.emit(instruction);
    }

    Ok(())
}
