//! SSM instruction set and the append-only instruction sink
//!
//! [`Instruction`] renders to the assembler's textual syntax through
//! `Display`; [`Assembly`] collects instructions in emission order and prints
//! them one per line.

use std::fmt;

/// System call numbers understood by the SSM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall {
    /// Print the top of stack as a decimal number
    OutDec,
    /// Print the top of stack as a character code
    OutChar,
}

impl fmt::Display for Syscall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syscall::OutDec => write!(f, "OUT_DEC"),
            Syscall::OutChar => write!(f, "OUT_CHAR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    // Stack and addressing
    Push(i32),
    GetFp,
    GetDp,
    Load,
    Store,
    LoadI(String),
    StoreI(String),

    // Arithmetic and tests
    Add,
    Sub,
    Mul,
    Div,
    TestZ,
    TestN,

    // Control flow
    Jump(String),
    JumpIfZero(String),
    Call(String),
    Ret,
    Halt,

    // Arrays
    ArrayIndex,
    ArrayLength,
    NewArray(usize),

    Syscall(Syscall),

    // Pseudo-instructions
    Label(String),
    DataSegment,
    Word { label: String, value: i32 },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(value) => write!(f, "push {}", value),
            Instruction::GetFp => write!(f, "get_fp"),
            Instruction::GetDp => write!(f, "get_dp"),
            Instruction::Load => write!(f, "load"),
            Instruction::Store => write!(f, "store"),
            Instruction::LoadI(label) => write!(f, "loadi {}", label),
            Instruction::StoreI(label) => write!(f, "storei {}", label),
            Instruction::Add => write!(f, "add"),
            Instruction::Sub => write!(f, "sub"),
            Instruction::Mul => write!(f, "mul"),
            Instruction::Div => write!(f, "div"),
            Instruction::TestZ => write!(f, "test_z"),
            Instruction::TestN => write!(f, "test_n"),
            Instruction::Jump(label) => write!(f, "jumpi {}", label),
            Instruction::JumpIfZero(label) => write!(f, "jumpi_z {}", label),
            Instruction::Call(label) => write!(f, "calli {}", label),
            Instruction::Ret => write!(f, "ret"),
            Instruction::Halt => write!(f, "halt"),
            Instruction::ArrayIndex => write!(f, "array_index"),
            Instruction::ArrayLength => write!(f, "array_length"),
            Instruction::NewArray(dims) => write!(f, "new_array {}", dims),
            Instruction::Syscall(call) => write!(f, "sysc {}", call),
            Instruction::Label(label) => write!(f, "{}:", label),
            Instruction::DataSegment => write!(f, ".data"),
            Instruction::Word { label, value } => write!(f, "{}: {}", label, value),
        }
    }
}

/// Instructions in emission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    instructions: Vec<Instruction>,
}

impl Assembly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn label(&mut self, label: impl Into<String>) {
        self.emit(Instruction::Label(label.into()));
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Every label defined in the listing, code and data alike
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.instructions.iter().filter_map(|instruction| match instruction {
            Instruction::Label(label) | Instruction::Word { label, .. } => Some(label.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{}", instruction)?;
        }
        Ok(())
    }
}
