// AST (Abstract Syntax Tree) definitions for LPL programs

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Variable types: `int` or an array of `int` nested `depth` times (`int[][]` has depth 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Int,
    Array(usize),
}

impl VarType {
    /// Wrap this type in one more array dimension
    pub fn with_array(self) -> Self {
        match self {
            VarType::Int => VarType::Array(1),
            VarType::Array(depth) => VarType::Array(depth + 1),
        }
    }
}

/// A variable declaration (global, formal parameter or method local)
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub var_type: VarType,
    pub location: SourceLocation,
}

/// A method declaration. Functions carry a return type, procedures do not.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub return_type: Option<VarType>,
    pub params: Vec<VarDecl>,
    pub locals: Vec<VarDecl>,
    pub body: Vec<Stmt>,
    pub location: SourceLocation,
}

impl MethodDecl {
    pub fn is_function(&self) -> bool {
        self.return_type.is_some()
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    // Comparison
    Lt,
    Le,
    Eq,
    // Logical
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg, // -x
    Not, // !x
}

/// The three print statements that take an operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintKind {
    Print,
    Println,
    PrintChar,
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLiteral(i32, SourceLocation),
    Null(SourceLocation),
    Variable(String, SourceLocation),
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        location: SourceLocation,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
    ArrayIndex {
        name: String,
        indices: Vec<Expr>,
        location: SourceLocation,
    },
    ArrayLength {
        array: Box<Expr>,
        location: SourceLocation,
    },
    /// `new int[e1][e2][]`: sized dimensions first, then `unsized_dims` trailing `[]`
    NewArray {
        dimensions: Vec<Expr>,
        unsized_dims: usize,
        location: SourceLocation,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
}

/// Switch case with an integer key
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub value: i32,
    pub body: Stmt,
    pub location: SourceLocation,
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign {
        name: String,
        value: Expr,
        location: SourceLocation,
    },
    ArrayAssign {
        name: String,
        indices: Vec<Expr>,
        value: Expr,
        location: SourceLocation,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        location: SourceLocation,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
        location: SourceLocation,
    },
    Switch {
        subject: Expr,
        cases: Vec<SwitchCase>,
        default: Box<Stmt>,
        location: SourceLocation,
    },
    Block {
        statements: Vec<Stmt>,
        location: SourceLocation,
    },
    Print {
        kind: PrintKind,
        expr: Expr,
        location: SourceLocation,
    },
    Newline {
        location: SourceLocation,
    },
    Return {
        value: Option<Expr>,
        location: SourceLocation,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
}

impl Stmt {
    /// Get the source location of this statement
    pub fn location(&self) -> SourceLocation {
        match self {
            Stmt::Assign { location, .. }
            | Stmt::ArrayAssign { location, .. }
            | Stmt::If { location, .. }
            | Stmt::While { location, .. }
            | Stmt::Switch { location, .. }
            | Stmt::Block { location, .. }
            | Stmt::Print { location, .. }
            | Stmt::Newline { location }
            | Stmt::Return { location, .. }
            | Stmt::Call { location, .. } => *location,
        }
    }
}

/// Top-level program structure: `BEGIN globals body END methods`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub globals: Vec<VarDecl>,
    pub body: Vec<Stmt>,
    pub methods: Vec<MethodDecl>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
