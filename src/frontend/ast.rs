//! Abstract Syntax Tree definitions for Swiftlite.

use crate::types::Type;

/// A complete program (list of top-level statements)
#[derive(Debug, Clone)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

/// Statement
#[derive(Debug, Clone)]
pub enum Stmt {
    /// var/let name [: type] [= expr] ;
    Var(VarDecl),
    /// name = expr ;
    Assign {
        name: String,
        value: Expr,
        line: u32,
    },
    /// if cond { ... } [else { ... }]
    If {
        cond: Expr,
        then_block: Vec<Stmt>,
        else_block: Option<Vec<Stmt>>,
        line: u32,
    },
    /// while cond { ... }
    While {
        cond: Expr,
        body: Vec<Stmt>,
        line: u32,
    },
    /// for binding in iterable { ... }
    ForIn {
        binding: String,
        iterable: Expr,
        body: Vec<Stmt>,
        line: u32,
    },
    /// func name(params) [-> type] { ... }
    Func(FuncDecl),
    /// class Name { properties and methods }
    Class(ClassDecl),
    /// return [expr] ;
    Return { value: Option<Expr>, line: u32 },
    /// Bare expression statement
    Expr(Expr),
}

/// Variable declaration, also used for class properties
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub declared_ty: Option<Type>,
    pub init: Option<Expr>,
    /// true for `var`, false for `let`
    pub mutable: bool,
    pub line: u32,
}

/// Function declaration, also used for class methods
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub ret_ty: Option<Type>,
    pub body: Vec<Stmt>,
    pub line: u32,
}

/// Function parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub default: Option<Expr>,
    pub line: u32,
}

/// Class declaration
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub properties: Vec<VarDecl>,
    pub methods: Vec<FuncDecl>,
    pub line: u32,
}

/// Expression
#[derive(Debug, Clone)]
pub enum Expr {
    /// Literal value
    Literal { value: LitValue, line: u32 },
    /// Identifier reference
    Ident { name: String, line: u32 },
    /// Binary operation
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        line: u32,
    },
    /// Unary operation
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        line: u32,
    },
    /// Call of a named function
    Call {
        name: String,
        args: Vec<Expr>,
        line: u32,
    },
    /// Member access `obj.member`, or method call when `args` is Some
    Member {
        object: Box<Expr>,
        member: String,
        args: Option<Vec<Expr>>,
        line: u32,
    },
    /// Tuple literal: zero or two-plus elements
    Tuple { elements: Vec<Expr>, line: u32 },
    /// Array literal `[a, b, c]`
    Array { elements: Vec<Expr>, line: u32 },
    /// Dictionary literal `["k": v]`
    Dict {
        pairs: Vec<(Expr, Expr)>,
        line: u32,
    },
    /// Lambda `(a, b) -> expr` or `x -> expr`
    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
        line: u32,
    },
}

impl Expr {
    pub fn line(&self) -> u32 {
        match self {
            Expr::Literal { line, .. }
            | Expr::Ident { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Call { line, .. }
            | Expr::Member { line, .. }
            | Expr::Tuple { line, .. }
            | Expr::Array { line, .. }
            | Expr::Dict { line, .. }
            | Expr::Lambda { line, .. } => *line,
        }
    }
}

/// Literal values
#[derive(Debug, Clone)]
pub enum LitValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    /// Closed range `a...b`
    Range,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Range => "...",
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// Logical not `!`
    Not,
    /// Arithmetic negation `-`
    Neg,
}
