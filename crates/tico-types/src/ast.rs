//! AST node types for Tico.
//!
//! Blocks live in an arena ([`Ast::branches`]) and are referred to by
//! [`BranchId`]; expressions are ordinary boxed trees. The tree is immutable
//! once the parser returns it: runtime scope state lives in the evaluator's
//! activation records, never in these nodes.

use crate::Span;
use num_bigint::BigInt;
use serde::Serialize;
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Arena
// ══════════════════════════════════════════════════════════════════════════════

/// Index of a [`Branch`] inside its [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BranchId(pub u32);

impl BranchId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A parsed program: every block of the source plus the top-level one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ast {
    pub branches: Vec<Branch>,
    pub root: BranchId,
}

impl Ast {
    /// Look up a branch by id.
    ///
    /// Ids are only ever produced by the parser that built this arena, so an
    /// out-of-range id is a bug in the caller.
    pub fn branch(&self, id: BranchId) -> &Branch {
        &self.branches[id.index()]
    }

    pub fn root(&self) -> &Branch {
        self.branch(self.root)
    }

    /// Number of branches, root included.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Branches
// ══════════════════════════════════════════════════════════════════════════════

/// A lexical block: the unit that becomes a scope at runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    pub id: BranchId,
    pub kind: BranchKind,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BranchKind {
    /// The top-level program block.
    Block,
    /// `if (condition) body`, also used for `elif`. `next` is the following
    /// `elif` (another `If`) or the closing `else`.
    If {
        condition: Expr,
        next: Option<BranchId>,
    },
    Else,
    While {
        condition: Expr,
    },
    /// `for (init; condition; iterate) body`
    For {
        init: Box<Stmt>,
        condition: Expr,
        iterate: Box<Stmt>,
    },
    /// `function name(params) body`
    Function {
        name: Ident,
        params: Vec<FunctionArg>,
    },
}

impl BranchKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Block => "Branch",
            Self::If { .. } => "IfExpression",
            Self::Else => "ElseExpression",
            Self::While { .. } => "WhileLoopExpression",
            Self::For { .. } => "ForLoopExpression",
            Self::Function { .. } => "FunctionExpression",
        }
    }
}

/// One declared parameter: `[static] name [= default]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionArg {
    pub name: Ident,
    pub default: Option<Expr>,
    /// `static` defaults are evaluated once, when the function is declared.
    pub is_static: bool,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// `name = value`
    Set(SetStmt),
    /// A function declaration; the branch is a [`BranchKind::Function`].
    Function(BranchId),
    Return(ReturnStmt),
    Break(Span),
    If(BranchId),
    While(BranchId),
    For(BranchId),
    Expr(Expr),
}

impl Stmt {
    /// Span of a statement. Branch statements need the arena to answer, so
    /// they report through `ast`.
    pub fn span(&self, ast: &Ast) -> Span {
        match self {
            Stmt::Set(set) => set.span,
            Stmt::Return(ret) => ret.span,
            Stmt::Break(span) => *span,
            Stmt::Expr(expr) => expr.span,
            Stmt::Function(id) | Stmt::If(id) | Stmt::While(id) | Stmt::For(id) => {
                ast.branch(*id).span
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetStmt {
    pub target: Ident,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    /// A literal with the source text it came from.
    Literal { value: Literal, raw: String },
    Identifier(Ident),
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `!expr`
    Negate(Box<Expr>),
    /// `callee(args...)`
    Call { callee: Ident, args: Vec<Expr> },
}

/// Literal values as written in source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Number(f64),
    BigInt(BigInt),
    String(String),
    Bool(bool),
    Null,
    Undefined,
}

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Operators
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinOp {
    Mul,
    Div,
    Mod,
    Pow,
    FloorDiv,
    UnsignedMod,
    Add,
    Sub,
    Greater,
    Less,
    GreaterEq,
    LessEq,
    Eq,
    NotEq,
    And,
    Or,
}

impl BinOp {
    /// Map operator source text to its operator.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Mod,
            "**" => Self::Pow,
            "//" => Self::FloorDiv,
            "%%" => Self::UnsignedMod,
            "+" => Self::Add,
            "-" => Self::Sub,
            ">" => Self::Greater,
            "<" => Self::Less,
            ">=" => Self::GreaterEq,
            "<=" => Self::LessEq,
            "==" => Self::Eq,
            "!=" => Self::NotEq,
            "&&" => Self::And,
            "||" => Self::Or,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::FloorDiv => "//",
            Self::UnsignedMod => "%%",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Greater => ">",
            Self::Less => "<",
            Self::GreaterEq => ">=",
            Self::LessEq => "<=",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
