//! Statement nodes.

use crate::expr::Expr;
use crate::routine::Routine;
use phpz_common::span::{Span, Spanned};
use serde::{Deserialize, Serialize};

/// One `catch (Type $var)` clause.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Catch {
    pub class_name: String,
    pub variable: String,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A statement. Structured statements (`If`, `While`, ...) are decomposed
/// into basic blocks by the CFG builder; the remaining "simple" statements
/// are what blocks hold and what the binder lowers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expression {
        expr: Expr,
        span: Span,
    },
    Echo {
        values: Vec<Expr>,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Throw {
        value: Expr,
        span: Span,
    },
    Unset {
        vars: Vec<Expr>,
        span: Span,
    },
    /// `global $a, $b;`
    GlobalDecl {
        vars: Vec<String>,
        span: Span,
    },
    /// `static $a = init;`
    StaticDecl {
        vars: Vec<(String, Option<Expr>)>,
        span: Span,
    },
    /// Nested named function declaration.
    FunctionDecl {
        routine: Box<Routine>,
        span: Span,
    },
    /// Conditional class/interface/trait declaration inside a routine body.
    TypeDecl {
        name: String,
        span: Span,
    },
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    DoWhile {
        body: Vec<Stmt>,
        cond: Expr,
        span: Span,
    },
    For {
        init: Vec<Expr>,
        cond: Option<Expr>,
        step: Vec<Expr>,
        body: Vec<Stmt>,
        span: Span,
    },
    TryCatch {
        body: Vec<Stmt>,
        catches: Vec<Catch>,
        finally: Vec<Stmt>,
        span: Span,
    },
    Block {
        body: Vec<Stmt>,
        span: Span,
    },
    YieldStmt {
        value: Option<Expr>,
        span: Span,
    },
    Empty {
        span: Span,
    },
}

impl Spanned for Stmt {
    fn span(&self) -> Span {
        match self {
            Stmt::Expression { span, .. }
            | Stmt::Echo { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Throw { span, .. }
            | Stmt::Unset { span, .. }
            | Stmt::GlobalDecl { span, .. }
            | Stmt::StaticDecl { span, .. }
            | Stmt::FunctionDecl { span, .. }
            | Stmt::TypeDecl { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::DoWhile { span, .. }
            | Stmt::For { span, .. }
            | Stmt::TryCatch { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::YieldStmt { span, .. }
            | Stmt::Empty { span } => *span,
        }
    }
}

impl Stmt {
    /// Shorthand for an expression statement spanning its expression.
    pub fn expr(expr: Expr) -> Stmt {
        let span = expr.span();
        Stmt::Expression { expr, span }
    }
}
