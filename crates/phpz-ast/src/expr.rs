//! Expression nodes.

use crate::routine::Param;
use crate::stmt::Stmt;
use phpz_common::span::{Span, Spanned};
use serde::{Deserialize, Serialize};

/// A literal value as written in source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Lit {
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    Str(String),
    /// `array(...)` / `[...]` literal; values only, keys optional.
    Array(Vec<(Option<Expr>, Expr)>),
}

/// A variable name: direct (`$x`) or computed at run time (`$$e`, `${e}`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum VarName {
    Direct(String),
    Indirect(Box<Expr>),
}

/// A member (field or method) name: direct (`->f`) or computed (`->{$e}`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MemberName {
    Direct(String),
    Indirect(Box<Expr>),
}

/// A class reference: direct name (`Foo::`) or computed (`$c::`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClassRef {
    Direct(String),
    Indirect(Box<Expr>),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
    Xor,
    Coalesce,
    Eq,
    NotEq,
    Identical,
    NotIdentical,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Spaceship,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Minus,
    Plus,
    LogicNot,
    BitNot,
    /// `(int)`, `(float)`, `(string)`, `(bool)`, `(array)`, `(object)` casts.
    CastInt,
    CastDouble,
    CastString,
    CastBool,
    CastArray,
    CastObject,
    /// `@expr` error suppression.
    Silence,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncludeKind {
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
}

/// What a call expression targets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CallTarget {
    /// `foo(...)` — direct global/namespaced function.
    Function(String),
    /// `$f(...)` — callee computed at run time.
    IndirectFunction(Box<Expr>),
    /// `$obj->m(...)`.
    Method { receiver: Box<Expr>, name: MemberName },
    /// `Cls::m(...)`.
    StaticMethod { class: ClassRef, name: MemberName },
}

/// One call argument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Arg {
    pub value: Expr,
    pub spread: bool,
}

impl Arg {
    pub fn new(value: Expr) -> Self {
        Self {
            value,
            spread: false,
        }
    }
}

/// An expression. Each variant carries its source span.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal {
        value: Lit,
        span: Span,
    },
    Variable {
        name: VarName,
        span: Span,
    },
    /// `$a[$i]` or `$a[]` (append position when used as a write target).
    ItemAccess {
        array: Box<Expr>,
        index: Option<Box<Expr>>,
        span: Span,
    },
    /// `$obj->f`.
    FieldAccess {
        object: Box<Expr>,
        field: MemberName,
        span: Span,
    },
    /// `Cls::$f`.
    StaticFieldAccess {
        class: ClassRef,
        field: MemberName,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    /// `$c ? $t : $f`; `if_true` is `None` for the short form `$c ?: $f`.
    Conditional {
        cond: Box<Expr>,
        if_true: Option<Box<Expr>>,
        if_false: Box<Expr>,
        span: Span,
    },
    /// `$target = $value`.
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    /// `$target =& $value`.
    RefAssign {
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    /// `$target op= $value`.
    CompoundAssign {
        op: BinaryOp,
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    Call {
        target: CallTarget,
        args: Vec<Arg>,
        span: Span,
    },
    New {
        class: ClassRef,
        args: Vec<Arg>,
        span: Span,
    },
    InstanceOf {
        value: Box<Expr>,
        class: ClassRef,
        span: Span,
    },
    Isset {
        vars: Vec<Expr>,
        span: Span,
    },
    EmptyEx {
        operand: Box<Expr>,
        span: Span,
    },
    /// `list($a, , $b) = ...` target; holes are `None`.
    ListEx {
        items: Vec<Option<Expr>>,
        span: Span,
    },
    /// Anonymous function. `uses` are captured variables; `by_ref` captures
    /// alias the enclosing local.
    Lambda {
        params: Vec<Param>,
        uses: Vec<(String, bool)>,
        body: Vec<Stmt>,
        span: Span,
    },
    /// Interpolated string / echo chain: `"a{$x}b"`.
    Concat {
        parts: Vec<Expr>,
        span: Span,
    },
    Include {
        kind: IncludeKind,
        operand: Box<Expr>,
        span: Span,
    },
    /// `exit`/`die`, with optional status.
    ExitEx {
        operand: Option<Box<Expr>>,
        span: Span,
    },
}

impl Spanned for Expr {
    fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Variable { span, .. }
            | Expr::ItemAccess { span, .. }
            | Expr::FieldAccess { span, .. }
            | Expr::StaticFieldAccess { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::Assign { span, .. }
            | Expr::RefAssign { span, .. }
            | Expr::CompoundAssign { span, .. }
            | Expr::Call { span, .. }
            | Expr::New { span, .. }
            | Expr::InstanceOf { span, .. }
            | Expr::Isset { span, .. }
            | Expr::EmptyEx { span, .. }
            | Expr::ListEx { span, .. }
            | Expr::Lambda { span, .. }
            | Expr::Concat { span, .. }
            | Expr::Include { span, .. }
            | Expr::ExitEx { span, .. } => *span,
        }
    }
}

impl Expr {
    /// Shorthand for a direct `$name` variable node.
    pub fn var(name: impl Into<String>, span: Span) -> Expr {
        Expr::Variable {
            name: VarName::Direct(name.into()),
            span,
        }
    }

    /// Shorthand for an integer literal.
    pub fn long(value: i64, span: Span) -> Expr {
        Expr::Literal {
            value: Lit::Long(value),
            span,
        }
    }
}
