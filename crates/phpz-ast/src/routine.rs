//! Routine (function / method / closure / global-code) declarations.

use crate::stmt::Stmt;
use phpz_common::span::Span;
use serde::{Deserialize, Serialize};

/// A declared parameter or property type hint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeHint {
    Bool,
    Long,
    Double,
    Str,
    Array,
    Callable,
    Object,
    /// A named class/interface type.
    Class(String),
    /// `?T`.
    Nullable(Box<TypeHint>),
    /// `A|B`.
    Union(Vec<TypeHint>),
    /// `mixed` / no usable hint.
    Mixed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub hint: Option<TypeHint>,
    pub by_ref: bool,
    pub default: Option<crate::expr::Expr>,
    pub span: Span,
}

impl Param {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            hint: None,
            by_ref: false,
            default: None,
            span,
        }
    }

    pub fn with_hint(mut self, hint: TypeHint) -> Self {
        self.hint = Some(hint);
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutineKind {
    /// Top-level script code.
    GlobalCode,
    Function,
    Method,
    Closure,
}

/// One routine to be bound and analyzed. Methods carry the name of the
/// declaring class so `$this` can be typed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub kind: RoutineKind,
    pub name: String,
    pub params: Vec<Param>,
    pub this_class: Option<String>,
    pub return_hint: Option<TypeHint>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Routine {
    pub fn function(name: impl Into<String>, params: Vec<Param>, body: Vec<Stmt>) -> Self {
        Self {
            kind: RoutineKind::Function,
            name: name.into(),
            params,
            this_class: None,
            return_hint: None,
            body,
            span: Span::ZERO,
        }
    }

    pub fn global_code(body: Vec<Stmt>) -> Self {
        Self {
            kind: RoutineKind::GlobalCode,
            name: "{main}".to_string(),
            params: Vec::new(),
            this_class: None,
            return_hint: None,
            body,
            span: Span::ZERO,
        }
    }
}
