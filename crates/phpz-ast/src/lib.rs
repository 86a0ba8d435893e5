//! PHP syntax tree for the phpz compiler.
//!
//! This crate defines the source tree the semantic binder consumes. The
//! parser producing it lives outside the semantic core; these types are the
//! contract between the two. Every syntax form is a variant of a closed sum
//! type (`Expr`, `Stmt`), so the binder's dispatch is exhaustive and adding
//! a node kind is a compile-checked, single-site edit.

pub mod expr;
pub mod routine;
pub mod stmt;

pub use expr::{
    Arg, BinaryOp, CallTarget, ClassRef, Expr, IncludeKind, Lit, MemberName, UnaryOp, VarName,
};
pub use routine::{Param, Routine, RoutineKind, TypeHint};
pub use stmt::{Catch, Stmt};
