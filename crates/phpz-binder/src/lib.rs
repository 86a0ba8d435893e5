//! Semantic binder for the phpz compiler.
//!
//! Translates the PHP syntax tree into the typed bound-operation tree. The
//! translation is *access-driven*: the desired access of a parent expression
//! determines the access requested when binding its children, which is how
//! PHP's write-through-container semantics (autovivification, references,
//! quiet reads) are encoded without special cases downstream.
//!
//! The binder is a pure function of `(syntax node, desired access, type
//! environment)`. The flow analysis re-invokes it with progressively refined
//! type environments, so nothing here caches per-node state.

pub mod access;
pub mod binder;
pub mod bound;
pub mod errors;
pub mod fold;
pub mod locals;
pub mod rewrite;

pub use access::{AccessMode, access_flags};
pub use binder::{Binder, NullTypeEnv, TypeEnv};
pub use bound::{BoundArena, BoundId, BoundKind, BoundName, BoundNode, BoundTypeRef, ConstValue, NodeData};
pub use errors::BindError;
pub use locals::{LocalsTable, VariableKind};
pub use rewrite::{for_each_child, map_children, rewrite_with, visit_with};
