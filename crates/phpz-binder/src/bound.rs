//! The bound-operation tree.
//!
//! Bound nodes live in a per-routine arena and are addressed by `BoundId`.
//! The arena gives the rewriter its cheap "did anything change" contract: a
//! rewrite yields a new id only when content actually differs, so the same
//! id always means the same node.
//!
//! Expression and statement forms share one closed enum; capabilities
//! ("has access", "has type mask") are plain data on every node rather than
//! virtual dispatch.

use crate::access::AccessMode;
use crate::locals::VariableKind;
use phpz_ast::{BinaryOp, IncludeKind, UnaryOp};
use phpz_common::span::Span;
use phpz_solver::{MethodId, TypeRefMask};
use serde::Serialize;

/// Index of a node in its routine's [`BoundArena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BoundId(pub u32);

/// A compile-time constant value attached to a bound expression.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ConstValue {
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    Str(String),
}

impl ConstValue {
    pub fn type_mask(&self) -> TypeRefMask {
        match self {
            ConstValue::Null => TypeRefMask::NULL,
            ConstValue::Bool(_) => TypeRefMask::BOOLEAN,
            ConstValue::Long(_) => TypeRefMask::LONG,
            ConstValue::Double(_) => TypeRefMask::DOUBLE,
            ConstValue::Str(_) => TypeRefMask::STRING,
        }
    }

    /// PHP truthiness.
    pub fn to_bool(&self) -> bool {
        match self {
            ConstValue::Null => false,
            ConstValue::Bool(b) => *b,
            ConstValue::Long(n) => *n != 0,
            ConstValue::Double(d) => *d != 0.0,
            ConstValue::Str(s) => !s.is_empty() && s != "0",
        }
    }
}

/// A member/field/method name on a bound node: direct, or computed at run
/// time by a bound sub-expression.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum BoundName {
    Direct(String),
    Indirect(BoundId),
}

/// A class reference on a bound node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum BoundTypeRef {
    Direct(String),
    Indirect(BoundId),
}

/// Data common to every bound node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeData {
    pub access: AccessMode,
    /// Filled in (and re-filled) by flow analysis.
    pub type_mask: TypeRefMask,
    pub constant_value: Option<ConstValue>,
    /// Whether evaluating this node needs the execution-context object.
    pub requires_context: bool,
    pub span: Span,
}

impl NodeData {
    pub fn new(access: AccessMode, type_mask: TypeRefMask, span: Span) -> Self {
        Self {
            access,
            type_mask,
            constant_value: None,
            requires_context: false,
            span,
        }
    }
}

/// Every bound expression and statement form.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum BoundKind {
    // ----- expressions -----
    Literal,
    /// A named local/parameter/static/global variable reference.
    Local {
        name: String,
        kind: VariableKind,
    },
    /// `$$name` — variable whose name is computed at run time.
    IndirectLocal {
        name: BoundId,
    },
    ItemAccess {
        array: BoundId,
        /// `None` in append position (`$a[] = ...`).
        index: Option<BoundId>,
    },
    FieldAccess {
        object: BoundId,
        field: BoundName,
    },
    StaticFieldAccess {
        class: BoundTypeRef,
        field: BoundName,
    },
    ArrayEx {
        items: Vec<(Option<BoundId>, BoundId)>,
    },
    Binary {
        op: BinaryOp,
        left: BoundId,
        right: BoundId,
        /// User-defined operator method, when one was resolved.
        operator: Option<MethodId>,
    },
    Unary {
        op: UnaryOp,
        operand: BoundId,
    },
    Conditional {
        cond: BoundId,
        if_true: Option<BoundId>,
        if_false: BoundId,
    },
    Assign {
        target: BoundId,
        value: BoundId,
    },
    RefAssign {
        target: BoundId,
        value: BoundId,
    },
    CompoundAssign {
        op: BinaryOp,
        target: BoundId,
        value: BoundId,
    },
    GlobalCall {
        name: String,
        resolved: bool,
        args: Vec<BoundId>,
    },
    IndirectCall {
        callee: BoundId,
        args: Vec<BoundId>,
    },
    MethodCall {
        receiver: BoundId,
        name: BoundName,
        resolved: Option<MethodId>,
        args: Vec<BoundId>,
    },
    StaticCall {
        class: BoundTypeRef,
        name: BoundName,
        resolved: Option<MethodId>,
        args: Vec<BoundId>,
    },
    New {
        class: BoundTypeRef,
        args: Vec<BoundId>,
    },
    Echo {
        values: Vec<BoundId>,
    },
    Concat {
        parts: Vec<BoundId>,
    },
    Include {
        kind: IncludeKind,
        operand: BoundId,
    },
    Exit {
        operand: Option<BoundId>,
    },
    InstanceOf {
        value: BoundId,
        class: BoundTypeRef,
    },
    Isset {
        vars: Vec<BoundId>,
    },
    EmptyEx {
        operand: BoundId,
    },
    ListEx {
        items: Vec<Option<BoundId>>,
    },
    Lambda {
        uses: Vec<(String, bool)>,
    },
    /// A construct the language permits but that is known to be wrong;
    /// kept as a valid node so analysis continues.
    ErrorEx,

    // ----- statements -----
    ExpressionStmt {
        expr: BoundId,
    },
    ReturnStmt {
        value: Option<BoundId>,
    },
    ThrowStmt {
        value: BoundId,
    },
    UnsetStmt {
        vars: Vec<BoundId>,
    },
    GlobalDeclStmt {
        vars: Vec<String>,
    },
    StaticDeclStmt {
        vars: Vec<(String, Option<BoundId>)>,
    },
    FunctionDeclStmt {
        name: String,
    },
    TypeDeclStmt {
        name: String,
    },
    YieldStmt {
        value: Option<BoundId>,
    },
    EmptyStmt,
}

impl BoundKind {
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            BoundKind::ExpressionStmt { .. }
                | BoundKind::ReturnStmt { .. }
                | BoundKind::ThrowStmt { .. }
                | BoundKind::UnsetStmt { .. }
                | BoundKind::GlobalDeclStmt { .. }
                | BoundKind::StaticDeclStmt { .. }
                | BoundKind::FunctionDeclStmt { .. }
                | BoundKind::TypeDeclStmt { .. }
                | BoundKind::YieldStmt { .. }
                | BoundKind::EmptyStmt
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoundNode {
    pub kind: BoundKind,
    pub data: NodeData,
}

/// Per-routine arena of bound nodes.
#[derive(Clone, Debug, Default)]
pub struct BoundArena {
    nodes: Vec<BoundNode>,
}

impl BoundArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: BoundKind, data: NodeData) -> BoundId {
        let id = BoundId(self.nodes.len() as u32);
        self.nodes.push(BoundNode { kind, data });
        id
    }

    pub fn get(&self, id: BoundId) -> &BoundNode {
        &self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: BoundId) -> &BoundKind {
        &self.get(id).kind
    }

    pub fn data(&self, id: BoundId) -> &NodeData {
        &self.get(id).data
    }

    pub fn type_mask(&self, id: BoundId) -> TypeRefMask {
        self.get(id).data.type_mask
    }

    /// Flow analysis refines masks in place; structure never changes here.
    pub fn set_type_mask(&mut self, id: BoundId, mask: TypeRefMask) {
        self.nodes[id.0 as usize].data.type_mask = mask;
    }

    pub fn constant_value(&self, id: BoundId) -> Option<&ConstValue> {
        self.get(id).data.constant_value.as_ref()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
