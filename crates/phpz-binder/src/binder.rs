//! The semantic binder.
//!
//! `bind_stmt`/`bind_expr` translate one syntax node into bound nodes under
//! a desired [`AccessMode`]. The access of a parent determines the access
//! requested from each child; this is where autovivification, reference
//! assignment, and quiet reads are decided:
//!
//! - assignment targets bind with write access, `=&` targets with write-ref
//! - an item write rebinds the array base with ensure-array, so a null/unset
//!   base becomes an array instead of erroring
//! - a member write on a chain rebinds the left-hand object with
//!   ensure-object
//! - `isset`/`empty` operands bind quietly, suppressing missing-variable
//!   diagnostics
//!
//! The binder reads variable types from a [`TypeEnv`] snapshot supplied by
//! the caller. During flow analysis that snapshot is the block's current
//! entry state, and the binder is re-invoked as the state refines; it keeps
//! no per-node cache, so repeated invocation cannot desynchronize.

use crate::access::AccessMode;
use crate::bound::{
    BoundArena, BoundId, BoundKind, BoundName, BoundTypeRef, ConstValue, NodeData,
};
use crate::errors::BindError;
use crate::fold;
use crate::locals::{LocalsTable, VariableKind};
use phpz_ast::{Arg, BinaryOp, CallTarget, ClassRef, Expr, Lit, MemberName, Stmt, UnaryOp, VarName};
use phpz_common::limits;
use phpz_common::span::{Span, Spanned};
use phpz_solver::{
    OperatorQuery, Repr, TypeCatalog, TypeRefContext, TypeRefMask, expression_ops,
};
use tracing::trace;

/// The binder's view of variable types at the program point being bound.
pub trait TypeEnv {
    fn local_mask(&self, name: &str) -> TypeRefMask;
}

/// A type environment with no knowledge: every variable is unassigned.
/// Used for binding outside flow analysis (tests, one-shot queries).
pub struct NullTypeEnv;

impl TypeEnv for NullTypeEnv {
    fn local_mask(&self, _name: &str) -> TypeRefMask {
        TypeRefMask::UNINITIALIZED
    }
}

type BindResult = Result<BoundId, BindError>;

/// One binder invocation. Cheap to construct; the flow analysis builds a
/// fresh one per statement per pass.
pub struct Binder<'a> {
    catalog: &'a dyn TypeCatalog,
    types: &'a mut TypeRefContext,
    locals: &'a mut LocalsTable,
    env: &'a dyn TypeEnv,
    arena: &'a mut BoundArena,
    depth: u32,
}

impl<'a> Binder<'a> {
    pub fn new(
        catalog: &'a dyn TypeCatalog,
        types: &'a mut TypeRefContext,
        locals: &'a mut LocalsTable,
        env: &'a dyn TypeEnv,
        arena: &'a mut BoundArena,
    ) -> Self {
        Self {
            catalog,
            types,
            locals,
            env,
            arena,
            depth: 0,
        }
    }

    fn alloc(&mut self, kind: BoundKind, data: NodeData) -> BoundId {
        self.arena.alloc(kind, data)
    }

    fn requires_context(&self, id: BoundId) -> bool {
        self.arena.data(id).requires_context
    }

    fn propagate_context(&self, children: &[BoundId]) -> bool {
        children.iter().any(|&c| self.requires_context(c))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    #[tracing::instrument(level = "trace", skip_all)]
    pub fn bind_stmt(&mut self, stmt: &Stmt) -> BindResult {
        let span = stmt.span();
        match stmt {
            Stmt::Expression { expr, .. } => {
                let bound = self.bind_expr(expr, AccessMode::none())?;
                let mut data = NodeData::new(AccessMode::none(), TypeRefMask::NONE, span);
                data.requires_context = self.requires_context(bound);
                Ok(self.alloc(BoundKind::ExpressionStmt { expr: bound }, data))
            }
            Stmt::Echo { values, .. } => {
                let bound = self.bind_all(values, AccessMode::read())?;
                let mut echo_data = NodeData::new(AccessMode::none(), TypeRefMask::NONE, span);
                echo_data.requires_context = true;
                let echo = self.alloc(BoundKind::Echo { values: bound }, echo_data);
                let mut data = NodeData::new(AccessMode::none(), TypeRefMask::NONE, span);
                data.requires_context = true;
                Ok(self.alloc(BoundKind::ExpressionStmt { expr: echo }, data))
            }
            Stmt::Return { value, .. } => {
                let bound = match value {
                    Some(v) => Some(self.bind_expr(v, AccessMode::read())?),
                    None => None,
                };
                let mut data = NodeData::new(AccessMode::none(), TypeRefMask::NONE, span);
                data.requires_context = bound.is_some_and(|b| self.requires_context(b));
                Ok(self.alloc(BoundKind::ReturnStmt { value: bound }, data))
            }
            Stmt::Throw { value, .. } => {
                let bound = self.bind_expr(value, AccessMode::read())?;
                let mut data = NodeData::new(AccessMode::none(), TypeRefMask::NONE, span);
                data.requires_context = self.requires_context(bound);
                Ok(self.alloc(BoundKind::ThrowStmt { value: bound }, data))
            }
            Stmt::Unset { vars, .. } => {
                let bound = self.bind_all(vars, AccessMode::unset())?;
                let data = NodeData::new(AccessMode::none(), TypeRefMask::NONE, span);
                Ok(self.alloc(BoundKind::UnsetStmt { vars: bound }, data))
            }
            Stmt::GlobalDecl { vars, .. } => {
                for name in vars {
                    self.locals.mark(name, VariableKind::GlobalVariable);
                }
                let mut data = NodeData::new(AccessMode::none(), TypeRefMask::NONE, span);
                data.requires_context = true;
                Ok(self.alloc(BoundKind::GlobalDeclStmt { vars: vars.clone() }, data))
            }
            Stmt::StaticDecl { vars, .. } => {
                let mut bound = Vec::with_capacity(vars.len());
                for (name, init) in vars {
                    self.locals.mark(name, VariableKind::StaticLocal);
                    let init = match init {
                        Some(e) => Some(self.bind_expr(e, AccessMode::read())?),
                        None => None,
                    };
                    bound.push((name.clone(), init));
                }
                let mut data = NodeData::new(AccessMode::none(), TypeRefMask::NONE, span);
                data.requires_context = true;
                Ok(self.alloc(BoundKind::StaticDeclStmt { vars: bound }, data))
            }
            Stmt::FunctionDecl { routine, .. } => {
                let mut data = NodeData::new(AccessMode::none(), TypeRefMask::NONE, span);
                data.requires_context = true;
                Ok(self.alloc(
                    BoundKind::FunctionDeclStmt {
                        name: routine.name.clone(),
                    },
                    data,
                ))
            }
            Stmt::TypeDecl { name, .. } => {
                let mut data = NodeData::new(AccessMode::none(), TypeRefMask::NONE, span);
                data.requires_context = true;
                Ok(self.alloc(BoundKind::TypeDeclStmt { name: name.clone() }, data))
            }
            Stmt::YieldStmt { value, .. } => {
                let bound = match value {
                    Some(v) => Some(self.bind_expr(v, AccessMode::read())?),
                    None => None,
                };
                let mut data = NodeData::new(AccessMode::none(), TypeRefMask::ANYTHING, span);
                data.requires_context = true;
                Ok(self.alloc(BoundKind::YieldStmt { value: bound }, data))
            }
            Stmt::Empty { .. } => {
                let data = NodeData::new(AccessMode::none(), TypeRefMask::NONE, span);
                Ok(self.alloc(BoundKind::EmptyStmt, data))
            }
            // Structured statements are lowered to blocks and edges by the
            // control-flow graph builder before binding ever sees them.
            Stmt::If { .. }
            | Stmt::While { .. }
            | Stmt::DoWhile { .. }
            | Stmt::For { .. }
            | Stmt::TryCatch { .. }
            | Stmt::Block { .. } => Err(BindError::NotImplemented {
                construct: "structured statement outside a control-flow graph",
                span,
            }),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn bind_expr(&mut self, expr: &Expr, access: AccessMode) -> BindResult {
        self.depth += 1;
        if self.depth > limits::MAX_BIND_DEPTH {
            return Err(BindError::TooDeep { span: expr.span() });
        }
        let result = self.bind_expr_inner(expr, access);
        self.depth -= 1;
        result
    }

    fn bind_expr_inner(&mut self, expr: &Expr, access: AccessMode) -> BindResult {
        let span = expr.span();
        match expr {
            Expr::Literal { value, .. } => self.bind_literal(value, access, span),
            Expr::Variable { name, .. } => self.bind_variable(name, access, span),
            Expr::ItemAccess { array, index, .. } => {
                self.bind_item_access(array, index.as_deref(), access, span)
            }
            Expr::FieldAccess { object, field, .. } => {
                self.bind_field_access(object, field, access, span)
            }
            Expr::StaticFieldAccess { class, field, .. } => {
                let class = self.bind_class_ref(class)?;
                let field = self.bind_member_name(field)?;
                let mut data = NodeData::new(access, TypeRefMask::ANYTHING, span);
                data.requires_context = true;
                Ok(self.alloc(BoundKind::StaticFieldAccess { class, field }, data))
            }
            Expr::Binary {
                op, left, right, ..
            } => self.bind_binary(*op, left, right, access, span),
            Expr::Unary { op, operand, .. } => self.bind_unary(*op, operand, access, span),
            Expr::Conditional {
                cond,
                if_true,
                if_false,
                ..
            } => self.bind_conditional(cond, if_true.as_deref(), if_false, access, span),
            Expr::Assign { target, value, .. } => self.bind_assign(target, value, access, span),
            Expr::RefAssign { target, value, .. } => {
                self.bind_ref_assign(target, value, access, span)
            }
            Expr::CompoundAssign {
                op, target, value, ..
            } => self.bind_compound_assign(*op, target, value, access, span),
            Expr::Call { target, args, .. } => self.bind_call(target, args, access, span),
            Expr::New { class, args, .. } => self.bind_new(class, args, access, span),
            Expr::InstanceOf { value, class, .. } => {
                let bound = self.bind_expr(value, AccessMode::read())?;
                let class = self.bind_class_ref(class)?;
                let mut data = NodeData::new(access, TypeRefMask::BOOLEAN, span);
                data.requires_context = self.requires_context(bound);
                Ok(self.alloc(
                    BoundKind::InstanceOf {
                        value: bound,
                        class,
                    },
                    data,
                ))
            }
            Expr::Isset { vars, .. } => {
                let bound = self.bind_all(vars, AccessMode::isset())?;
                let data = NodeData::new(access, TypeRefMask::BOOLEAN, span);
                Ok(self.alloc(BoundKind::Isset { vars: bound }, data))
            }
            Expr::EmptyEx { operand, .. } => {
                let bound = self.bind_expr(operand, AccessMode::read_quiet())?;
                let data = NodeData::new(access, TypeRefMask::BOOLEAN, span);
                Ok(self.alloc(BoundKind::EmptyEx { operand: bound }, data))
            }
            Expr::ListEx { items, .. } => self.bind_list(items, access, span),
            Expr::Lambda { uses, .. } => {
                // The closure body is its own routine; here only the capture
                // list matters.
                for (name, _) in uses {
                    self.locals.ensure(name);
                }
                let mut data = NodeData::new(access, TypeRefMask::LAMBDA, span);
                data.requires_context = true;
                Ok(self.alloc(BoundKind::Lambda { uses: uses.clone() }, data))
            }
            Expr::Concat { parts, .. } => {
                let bound = self.bind_all(parts, AccessMode::read())?;
                let mut data = NodeData::new(access, TypeRefMask::STRING, span);
                data.requires_context = self.propagate_context(&bound);
                data.constant_value = self.fold_concat(&bound);
                Ok(self.alloc(BoundKind::Concat { parts: bound }, data))
            }
            Expr::Include { kind, operand, .. } => {
                let bound = self.bind_expr(operand, AccessMode::read())?;
                let mut data = NodeData::new(access, TypeRefMask::ANYTHING, span);
                data.requires_context = true;
                Ok(self.alloc(
                    BoundKind::Include {
                        kind: *kind,
                        operand: bound,
                    },
                    data,
                ))
            }
            Expr::ExitEx { operand, .. } => {
                let bound = match operand {
                    Some(o) => Some(self.bind_expr(o, AccessMode::read())?),
                    None => None,
                };
                let mut data = NodeData::new(access, TypeRefMask::NONE, span);
                data.requires_context = true;
                Ok(self.alloc(BoundKind::Exit { operand: bound }, data))
            }
        }
    }

    fn bind_all(&mut self, exprs: &[Expr], access: AccessMode) -> Result<Vec<BoundId>, BindError> {
        let mut out = Vec::with_capacity(exprs.len());
        for e in exprs {
            out.push(self.bind_expr(e, access)?);
        }
        Ok(out)
    }

    fn bind_literal(&mut self, value: &Lit, access: AccessMode, span: Span) -> BindResult {
        if let Lit::Array(items) = value {
            let mut bound = Vec::with_capacity(items.len());
            for (key, val) in items {
                let key = match key {
                    Some(k) => Some(self.bind_expr(k, AccessMode::read())?),
                    None => None,
                };
                bound.push((key, self.bind_expr(val, AccessMode::read())?));
            }
            let mut data = NodeData::new(access, TypeRefMask::ARRAY, span);
            data.requires_context = {
                let mut rc = false;
                for (k, v) in &bound {
                    rc |= k.is_some_and(|k| self.requires_context(k));
                    rc |= self.requires_context(*v);
                }
                rc
            };
            return Ok(self.alloc(BoundKind::ArrayEx { items: bound }, data));
        }
        let constant = fold::const_of_literal(value);
        let mask = constant
            .as_ref()
            .map(ConstValue::type_mask)
            .unwrap_or(TypeRefMask::ANYTHING);
        let mut data = NodeData::new(access, mask, span);
        data.constant_value = constant;
        Ok(self.alloc(BoundKind::Literal, data))
    }

    fn bind_variable(&mut self, name: &VarName, access: AccessMode, span: Span) -> BindResult {
        match name {
            VarName::Direct(name) => {
                let kind = self.locals.ensure(name);
                let mut mask = match kind {
                    VariableKind::GlobalVariable => TypeRefMask::ANYTHING,
                    _ => self.env.local_mask(name),
                };
                if access.is_read_ref() || access.is_write_ref() {
                    mask = mask.with_refs();
                }
                let mut data = NodeData::new(access, mask, span);
                data.requires_context = matches!(
                    kind,
                    VariableKind::GlobalVariable | VariableKind::IndirectLocal
                );
                trace!(%name, ?kind, ?access, "bind variable");
                Ok(self.alloc(
                    BoundKind::Local {
                        name: name.clone(),
                        kind,
                    },
                    data,
                ))
            }
            VarName::Indirect(name_expr) => {
                let bound = self.bind_expr(name_expr, AccessMode::read())?;
                let mut data = NodeData::new(access, TypeRefMask::ANYTHING, span);
                data.requires_context = true;
                Ok(self.alloc(BoundKind::IndirectLocal { name: bound }, data))
            }
        }
    }

    /// The container access an item/field access requests from its base.
    ///
    /// A write or ensure through `$a[...]` must materialize `$a` as an
    /// array (autovivification); `unset` and `isset` must not create
    /// anything; quiet-ness propagates down the chain.
    fn base_access_for(&self, access: AccessMode, ensure_object: bool) -> AccessMode {
        let mut base = if access.is_unset() || access.is_isset() {
            AccessMode::read_quiet()
        } else if access.might_change() {
            if ensure_object {
                AccessMode::read().with_ensure_object()
            } else {
                AccessMode::read().with_ensure_array()
            }
        } else {
            AccessMode::read()
        };
        if access.is_quiet() {
            base = base.with_quiet();
        }
        base
    }

    fn bind_item_access(
        &mut self,
        array: &Expr,
        index: Option<&Expr>,
        access: AccessMode,
        span: Span,
    ) -> BindResult {
        let base_access = self.base_access_for(access, false);
        let base = self.bind_expr(array, base_access)?;
        let index = match index {
            Some(i) => Some(self.bind_expr(i, AccessMode::read().with_not_ref())?),
            None => None,
        };
        // The element's kind is unknown statically.
        let mut mask = TypeRefMask::ANYTHING;
        if access.is_read_ref() || access.is_write_ref() {
            mask = mask.with_refs();
        }
        let mut data = NodeData::new(access, mask, span);
        data.requires_context =
            self.requires_context(base) || index.is_some_and(|i| self.requires_context(i));
        Ok(self.alloc(BoundKind::ItemAccess { array: base, index }, data))
    }

    fn bind_field_access(
        &mut self,
        object: &Expr,
        field: &MemberName,
        access: AccessMode,
        span: Span,
    ) -> BindResult {
        let base_access = self.base_access_for(access, true);
        let object = self.bind_expr(object, base_access)?;
        let field = self.bind_member_name(field)?;
        let mut mask = TypeRefMask::ANYTHING;
        if access.is_read_ref() || access.is_write_ref() {
            mask = mask.with_refs();
        }
        let mut data = NodeData::new(access, mask, span);
        data.requires_context = self.requires_context(object);
        Ok(self.alloc(BoundKind::FieldAccess { object, field }, data))
    }

    fn bind_member_name(&mut self, name: &MemberName) -> Result<BoundName, BindError> {
        Ok(match name {
            MemberName::Direct(s) => BoundName::Direct(s.clone()),
            MemberName::Indirect(e) => {
                BoundName::Indirect(self.bind_expr(e, AccessMode::read())?)
            }
        })
    }

    fn bind_class_ref(&mut self, class: &ClassRef) -> Result<BoundTypeRef, BindError> {
        Ok(match class {
            ClassRef::Direct(s) => BoundTypeRef::Direct(s.clone()),
            ClassRef::Indirect(e) => {
                BoundTypeRef::Indirect(self.bind_expr(e, AccessMode::read())?)
            }
        })
    }

    fn bind_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        access: AccessMode,
        span: Span,
    ) -> BindResult {
        // `??` quietly probes its left side.
        let left_access = if op == BinaryOp::Coalesce {
            AccessMode::read_quiet()
        } else {
            AccessMode::read().with_not_ref()
        };
        let left = self.bind_expr(left, left_access)?;
        let right = self.bind_expr(right, AccessMode::read().with_not_ref())?;

        let lmask = self.arena.type_mask(left);
        let rmask = self.arena.type_mask(right);
        let mut mask = expression_ops::binary_op_mask(op, lmask, rmask);

        // A class-typed left operand may carry a user-defined operator.
        let mut operator = None;
        if let Some(names) = operator_method_names(op) {
            let catalog = self.catalog;
            let receiver = self
                .types
                .single_class_of(lmask)
                .and_then(|name| catalog.class_by_name(name));
            if let Some(receiver) = receiver {
                let operand = self.types.repr_of_mask(rmask, catalog);
                let query = OperatorQuery {
                    receiver,
                    has_ref: lmask.is_ref(),
                    names,
                    extensions: &[],
                    operand: operand.as_ref(),
                    target: None,
                };
                if let Some(method) = phpz_solver::resolve_operator(catalog, &query) {
                    let ret = catalog
                        .methods_of(method.class)
                        .get(method.index as usize)
                        .map(|sig| sig.ret.clone())
                        .unwrap_or(Repr::PhpValue);
                    mask = self.types.mask_of_repr(&ret, catalog);
                    operator = Some(method);
                }
            }
        }

        let mut data = NodeData::new(access, mask, span);
        data.requires_context =
            self.requires_context(left) || self.requires_context(right);
        data.constant_value = match (
            self.arena.constant_value(left),
            self.arena.constant_value(right),
        ) {
            (Some(l), Some(r)) => fold::eval_binary(op, l, r),
            _ => None,
        };
        if let Some(c) = &data.constant_value {
            data.type_mask = c.type_mask();
        }
        Ok(self.alloc(
            BoundKind::Binary {
                op,
                left,
                right,
                operator,
            },
            data,
        ))
    }

    fn bind_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        access: AccessMode,
        span: Span,
    ) -> BindResult {
        let operand_access = match op {
            UnaryOp::Silence => AccessMode::read_quiet(),
            // `$x++` both reads and writes its operand.
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                AccessMode::read().with_write(TypeRefMask::NUMBER)
            }
            _ => AccessMode::read().with_not_ref(),
        };
        let bound = self.bind_expr(operand, operand_access)?;
        let omask = self.arena.type_mask(bound);
        let mut data = NodeData::new(access, expression_ops::unary_op_mask(op, omask), span);
        data.requires_context = self.requires_context(bound);
        data.constant_value = self
            .arena
            .constant_value(bound)
            .and_then(|v| fold::eval_unary(op, v));
        if let Some(c) = &data.constant_value {
            data.type_mask = c.type_mask();
        }
        Ok(self.alloc(BoundKind::Unary { op, operand: bound }, data))
    }

    fn bind_conditional(
        &mut self,
        cond: &Expr,
        if_true: Option<&Expr>,
        if_false: &Expr,
        access: AccessMode,
        span: Span,
    ) -> BindResult {
        let cond = self.bind_expr(cond, AccessMode::read())?;
        let if_true = match if_true {
            Some(t) => Some(self.bind_expr(t, AccessMode::read())?),
            None => None,
        };
        let if_false = self.bind_expr(if_false, AccessMode::read())?;

        let cond_mask = self.arena.type_mask(cond);
        let true_mask = match if_true {
            Some(t) => self.arena.type_mask(t),
            // Short form `?:` yields the (truthy) condition itself.
            None => cond_mask.without(TypeRefMask::NULL | TypeRefMask::UNINITIALIZED),
        };
        let mask = true_mask.merge(self.arena.type_mask(if_false));

        let mut data = NodeData::new(access, mask, span);
        data.requires_context = self.requires_context(cond)
            || if_true.is_some_and(|t| self.requires_context(t))
            || self.requires_context(if_false);
        if let Some(c) = self.arena.constant_value(cond) {
            let branch = if c.to_bool() { if_true } else { Some(if_false) };
            data.constant_value = match branch {
                Some(b) => self.arena.constant_value(b).cloned(),
                None => self.arena.constant_value(cond).cloned(),
            };
            if let Some(cv) = &data.constant_value {
                data.type_mask = cv.type_mask();
            }
        }
        Ok(self.alloc(
            BoundKind::Conditional {
                cond,
                if_true,
                if_false,
            },
            data,
        ))
    }

    /// Bind an assignment target. A target shape the language permits but
    /// that can never be written (`f() = ...`) binds to an error-marker
    /// node, not a binder failure: analysis and diagnostics keep going.
    fn bind_target(&mut self, target: &Expr, access: AccessMode) -> BindResult {
        match target {
            Expr::Variable { .. }
            | Expr::ItemAccess { .. }
            | Expr::FieldAccess { .. }
            | Expr::StaticFieldAccess { .. }
            | Expr::ListEx { .. } => self.bind_expr(target, access),
            _ => {
                let data = NodeData::new(access, TypeRefMask::NONE, target.span());
                Ok(self.alloc(BoundKind::ErrorEx, data))
            }
        }
    }

    fn bind_assign(
        &mut self,
        target: &Expr,
        value: &Expr,
        access: AccessMode,
        span: Span,
    ) -> BindResult {
        let value = self.bind_expr(value, AccessMode::read())?;
        let value_mask = self.arena.type_mask(value).without_refs();
        let target = self.bind_target(target, AccessMode::write(value_mask))?;
        let mut data = NodeData::new(access, value_mask, span);
        data.requires_context =
            self.requires_context(target) || self.requires_context(value);
        data.constant_value = self.arena.constant_value(value).cloned();
        Ok(self.alloc(BoundKind::Assign { target, value }, data))
    }

    fn bind_ref_assign(
        &mut self,
        target: &Expr,
        value: &Expr,
        access: AccessMode,
        span: Span,
    ) -> BindResult {
        let value = self.bind_expr(value, AccessMode::read().with_read_ref())?;
        let value_mask = self.arena.type_mask(value).with_refs();
        let target = self.bind_target(target, AccessMode::write_ref(value_mask))?;
        let mut data = NodeData::new(access, value_mask, span);
        data.requires_context =
            self.requires_context(target) || self.requires_context(value);
        Ok(self.alloc(BoundKind::RefAssign { target, value }, data))
    }

    fn bind_compound_assign(
        &mut self,
        op: BinaryOp,
        target: &Expr,
        value: &Expr,
        access: AccessMode,
        span: Span,
    ) -> BindResult {
        let value = self.bind_expr(value, AccessMode::read())?;
        // The target is both read (current value feeds the operation) and
        // written (with the operation's result).
        let target_read_mask = match target {
            Expr::Variable {
                name: VarName::Direct(n),
                ..
            } => self.env.local_mask(n),
            _ => TypeRefMask::ANYTHING,
        };
        let result_mask = expression_ops::binary_op_mask(
            op,
            target_read_mask,
            self.arena.type_mask(value),
        );
        let target = self.bind_target(target, AccessMode::read().with_write(result_mask))?;
        let mut data = NodeData::new(access, result_mask, span);
        data.requires_context =
            self.requires_context(target) || self.requires_context(value);
        Ok(self.alloc(BoundKind::CompoundAssign { op, target, value }, data))
    }

    fn bind_list(
        &mut self,
        items: &[Option<Expr>],
        access: AccessMode,
        span: Span,
    ) -> BindResult {
        // Destructuring elements are write targets; element types are
        // unknown statically.
        let mut bound = Vec::with_capacity(items.len());
        for item in items {
            bound.push(match item {
                Some(e) => Some(self.bind_expr(e, AccessMode::write(TypeRefMask::ANYTHING))?),
                None => None,
            });
        }
        let data = NodeData::new(access, TypeRefMask::ARRAY, span);
        Ok(self.alloc(BoundKind::ListEx { items: bound }, data))
    }

    fn bind_call(
        &mut self,
        target: &CallTarget,
        args: &[Arg],
        access: AccessMode,
        span: Span,
    ) -> BindResult {
        let mut bound_args = Vec::with_capacity(args.len());
        for arg in args {
            bound_args.push(self.bind_expr(&arg.value, AccessMode::read())?);
        }
        let kind;
        let mut mask = TypeRefMask::ANYTHING;
        match target {
            CallTarget::Function(name) => {
                let resolved = match self.catalog.function(name) {
                    Some(info) => {
                        // Fixed non-goal: calls binding to a by-reference
                        // parameter abort the routine.
                        if info.has_by_ref_param() {
                            return Err(BindError::ByRefParameter {
                                routine: name.clone(),
                                span,
                            });
                        }
                        let ret = info.ret.clone();
                        mask = self.types.mask_of_repr(&ret, self.catalog);
                        true
                    }
                    None => false,
                };
                kind = BoundKind::GlobalCall {
                    name: name.clone(),
                    resolved,
                    args: bound_args,
                };
            }
            CallTarget::IndirectFunction(callee) => {
                let callee = self.bind_expr(callee, AccessMode::read())?;
                kind = BoundKind::IndirectCall {
                    callee,
                    args: bound_args,
                };
            }
            CallTarget::Method { receiver, name } => {
                let receiver = self.bind_expr(receiver, AccessMode::read())?;
                let name = self.bind_member_name(name)?;
                let rmask = self.arena.type_mask(receiver);
                let resolved = self.resolve_instance_method(rmask, &name);
                if let Some(m) = resolved {
                    let ret = self.catalog.methods_of(m.class)[m.index as usize].ret.clone();
                    mask = self.types.mask_of_repr(&ret, self.catalog);
                }
                kind = BoundKind::MethodCall {
                    receiver,
                    name,
                    resolved,
                    args: bound_args,
                };
            }
            CallTarget::StaticMethod { class, name } => {
                let class = self.bind_class_ref(class)?;
                let name = self.bind_member_name(name)?;
                let resolved = match (&class, &name) {
                    (BoundTypeRef::Direct(cls), BoundName::Direct(m)) => self
                        .catalog
                        .class_by_name(cls)
                        .and_then(|id| self.find_method(id, m)),
                    _ => None,
                };
                if let Some(m) = resolved {
                    let ret = self.catalog.methods_of(m.class)[m.index as usize].ret.clone();
                    mask = self.types.mask_of_repr(&ret, self.catalog);
                }
                kind = BoundKind::StaticCall {
                    class,
                    name,
                    resolved,
                    args: bound_args,
                };
            }
        }
        let mut data = NodeData::new(access, mask, span);
        data.requires_context = true;
        Ok(self.alloc(kind, data))
    }

    fn resolve_instance_method(
        &mut self,
        receiver_mask: TypeRefMask,
        name: &BoundName,
    ) -> Option<phpz_solver::MethodId> {
        let BoundName::Direct(method) = name else {
            return None;
        };
        let class_name = self.types.single_class_of(receiver_mask)?.to_string();
        let class = self.catalog.class_by_name(&class_name)?;
        self.find_method(class, method)
    }

    fn find_method(
        &self,
        class: phpz_solver::ClassId,
        name: &str,
    ) -> Option<phpz_solver::MethodId> {
        for c in phpz_solver::catalog::hierarchy(self.catalog, class) {
            if let Some(index) = self
                .catalog
                .methods_of(c)
                .iter()
                .position(|m| m.name == name)
            {
                return Some(phpz_solver::MethodId {
                    class: c,
                    index: index as u32,
                });
            }
        }
        None
    }

    fn bind_new(
        &mut self,
        class: &ClassRef,
        args: &[Arg],
        access: AccessMode,
        span: Span,
    ) -> BindResult {
        let mut bound_args = Vec::with_capacity(args.len());
        for arg in args {
            bound_args.push(self.bind_expr(&arg.value, AccessMode::read())?);
        }
        let class = self.bind_class_ref(class)?;
        let mask = match &class {
            BoundTypeRef::Direct(name) => self.types.class_mask(name),
            BoundTypeRef::Indirect(_) => TypeRefMask::OBJECT,
        };
        let mut data = NodeData::new(access, mask, span);
        data.requires_context = true;
        Ok(self.alloc(
            BoundKind::New {
                class,
                args: bound_args,
            },
            data,
        ))
    }

    fn fold_concat(&self, parts: &[BoundId]) -> Option<ConstValue> {
        let mut folded = ConstValue::Str(String::new());
        for &p in parts {
            let c = self.arena.constant_value(p)?;
            folded = fold::eval_binary(BinaryOp::Concat, &folded, c)?;
        }
        Some(folded)
    }
}

/// Candidate method names for a user-defined binary operator.
fn operator_method_names(op: BinaryOp) -> Option<&'static [&'static str]> {
    Some(match op {
        BinaryOp::Add => &["op_Addition"],
        BinaryOp::Sub => &["op_Subtraction"],
        BinaryOp::Mul => &["op_Multiply"],
        BinaryOp::Div => &["op_Division"],
        BinaryOp::Concat => &["op_Concat", "ToString", "__toString"],
        BinaryOp::Eq => &["op_Equality", "Equals"],
        BinaryOp::NotEq => &["op_Inequality"],
        _ => return None,
    })
}
