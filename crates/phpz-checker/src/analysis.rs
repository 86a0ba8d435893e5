//! The fixpoint driver and its post-analysis queries.

use crate::cfg::{BlockId, ControlFlowGraph, Terminator};
use crate::flow::{FlowContext, FlowState};
use phpz_ast::Routine;
use phpz_binder::{
    AccessMode, BindError, Binder, BoundArena, BoundId, BoundKind, LocalsTable, TypeEnv,
    VariableKind, for_each_child, rewrite_with, visit_with,
};
use phpz_common::diagnostics::{Diagnostic, diagnostic_codes};
use phpz_common::options::AnalysisOptions;
use phpz_solver::{TypeCatalog, TypeRefMask};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The defensive cap tripped; a lattice-height regression, not a
    /// property of the input.
    #[error("flow analysis did not converge within {visits} block visits")]
    IterationLimit { visits: u32 },

    #[error(transparent)]
    Bind(#[from] BindError),
}

/// The binder's type environment during analysis: the processed block's
/// running state.
struct FlowView<'a> {
    names: &'a FxHashMap<String, usize>,
    state: &'a FlowState,
}

impl TypeEnv for FlowView<'_> {
    fn local_mask(&self, name: &str) -> TypeRefMask {
        match self.names.get(name) {
            Some(&slot) => self.state.mask(slot),
            None => TypeRefMask::UNINITIALIZED,
        }
    }
}

/// A routine's completed flow-sensitive analysis.
///
/// Values of this type only exist after the fixpoint has converged
/// (`run` succeeded), so the type-mask queries are always valid on a live
/// value. For a routine whose exit block is unreachable (it can only loop
/// or throw), the masks reflect every program point that was reached.
#[derive(Debug)]
pub struct TypeAnalysis {
    cfg: ControlFlowGraph,
    arena: BoundArena,
    flow: FlowContext,
    locals: LocalsTable,
    diagnostics: Vec<Diagnostic>,
    max_block_visits: u32,
}

impl TypeAnalysis {
    /// Build the CFG for `routine` and run the fixpoint to completion.
    #[tracing::instrument(level = "debug", skip_all, fields(routine = %routine.name))]
    pub fn run(
        routine: &Routine,
        catalog: &dyn TypeCatalog,
        options: &AnalysisOptions,
    ) -> Result<Self, AnalysisError> {
        let mut locals = LocalsTable::new(routine);
        let mut flow = FlowContext::new();
        let mut arena = BoundArena::new();
        let mut cfg = ControlFlowGraph::build(routine.body.clone());

        // Seed the start block: parameters get their declared mask (or
        // anything), locals stay uninitialized.
        let mut seed = FlowState::new();
        for p in &routine.params {
            let mut mask = match &p.hint {
                Some(h) => flow.types.mask_of_hint(h),
                None => TypeRefMask::ANYTHING,
            };
            if p.by_ref {
                mask = mask.with_refs();
            }
            flow.set_var(&mut seed, &p.name, mask);
        }
        if let Some(class) = &routine.this_class {
            let mask = flow.types.class_mask(class);
            flow.set_var(&mut seed, "this", mask);
        }
        cfg.block_mut(cfg.start()).flow_state = Some(seed);

        let mut worklist: VecDeque<BlockId> = VecDeque::new();
        worklist.push_back(cfg.start());
        let mut visits = 0u32;
        let mut per_block_visits: FxHashMap<BlockId, u32> = FxHashMap::default();

        while let Some(bid) = worklist.pop_front() {
            visits += 1;
            if visits > options.max_flow_iterations {
                return Err(AnalysisError::IterationLimit { visits });
            }
            *per_block_visits.entry(bid).or_insert(0) += 1;
            trace!(block = bid.0, visit = visits, "process block");

            let mut state = cfg
                .block(bid)
                .flow_state
                .clone()
                .expect("block enqueued without an entry state");
            if let Some((class, var)) = cfg.block(bid).catch.clone() {
                let mask = flow.types.class_mask(&class);
                flow.set_var(&mut state, &var, mask);
            }
            let entry_snapshot = state.clone();

            // Re-bind each statement against the running state, then apply
            // its transfer function.
            let stmts = cfg.block(bid).stmts.clone();
            let mut bound_ids = Vec::with_capacity(stmts.len());
            for stmt in &stmts {
                let id = {
                    let view = FlowView {
                        names: &flow.names,
                        state: &state,
                    };
                    let mut binder =
                        Binder::new(catalog, &mut flow.types, &mut locals, &view, &mut arena);
                    binder.bind_stmt(stmt)?
                };
                apply_stmt(&arena, &mut flow, &mut state, id);
                bound_ids.push(id);
            }

            let bound_condition = match &cfg.block(bid).terminator {
                Terminator::Branch { condition, .. } => {
                    let condition = condition.clone();
                    let id = {
                        let view = FlowView {
                            names: &flow.names,
                            state: &state,
                        };
                        let mut binder =
                            Binder::new(catalog, &mut flow.types, &mut locals, &view, &mut arena);
                        binder.bind_expr(&condition, AccessMode::read())?
                    };
                    apply_expr(&arena, &mut flow, &mut state, id);
                    Some(id)
                }
                _ => None,
            };

            {
                let block = cfg.block_mut(bid);
                block.bound = bound_ids;
                block.bound_condition = bound_condition;
            }

            // Merge the exit state into every successor; re-enqueue the
            // ones whose entry actually changed.
            for succ in cfg.successors(bid) {
                if merge_into(&mut cfg, succ, &state) && !worklist.contains(&succ) {
                    worklist.push_back(succ);
                }
            }
            // An exception may fire anywhere in the block, so handlers see
            // both the entry and the exit state.
            let exceptional = cfg.block(bid).exceptional.clone();
            for handler in exceptional {
                let mut changed = merge_into(&mut cfg, handler, &entry_snapshot);
                changed |= merge_into(&mut cfg, handler, &state);
                if changed && !worklist.contains(&handler) {
                    worklist.push_back(handler);
                }
            }
        }

        debug!(visits, blocks = cfg.block_count(), "fixpoint reached");

        let mut analysis = Self {
            cfg,
            arena,
            flow,
            locals,
            diagnostics: Vec::new(),
            max_block_visits: per_block_visits.values().copied().max().unwrap_or(0),
        };
        analysis.collect_diagnostics();
        analysis.fold_constants();
        Ok(analysis)
    }

    // =========================================================================
    // Post-analysis queries
    // =========================================================================

    /// Union of all masks ever assigned to a variable across the routine.
    pub fn get_local_type_mask(&self, name: &str) -> TypeRefMask {
        self.flow.accumulated_mask(name)
    }

    /// Like [`get_local_type_mask`](Self::get_local_type_mask), restricted
    /// to declared parameters.
    pub fn get_param_type_mask(&self, name: &str) -> Option<TypeRefMask> {
        match self.locals.kind(name) {
            Some(VariableKind::Parameter | VariableKind::ThisParameter) => {
                Some(self.flow.accumulated_mask(name))
            }
            _ => None,
        }
    }

    /// Union of all `return` operand masks reaching the exit.
    pub fn return_type_mask(&self) -> TypeRefMask {
        self.flow.return_mask()
    }

    pub fn cfg(&self) -> &ControlFlowGraph {
        &self.cfg
    }

    pub fn arena(&self) -> &BoundArena {
        &self.arena
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn flow(&self) -> &FlowContext {
        &self.flow
    }

    pub fn locals(&self) -> &LocalsTable {
        &self.locals
    }

    /// Highest number of times any single block was processed; loops
    /// converge after a handful of revisits.
    pub fn max_block_visits(&self) -> u32 {
        self.max_block_visits
    }

    // =========================================================================
    // Post-fixpoint passes
    // =========================================================================

    /// Source-level problems are reported once, from the final bound tree:
    /// reporting during the fixpoint would duplicate them per pass.
    fn collect_diagnostics(&mut self) {
        let mut undefined_vars: FxHashSet<String> = FxHashSet::default();
        let mut unknown_fns: FxHashSet<String> = FxHashSet::default();
        let mut out = Vec::new();
        for bid in self.cfg.block_ids() {
            let block = self.cfg.block(bid);
            if block.flow_state.is_none() {
                continue; // unreachable
            }
            let roots = block
                .bound
                .iter()
                .copied()
                .chain(block.bound_condition);
            for root in roots {
                visit_with(&self.arena, root, &mut |arena, id| {
                    let node = arena.get(id);
                    match &node.kind {
                        BoundKind::Local {
                            name,
                            kind: VariableKind::Local,
                        } if node.data.access.is_read()
                            && !node.data.access.is_quiet()
                            && node.data.type_mask.is_uninitialized() =>
                        {
                            if undefined_vars.insert(name.clone()) {
                                out.push(Diagnostic::warning(
                                    diagnostic_codes::UNDEFINED_VARIABLE,
                                    node.data.span,
                                    format!("undefined variable ${name}"),
                                ));
                            }
                        }
                        BoundKind::GlobalCall {
                            name,
                            resolved: false,
                            ..
                        } => {
                            if unknown_fns.insert(name.clone()) {
                                out.push(Diagnostic::notice(
                                    diagnostic_codes::UNDEFINED_FUNCTION,
                                    node.data.span,
                                    format!("function {name}() could not be resolved"),
                                ));
                            }
                        }
                        _ => {}
                    }
                });
            }
        }
        self.diagnostics = out;
    }

    /// Replace pure computation nodes whose value is known with literals.
    /// Uses the identity-preserving rewriter, so untouched statements keep
    /// their node ids.
    fn fold_constants(&mut self) {
        let ids: Vec<BlockId> = self.cfg.block_ids().collect();
        for bid in ids {
            let bound = self.cfg.block(bid).bound.clone();
            let folded: Vec<BoundId> = bound
                .iter()
                .map(|&id| {
                    rewrite_with(&mut self.arena, id, &mut |arena, node| {
                        fold_node(arena, node)
                    })
                })
                .collect();
            let cond = self.cfg.block(bid).bound_condition;
            let condition = cond.map(|id| {
                rewrite_with(&mut self.arena, id, &mut |arena, node| {
                    fold_node(arena, node)
                })
            });
            let block = self.cfg.block_mut(bid);
            block.bound = folded;
            block.bound_condition = condition;
        }
    }
}

/// Fold one node to a literal when it is a pure computation with a known
/// value. Nodes with side-effecting descendants are left alone: folding
/// `1 + ($x = 2)` would drop the write.
fn fold_node(arena: &mut BoundArena, id: BoundId) -> Option<BoundId> {
    let node = arena.get(id);
    let foldable = matches!(
        node.kind,
        BoundKind::Binary { .. }
            | BoundKind::Unary { .. }
            | BoundKind::Concat { .. }
            | BoundKind::Conditional { .. }
    );
    if !foldable || node.data.constant_value.is_none() || !is_pure(arena, id) {
        return None;
    }
    let mut data = arena.data(id).clone();
    data.type_mask = data
        .constant_value
        .as_ref()
        .map(|c| c.type_mask())
        .unwrap_or(data.type_mask);
    Some(arena.alloc(BoundKind::Literal, data))
}

/// A subtree is pure when it is built only of literals and operators.
fn is_pure(arena: &BoundArena, id: BoundId) -> bool {
    let pure_kind = matches!(
        arena.kind(id),
        BoundKind::Literal
            | BoundKind::Binary { .. }
            | BoundKind::Unary { .. }
            | BoundKind::Concat { .. }
            | BoundKind::Conditional { .. }
    );
    if !pure_kind {
        return false;
    }
    let mut pure = true;
    for_each_child(arena.kind(id), |c| pure &= is_pure(arena, c));
    pure
}

// =============================================================================
// Transfer functions
// =============================================================================

/// Apply one bound statement's effect on the flow state.
fn apply_stmt(arena: &BoundArena, flow: &mut FlowContext, state: &mut FlowState, id: BoundId) {
    match arena.kind(id).clone() {
        BoundKind::ExpressionStmt { expr } => apply_expr(arena, flow, state, expr),
        BoundKind::ReturnStmt { value } => {
            let mask = match value {
                Some(v) => {
                    apply_expr(arena, flow, state, v);
                    arena.type_mask(v).without(TypeRefMask::UNINITIALIZED)
                }
                None => TypeRefMask::NULL,
            };
            flow.add_return(mask);
        }
        BoundKind::ThrowStmt { value } => apply_expr(arena, flow, state, value),
        BoundKind::UnsetStmt { vars } => {
            for var in vars {
                apply_expr(arena, flow, state, var);
                if let BoundKind::Local { name, .. } = arena.kind(var) {
                    let name = name.clone();
                    flow.set_var(state, &name, TypeRefMask::UNINITIALIZED);
                }
            }
        }
        BoundKind::StaticDeclStmt { vars } => {
            for (name, init) in vars {
                let mask = match init {
                    Some(i) => {
                        apply_expr(arena, flow, state, i);
                        arena.type_mask(i)
                    }
                    None => TypeRefMask::NULL,
                };
                flow.set_var(state, &name, mask);
            }
        }
        BoundKind::GlobalDeclStmt { vars } => {
            // A global binds the local name by reference to a value of
            // statically unknown type.
            for name in vars {
                flow.set_var(state, &name, TypeRefMask::ANYTHING.with_refs());
            }
        }
        BoundKind::YieldStmt { value } => {
            if let Some(v) = value {
                apply_expr(arena, flow, state, v);
            }
        }
        _ => {}
    }
}

/// Apply one bound expression's effects (assignments, increments) on the
/// flow state, children first.
fn apply_expr(arena: &BoundArena, flow: &mut FlowContext, state: &mut FlowState, id: BoundId) {
    match arena.kind(id).clone() {
        BoundKind::Assign { target, value } => {
            apply_expr(arena, flow, state, value);
            apply_expr(arena, flow, state, target);
            let mask = arena.type_mask(value).without(TypeRefMask::UNINITIALIZED);
            assign_target(arena, flow, state, target, mask);
        }
        BoundKind::CompoundAssign { target, value, .. } => {
            apply_expr(arena, flow, state, value);
            apply_expr(arena, flow, state, target);
            assign_target(arena, flow, state, target, arena.type_mask(id));
        }
        BoundKind::RefAssign { target, value } => {
            apply_expr(arena, flow, state, value);
            apply_expr(arena, flow, state, target);
            let mask = arena.type_mask(value).with_refs();
            // Aliasing marks both ends.
            if let BoundKind::Local { name, .. } = arena.kind(value) {
                let name = name.clone();
                flow.set_var(state, &name, mask);
            }
            assign_target(arena, flow, state, target, mask);
        }
        BoundKind::Unary { op, operand }
            if matches!(
                op,
                phpz_ast::UnaryOp::PreInc
                    | phpz_ast::UnaryOp::PreDec
                    | phpz_ast::UnaryOp::PostInc
                    | phpz_ast::UnaryOp::PostDec
            ) =>
        {
            apply_expr(arena, flow, state, operand);
            if let BoundKind::Local { name, .. } = arena.kind(operand) {
                let name = name.clone();
                let mask = arena.type_mask(id).without(TypeRefMask::UNINITIALIZED);
                flow.set_var(state, &name, mask);
            }
        }
        kind => for_each_child(&kind, |child| apply_expr(arena, flow, state, child)),
    }
}

/// Store `mask` through an assignment target.
fn assign_target(
    arena: &BoundArena,
    flow: &mut FlowContext,
    state: &mut FlowState,
    target: BoundId,
    mask: TypeRefMask,
) {
    match arena.kind(target) {
        BoundKind::Local { name, .. } => {
            let name = name.clone();
            flow.set_var(state, &name, mask);
        }
        BoundKind::IndirectLocal { .. } => flow.widen_all(state),
        BoundKind::ItemAccess { array, .. } => ensure_effect(arena, flow, state, *array),
        BoundKind::FieldAccess { object, .. } => ensure_effect(arena, flow, state, *object),
        BoundKind::ListEx { items } => {
            for item in items.clone().into_iter().flatten() {
                assign_target(arena, flow, state, item, TypeRefMask::ANYTHING);
            }
        }
        _ => {}
    }
}

/// Autovivification: writing through a container converts a null/unset base
/// into an array or object, recursively down the access chain.
fn ensure_effect(arena: &BoundArena, flow: &mut FlowContext, state: &mut FlowState, id: BoundId) {
    let access = arena.data(id).access;
    let added = if access.ensure_array() {
        TypeRefMask::ARRAY
    } else if access.ensure_object() {
        TypeRefMask::OBJECT
    } else {
        return;
    };
    match arena.kind(id) {
        BoundKind::Local { name, .. } => {
            let name = name.clone();
            let slot = flow.slot(&name);
            let vivified = state
                .mask(slot)
                .without(TypeRefMask::NULL | TypeRefMask::UNINITIALIZED)
                .merge(added);
            flow.set_var(state, &name, vivified);
        }
        BoundKind::ItemAccess { array, .. } => ensure_effect(arena, flow, state, *array),
        BoundKind::FieldAccess { object, .. } => ensure_effect(arena, flow, state, *object),
        BoundKind::IndirectLocal { .. } => flow.widen_all(state),
        _ => {}
    }
}

fn merge_into(cfg: &mut ControlFlowGraph, target: BlockId, state: &FlowState) -> bool {
    let block = cfg.block_mut(target);
    match &mut block.flow_state {
        Some(existing) => existing.merge_with(state),
        None => {
            block.flow_state = Some(state.clone());
            true
        }
    }
}
