//! Traversal over the bound tree: read-only visiting and structural
//! rewriting.
//!
//! The rewrite contract: a node none of whose children changed — and that
//! the transform itself leaves alone — keeps its `BoundId`. Passes that run
//! repeatedly (the flow fixpoint, late folding) rely on "same id ⇒
//! unchanged" to skip work, so the rewriter never allocates for a no-op.

use crate::bound::{BoundArena, BoundId, BoundKind, BoundName, BoundTypeRef};
use smallvec::SmallVec;

/// Invoke `f` for each direct child of `kind`, in evaluation order.
pub fn for_each_child(kind: &BoundKind, mut f: impl FnMut(BoundId)) {
    use BoundKind::*;
    let name_child = |n: &BoundName, f: &mut dyn FnMut(BoundId)| {
        if let BoundName::Indirect(id) = n {
            f(*id);
        }
    };
    let class_child = |c: &BoundTypeRef, f: &mut dyn FnMut(BoundId)| {
        if let BoundTypeRef::Indirect(id) = c {
            f(*id);
        }
    };
    match kind {
        Literal | Local { .. } | Lambda { .. } | ErrorEx | EmptyStmt | GlobalDeclStmt { .. }
        | FunctionDeclStmt { .. } | TypeDeclStmt { .. } => {}
        IndirectLocal { name } => f(*name),
        ItemAccess { array, index } => {
            f(*array);
            if let Some(i) = index {
                f(*i);
            }
        }
        FieldAccess { object, field } => {
            f(*object);
            name_child(field, &mut f);
        }
        StaticFieldAccess { class, field } => {
            class_child(class, &mut f);
            name_child(field, &mut f);
        }
        ArrayEx { items } => {
            for (k, v) in items {
                if let Some(k) = k {
                    f(*k);
                }
                f(*v);
            }
        }
        Binary { left, right, .. } => {
            f(*left);
            f(*right);
        }
        Unary { operand, .. } => f(*operand),
        Conditional {
            cond,
            if_true,
            if_false,
        } => {
            f(*cond);
            if let Some(t) = if_true {
                f(*t);
            }
            f(*if_false);
        }
        Assign { target, value }
        | RefAssign { target, value }
        | CompoundAssign { target, value, .. } => {
            f(*value);
            f(*target);
        }
        GlobalCall { args, .. } => args.iter().copied().for_each(f),
        IndirectCall { callee, args } => {
            f(*callee);
            args.iter().copied().for_each(f);
        }
        MethodCall {
            receiver,
            name,
            args,
            ..
        } => {
            f(*receiver);
            name_child(name, &mut f);
            args.iter().copied().for_each(f);
        }
        StaticCall {
            class, name, args, ..
        } => {
            class_child(class, &mut f);
            name_child(name, &mut f);
            args.iter().copied().for_each(f);
        }
        New { class, args } => {
            class_child(class, &mut f);
            args.iter().copied().for_each(f);
        }
        Echo { values } => values.iter().copied().for_each(f),
        Concat { parts } => parts.iter().copied().for_each(f),
        Include { operand, .. } => f(*operand),
        Exit { operand } => {
            if let Some(o) = operand {
                f(*o);
            }
        }
        InstanceOf { value, class } => {
            f(*value);
            class_child(class, &mut f);
        }
        Isset { vars } => vars.iter().copied().for_each(f),
        EmptyEx { operand } => f(*operand),
        ListEx { items } => items.iter().flatten().copied().for_each(f),
        ExpressionStmt { expr } => f(*expr),
        ReturnStmt { value } | YieldStmt { value } => {
            if let Some(v) = value {
                f(*v);
            }
        }
        ThrowStmt { value } => f(*value),
        UnsetStmt { vars } => vars.iter().copied().for_each(f),
        StaticDeclStmt { vars } => {
            for (_, init) in vars {
                if let Some(i) = init {
                    f(*i);
                }
            }
        }
    }
}

/// Clone `kind` with every child id passed through `m`. Returns the new
/// kind and whether any child id actually changed.
pub fn map_children(kind: &BoundKind, mut m: impl FnMut(BoundId) -> BoundId) -> (BoundKind, bool) {
    let mut changed = false;
    let mut map = |id: BoundId| {
        let new = m(id);
        changed |= new != id;
        new
    };
    let map_name = |n: &BoundName, map: &mut dyn FnMut(BoundId) -> BoundId| match n {
        BoundName::Direct(s) => BoundName::Direct(s.clone()),
        BoundName::Indirect(id) => BoundName::Indirect(map(*id)),
    };
    let map_class = |c: &BoundTypeRef, map: &mut dyn FnMut(BoundId) -> BoundId| match c {
        BoundTypeRef::Direct(s) => BoundTypeRef::Direct(s.clone()),
        BoundTypeRef::Indirect(id) => BoundTypeRef::Indirect(map(*id)),
    };
    use BoundKind::*;
    let kind = match kind {
        IndirectLocal { name } => IndirectLocal { name: map(*name) },
        ItemAccess { array, index } => ItemAccess {
            array: map(*array),
            index: index.map(&mut map),
        },
        FieldAccess { object, field } => FieldAccess {
            object: map(*object),
            field: map_name(field, &mut map),
        },
        StaticFieldAccess { class, field } => StaticFieldAccess {
            class: map_class(class, &mut map),
            field: map_name(field, &mut map),
        },
        ArrayEx { items } => ArrayEx {
            items: items
                .iter()
                .map(|(k, v)| (k.map(&mut map), map(*v)))
                .collect(),
        },
        Binary {
            op,
            left,
            right,
            operator,
        } => Binary {
            op: *op,
            left: map(*left),
            right: map(*right),
            operator: *operator,
        },
        Unary { op, operand } => Unary {
            op: *op,
            operand: map(*operand),
        },
        Conditional {
            cond,
            if_true,
            if_false,
        } => Conditional {
            cond: map(*cond),
            if_true: if_true.map(&mut map),
            if_false: map(*if_false),
        },
        Assign { target, value } => Assign {
            value: map(*value),
            target: map(*target),
        },
        RefAssign { target, value } => RefAssign {
            value: map(*value),
            target: map(*target),
        },
        CompoundAssign { op, target, value } => CompoundAssign {
            op: *op,
            value: map(*value),
            target: map(*target),
        },
        GlobalCall {
            name,
            resolved,
            args,
        } => GlobalCall {
            name: name.clone(),
            resolved: *resolved,
            args: args.iter().map(|a| map(*a)).collect(),
        },
        IndirectCall { callee, args } => IndirectCall {
            callee: map(*callee),
            args: args.iter().map(|a| map(*a)).collect(),
        },
        MethodCall {
            receiver,
            name,
            resolved,
            args,
        } => MethodCall {
            receiver: map(*receiver),
            name: map_name(name, &mut map),
            resolved: *resolved,
            args: args.iter().map(|a| map(*a)).collect(),
        },
        StaticCall {
            class,
            name,
            resolved,
            args,
        } => StaticCall {
            class: map_class(class, &mut map),
            name: map_name(name, &mut map),
            resolved: *resolved,
            args: args.iter().map(|a| map(*a)).collect(),
        },
        New { class, args } => New {
            class: map_class(class, &mut map),
            args: args.iter().map(|a| map(*a)).collect(),
        },
        Echo { values } => Echo {
            values: values.iter().map(|v| map(*v)).collect(),
        },
        Concat { parts } => Concat {
            parts: parts.iter().map(|p| map(*p)).collect(),
        },
        Include { kind, operand } => Include {
            kind: *kind,
            operand: map(*operand),
        },
        Exit { operand } => Exit {
            operand: operand.map(&mut map),
        },
        InstanceOf { value, class } => InstanceOf {
            value: map(*value),
            class: map_class(class, &mut map),
        },
        Isset { vars } => Isset {
            vars: vars.iter().map(|v| map(*v)).collect(),
        },
        EmptyEx { operand } => EmptyEx {
            operand: map(*operand),
        },
        ListEx { items } => ListEx {
            items: items.iter().map(|i| i.map(&mut map)).collect(),
        },
        ExpressionStmt { expr } => ExpressionStmt { expr: map(*expr) },
        ReturnStmt { value } => ReturnStmt {
            value: value.map(&mut map),
        },
        YieldStmt { value } => YieldStmt {
            value: value.map(&mut map),
        },
        ThrowStmt { value } => ThrowStmt { value: map(*value) },
        UnsetStmt { vars } => UnsetStmt {
            vars: vars.iter().map(|v| map(*v)).collect(),
        },
        StaticDeclStmt { vars } => StaticDeclStmt {
            vars: vars
                .iter()
                .map(|(n, i)| (n.clone(), i.map(&mut map)))
                .collect(),
        },
        // Leaves carry no child ids.
        other => other.clone(),
    };
    (kind, changed)
}

/// Pre-order read-only walk from `root`.
pub fn visit_with(arena: &BoundArena, root: BoundId, f: &mut impl FnMut(&BoundArena, BoundId)) {
    f(arena, root);
    let mut children: SmallVec<[BoundId; 8]> = SmallVec::new();
    for_each_child(arena.kind(root), |c| children.push(c));
    for child in children {
        visit_with(arena, child, f);
    }
}

/// Bottom-up rewrite from `root`.
///
/// `f` is applied to each node after its children were rewritten; returning
/// `None` keeps the node. The result id equals `root` exactly when nothing
/// under it changed — the no-op rewrite is free.
pub fn rewrite_with<F>(arena: &mut BoundArena, root: BoundId, f: &mut F) -> BoundId
where
    F: FnMut(&mut BoundArena, BoundId) -> Option<BoundId>,
{
    let kind = arena.kind(root).clone();
    // Rewrite children first; only allocate when one of them moved.
    let (new_kind, changed) = map_children(&kind, |c| rewrite_with(arena, c, f));
    let node = if changed {
        let data = arena.data(root).clone();
        arena.alloc(new_kind, data)
    } else {
        root
    };
    f(arena, node).unwrap_or(node)
}
