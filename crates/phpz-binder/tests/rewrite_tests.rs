//! The identity-preserving rewrite contract.

use phpz_ast::{BinaryOp, Expr, Routine};
use phpz_binder::{
    AccessMode, Binder, BoundArena, BoundId, BoundKind, ConstValue, LocalsTable, NullTypeEnv,
    rewrite_with, visit_with,
};
use phpz_common::span::Span;
use phpz_solver::{SimpleCatalog, TypeRefContext};

fn sp() -> Span {
    Span::ZERO
}

fn bind(expr: &Expr) -> (BoundArena, BoundId) {
    let routine = Routine::function("test", vec![], vec![]);
    let mut locals = LocalsTable::new(&routine);
    let mut types = TypeRefContext::new();
    let cat = SimpleCatalog::new();
    let mut arena = BoundArena::new();
    let mut binder = Binder::new(&cat, &mut types, &mut locals, &NullTypeEnv, &mut arena);
    let root = binder.bind_expr(expr, AccessMode::read()).expect("bind");
    (arena, root)
}

fn sample_expr() -> Expr {
    // $x + ($y * 2)
    Expr::Binary {
        op: BinaryOp::Add,
        left: Box::new(Expr::var("x", sp())),
        right: Box::new(Expr::Binary {
            op: BinaryOp::Mul,
            left: Box::new(Expr::var("y", sp())),
            right: Box::new(Expr::long(2, sp())),
            span: sp(),
        }),
        span: sp(),
    }
}

#[test]
fn no_op_rewrite_returns_the_same_id() {
    let (mut arena, root) = bind(&sample_expr());
    let before = arena.len();
    let rewritten = rewrite_with(&mut arena, root, &mut |_, _| None);
    assert_eq!(rewritten, root);
    // A no-op rewrite allocates nothing at all.
    assert_eq!(arena.len(), before);
}

#[test]
fn changing_a_leaf_reallocates_only_the_spine() {
    let (mut arena, root) = bind(&sample_expr());
    let before = arena.len();
    // Replace the literal 2 with the literal 3.
    let rewritten = rewrite_with(&mut arena, root, &mut |arena, id| {
        if arena.constant_value(id) == Some(&ConstValue::Long(2)) {
            let mut data = arena.data(id).clone();
            data.constant_value = Some(ConstValue::Long(3));
            Some(arena.alloc(BoundKind::Literal, data))
        } else {
            None
        }
    });
    assert_ne!(rewritten, root);
    // New nodes: replacement literal, inner binary, outer binary.
    assert_eq!(arena.len(), before + 3);
    // The untouched left operand is shared, not copied.
    let BoundKind::Binary { left: new_left, .. } = arena.kind(rewritten) else {
        panic!("root should still be a binary node");
    };
    let BoundKind::Binary { left: old_left, .. } = arena.kind(root) else {
        panic!("original root vanished");
    };
    assert_eq!(new_left, old_left);
}

#[test]
fn visit_reaches_every_node_exactly_once() {
    let (arena, root) = bind(&sample_expr());
    let mut seen = Vec::new();
    visit_with(&arena, root, &mut |_, id| seen.push(id));
    // $x, $y, 2, inner binary, outer binary.
    assert_eq!(seen.len(), 5);
    let mut unique = seen.clone();
    unique.sort_by_key(|id| id.0);
    unique.dedup();
    assert_eq!(unique.len(), seen.len());
    // Pre-order: the root comes first.
    assert_eq!(seen[0], root);
}

#[test]
fn rewrite_applies_bottom_up() {
    let (mut arena, root) = bind(&sample_expr());
    let mut order = Vec::new();
    rewrite_with(&mut arena, root, &mut |arena, id| {
        order.push(arena.kind(id).clone());
        None
    });
    // Children are presented before their parents.
    assert!(matches!(order.last(), Some(BoundKind::Binary { .. })));
    assert!(matches!(order.first(), Some(BoundKind::Local { .. })));
}
