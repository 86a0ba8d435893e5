//! Access-driven binding policies.

use phpz_ast::{Arg, BinaryOp, CallTarget, Expr, Lit, MemberName, Routine, Stmt, UnaryOp, VarName};
use phpz_binder::{
    AccessMode, BindError, Binder, BoundArena, BoundId, BoundKind, ConstValue, LocalsTable,
    NullTypeEnv,
};
use phpz_common::span::Span;
use phpz_solver::{FunctionInfo, FunctionParam, Repr, SimpleCatalog, TypeRefContext, TypeRefMask};

fn sp() -> Span {
    Span::ZERO
}

#[derive(Debug)]
struct Bound {
    arena: BoundArena,
    root: BoundId,
}

fn bind_with(catalog: &SimpleCatalog, expr: &Expr, access: AccessMode) -> Result<Bound, BindError> {
    let routine = Routine::function("test", vec![], vec![]);
    let mut locals = LocalsTable::new(&routine);
    let mut types = TypeRefContext::new();
    let mut arena = BoundArena::new();
    let mut binder = Binder::new(catalog, &mut types, &mut locals, &NullTypeEnv, &mut arena);
    let root = binder.bind_expr(expr, access)?;
    Ok(Bound { arena, root })
}

fn bind(expr: &Expr) -> Bound {
    bind_with(&SimpleCatalog::new(), expr, AccessMode::none()).expect("binding failed")
}

/// The first node matching `pred`, in allocation order.
fn find(arena: &BoundArena, pred: impl Fn(&BoundKind) -> bool) -> BoundId {
    (0..arena.len() as u32)
        .map(BoundId)
        .find(|&id| pred(arena.kind(id)))
        .expect("no node matched")
}

fn assign(target: Expr, value: Expr) -> Expr {
    Expr::Assign {
        target: Box::new(target),
        value: Box::new(value),
        span: sp(),
    }
}

fn item(array: Expr, index: Option<Expr>) -> Expr {
    Expr::ItemAccess {
        array: Box::new(array),
        index: index.map(Box::new),
        span: sp(),
    }
}

fn field(object: Expr, name: &str) -> Expr {
    Expr::FieldAccess {
        object: Box::new(object),
        field: MemberName::Direct(name.to_string()),
        span: sp(),
    }
}

#[test]
fn assignment_target_binds_with_write() {
    let b = bind(&assign(Expr::var("x", sp()), Expr::long(1, sp())));
    let target = find(&b.arena, |k| matches!(k, BoundKind::Local { name, .. } if name == "x"));
    let access = b.arena.data(target).access;
    assert!(access.is_write());
    assert!(!access.is_read());
    assert!(access.write_mask().includes(TypeRefMask::LONG));
}

#[test]
fn assignment_value_binds_with_read() {
    let b = bind(&assign(Expr::var("x", sp()), Expr::var("y", sp())));
    let value = find(&b.arena, |k| matches!(k, BoundKind::Local { name, .. } if name == "y"));
    let access = b.arena.data(value).access;
    assert!(access.is_read());
    assert!(!access.is_write());
}

#[test]
fn item_append_write_rebinds_base_with_ensure_array() {
    // $a[] = 1;
    let b = bind(&assign(item(Expr::var("a", sp()), None), Expr::long(1, sp())));
    let base = find(&b.arena, |k| matches!(k, BoundKind::Local { name, .. } if name == "a"));
    let access = b.arena.data(base).access;
    assert!(access.ensure_array());
    assert!(access.is_read());
    assert!(access.might_change());
}

#[test]
fn nested_item_write_autovivifies_the_whole_chain() {
    // $a[0][1] = 1;
    let inner = item(Expr::var("a", sp()), Some(Expr::long(0, sp())));
    let outer = item(inner, Some(Expr::long(1, sp())));
    let b = bind(&assign(outer, Expr::long(1, sp())));
    let base = find(&b.arena, |k| matches!(k, BoundKind::Local { name, .. } if name == "a"));
    assert!(b.arena.data(base).access.ensure_array());
    let mid = find(&b.arena, |k| matches!(k, BoundKind::ItemAccess { index: Some(_), .. }));
    // The inner ItemAccess is itself an ensure-array target.
    assert!(b.arena.data(mid).access.ensure_array());
}

#[test]
fn field_chain_write_rebinds_objects_with_ensure_object() {
    // $o->f->g = 1;
    let chain = field(field(Expr::var("o", sp()), "f"), "g");
    let b = bind(&assign(chain, Expr::long(1, sp())));
    let base = find(&b.arena, |k| matches!(k, BoundKind::Local { name, .. } if name == "o"));
    assert!(b.arena.data(base).access.ensure_object());
    let inner = find(&b.arena, |k| matches!(k, BoundKind::FieldAccess { .. }));
    assert!(b.arena.data(inner).access.ensure_object());
}

#[test]
fn isset_binds_operands_quietly() {
    let e = Expr::Isset {
        vars: vec![Expr::var("u", sp())],
        span: sp(),
    };
    let b = bind(&e);
    let var = find(&b.arena, |k| matches!(k, BoundKind::Local { .. }));
    let access = b.arena.data(var).access;
    assert!(access.is_quiet());
    assert!(access.is_read());
    assert!(!access.might_change());
}

#[test]
fn empty_binds_operand_quietly() {
    let e = Expr::EmptyEx {
        operand: Box::new(Expr::var("u", sp())),
        span: sp(),
    };
    let b = bind(&e);
    let var = find(&b.arena, |k| matches!(k, BoundKind::Local { .. }));
    assert!(b.arena.data(var).access.is_quiet());
}

#[test]
fn unset_statement_binds_operands_with_unset() {
    let routine = Routine::function("test", vec![], vec![]);
    let mut locals = LocalsTable::new(&routine);
    let mut types = TypeRefContext::new();
    let cat = SimpleCatalog::new();
    let mut arena = BoundArena::new();
    let mut binder = Binder::new(&cat, &mut types, &mut locals, &NullTypeEnv, &mut arena);
    let stmt = Stmt::Unset {
        vars: vec![Expr::var("x", sp())],
        span: sp(),
    };
    binder.bind_stmt(&stmt).expect("binding failed");
    let var = find(&arena, |k| matches!(k, BoundKind::Local { .. }));
    assert!(arena.data(var).access.is_unset());
    assert!(arena.data(var).access.might_change());
}

#[test]
fn compound_assignment_reads_and_writes_its_target() {
    let e = Expr::CompoundAssign {
        op: BinaryOp::Add,
        target: Box::new(Expr::var("x", sp())),
        value: Box::new(Expr::long(2, sp())),
        span: sp(),
    };
    let b = bind(&e);
    let target = find(&b.arena, |k| matches!(k, BoundKind::Local { .. }));
    let access = b.arena.data(target).access;
    assert!(access.is_read());
    assert!(access.is_write());
}

#[test]
fn list_destructuring_binds_elements_with_write() {
    let e = assign(
        Expr::ListEx {
            items: vec![Some(Expr::var("a", sp())), None, Some(Expr::var("b", sp()))],
            span: sp(),
        },
        Expr::var("src", sp()),
    );
    let b = bind(&e);
    for name in ["a", "b"] {
        let id = find(&b.arena, |k| matches!(k, BoundKind::Local { name: n, .. } if n == name));
        assert!(b.arena.data(id).access.is_write(), "${name} must be a write");
    }
}

#[test]
fn ref_assignment_uses_ref_accesses() {
    let e = Expr::RefAssign {
        target: Box::new(Expr::var("t", sp())),
        value: Box::new(Expr::var("v", sp())),
        span: sp(),
    };
    let b = bind(&e);
    let target = find(&b.arena, |k| matches!(k, BoundKind::Local { name, .. } if name == "t"));
    let value = find(&b.arena, |k| matches!(k, BoundKind::Local { name, .. } if name == "v"));
    assert!(b.arena.data(target).access.is_write_ref());
    assert!(b.arena.data(value).access.is_read_ref());
    assert!(b.arena.type_mask(value).is_ref());
}

#[test]
fn silence_operator_binds_quietly() {
    let e = Expr::Unary {
        op: UnaryOp::Silence,
        operand: Box::new(Expr::var("x", sp())),
        span: sp(),
    };
    let b = bind(&e);
    let var = find(&b.arena, |k| matches!(k, BoundKind::Local { .. }));
    assert!(b.arena.data(var).access.is_quiet());
}

#[test]
fn by_ref_parameter_call_is_unsupported() {
    let mut cat = SimpleCatalog::new();
    cat.add_function(FunctionInfo::new(
        "sort",
        vec![FunctionParam {
            name: "array".to_string(),
            repr: Repr::PhpArray,
            by_ref: true,
        }],
        Repr::Bool,
    ));
    let call = Expr::Call {
        target: CallTarget::Function("sort".to_string()),
        args: vec![Arg::new(Expr::var("a", sp()))],
        span: sp(),
    };
    let err = bind_with(&cat, &call, AccessMode::none()).unwrap_err();
    assert!(matches!(err, BindError::ByRefParameter { routine, .. } if routine == "sort"));
}

#[test]
fn resolved_call_gets_signature_return_mask() {
    let mut cat = SimpleCatalog::new();
    cat.add_function(FunctionInfo::new("strlen", vec![], Repr::Int64));
    let call = Expr::Call {
        target: CallTarget::Function("strlen".to_string()),
        args: vec![],
        span: sp(),
    };
    let b = bind_with(&cat, &call, AccessMode::none()).expect("binding failed");
    assert_eq!(b.arena.type_mask(b.root), TypeRefMask::LONG);
    assert!(b.arena.data(b.root).requires_context);
}

#[test]
fn unresolved_call_is_marked_and_types_as_anything() {
    let call = Expr::Call {
        target: CallTarget::Function("mystery".to_string()),
        args: vec![],
        span: sp(),
    };
    let b = bind(&call);
    assert!(matches!(
        b.arena.kind(b.root),
        BoundKind::GlobalCall { resolved: false, .. }
    ));
    assert!(b.arena.type_mask(b.root).is_anything());
}

#[test]
fn constant_operands_fold_eagerly() {
    let e = Expr::Binary {
        op: BinaryOp::Add,
        left: Box::new(Expr::long(40, sp())),
        right: Box::new(Expr::long(2, sp())),
        span: sp(),
    };
    let b = bind(&e);
    assert_eq!(
        b.arena.constant_value(b.root),
        Some(&ConstValue::Long(42))
    );
    assert_eq!(b.arena.type_mask(b.root), TypeRefMask::LONG);
}

#[test]
fn assignment_to_non_lvalue_binds_an_error_marker() {
    // f() = 1;  — permitted by the grammar, never writable.
    let e = assign(
        Expr::Call {
            target: CallTarget::Function("f".to_string()),
            args: vec![],
            span: sp(),
        },
        Expr::long(1, sp()),
    );
    let b = bind(&e);
    let marker = find(&b.arena, |k| matches!(k, BoundKind::ErrorEx));
    assert!(b.arena.data(marker).access.is_write());
    // The call itself was never bound as a write target.
    assert!(matches!(b.arena.kind(b.root), BoundKind::Assign { .. }));
}

#[test]
fn structured_statement_outside_cfg_fails_fast() {
    let routine = Routine::function("test", vec![], vec![]);
    let mut locals = LocalsTable::new(&routine);
    let mut types = TypeRefContext::new();
    let cat = SimpleCatalog::new();
    let mut arena = BoundArena::new();
    let mut binder = Binder::new(&cat, &mut types, &mut locals, &NullTypeEnv, &mut arena);
    let stmt = Stmt::If {
        cond: Expr::long(1, sp()),
        then: vec![],
        otherwise: vec![],
        span: sp(),
    };
    assert!(matches!(
        binder.bind_stmt(&stmt),
        Err(BindError::NotImplemented { .. })
    ));
}

#[test]
fn literal_lit_shorthand_has_expected_masks() {
    let b = bind(&Expr::Literal {
        value: Lit::Double(1.5),
        span: sp(),
    });
    assert_eq!(b.arena.type_mask(b.root), TypeRefMask::DOUBLE);
    let b = bind(&Expr::Literal {
        value: Lit::Str("s".to_string()),
        span: sp(),
    });
    assert_eq!(b.arena.type_mask(b.root), TypeRefMask::STRING);
}

#[test]
fn variable_name_shorthand_matches_explicit_form() {
    let explicit = Expr::Variable {
        name: VarName::Direct("x".to_string()),
        span: sp(),
    };
    assert_eq!(Expr::var("x", sp()), explicit);
}
