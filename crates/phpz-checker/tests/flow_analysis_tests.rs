//! End-to-end: bind + CFG + fixpoint inference.

use phpz_ast::{
    Arg, BinaryOp, CallTarget, Catch, Expr, Param, Routine, Stmt, TypeHint, UnaryOp,
};
use phpz_binder::{BoundKind, VariableKind};
use phpz_checker::{AnalysisError, Terminator, TypeAnalysis};
use phpz_common::diagnostics::diagnostic_codes;
use phpz_common::options::AnalysisOptions;
use phpz_common::span::Span;
use phpz_solver::{SimpleCatalog, TypeRefMask};

fn sp() -> Span {
    Span::ZERO
}

fn assign(name: &str, value: Expr) -> Stmt {
    Stmt::expr(Expr::Assign {
        target: Box::new(Expr::var(name, sp())),
        value: Box::new(value),
        span: sp(),
    })
}

fn lit_double(d: f64) -> Expr {
    Expr::Literal {
        value: phpz_ast::Lit::Double(d),
        span: sp(),
    }
}

fn binary(op: BinaryOp, l: Expr, r: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(l),
        right: Box::new(r),
        span: sp(),
    }
}

fn analyze(body: Vec<Stmt>) -> TypeAnalysis {
    analyze_routine(Routine::function("test", vec![], body))
}

fn analyze_routine(routine: Routine) -> TypeAnalysis {
    let catalog = SimpleCatalog::new();
    TypeAnalysis::run(&routine, &catalog, &AnalysisOptions::default()).expect("analysis failed")
}

#[test]
fn literal_assignments_infer_exact_masks() {
    // $x = 1; $y = $x + 1.5;
    let a = analyze(vec![
        assign("x", Expr::long(1, sp())),
        assign("y", binary(BinaryOp::Add, Expr::var("x", sp()), lit_double(1.5))),
    ]);
    assert_eq!(a.get_local_type_mask("x"), TypeRefMask::LONG);
    assert_eq!(a.get_local_type_mask("y"), TypeRefMask::DOUBLE);
}

#[test]
fn append_write_autovivifies_uninitialized_base() {
    // $a[] = 1;  with $a never initialized
    let a = analyze(vec![Stmt::expr(Expr::Assign {
        target: Box::new(Expr::ItemAccess {
            array: Box::new(Expr::var("a", sp())),
            index: None,
            span: sp(),
        }),
        value: Box::new(Expr::long(1, sp())),
        span: sp(),
    })]);
    assert!(a.get_local_type_mask("a").includes(TypeRefMask::ARRAY));
    // The base variable was re-bound with ensure-array access.
    let start = a.cfg().start();
    let root = a.cfg().block(start).bound[0];
    let mut saw_ensure = false;
    phpz_binder::visit_with(a.arena(), root, &mut |arena, id| {
        if let BoundKind::Local { name, .. } = arena.kind(id)
            && name == "a"
        {
            saw_ensure |= arena.data(id).access.ensure_array();
        }
    });
    assert!(saw_ensure);
}

#[test]
fn isset_is_quiet_but_echo_is_not() {
    // isset($u); echo $u;
    let a = analyze(vec![
        Stmt::expr(Expr::Isset {
            vars: vec![Expr::var("u", sp())],
            span: sp(),
        }),
        Stmt::Echo {
            values: vec![Expr::var("u", sp())],
            span: sp(),
        },
    ]);
    let undefined: Vec<_> = a
        .diagnostics()
        .iter()
        .filter(|d| d.code == diagnostic_codes::UNDEFINED_VARIABLE)
        .collect();
    assert_eq!(undefined.len(), 1, "echo alone should report");
}

#[test]
fn isset_alone_reports_nothing() {
    let a = analyze(vec![Stmt::expr(Expr::Isset {
        vars: vec![Expr::var("u", sp())],
        span: sp(),
    })]);
    assert!(a.diagnostics().is_empty());
}

#[test]
fn counting_loop_converges_quickly_to_long() {
    // for ($i = 0; $i < 10; $i++) { $s = $i; }
    let routine = Routine::function(
        "test",
        vec![],
        vec![Stmt::For {
            init: vec![Expr::Assign {
                target: Box::new(Expr::var("i", sp())),
                value: Box::new(Expr::long(0, sp())),
                span: sp(),
            }],
            cond: Some(binary(BinaryOp::Lt, Expr::var("i", sp()), Expr::long(10, sp()))),
            step: vec![Expr::Unary {
                op: UnaryOp::PostInc,
                operand: Box::new(Expr::var("i", sp())),
                span: sp(),
            }],
            body: vec![assign("s", Expr::var("i", sp()))],
            span: sp(),
        }],
    );
    let a = analyze_routine(routine);
    assert!(a.get_local_type_mask("i").includes(TypeRefMask::LONG));
    assert!(a.get_local_type_mask("s").includes(TypeRefMask::LONG));
    assert_eq!(a.get_local_type_mask("i"), TypeRefMask::LONG);
    assert_eq!(a.get_local_type_mask("s"), TypeRefMask::LONG);
    // Fixpoint must arrive within a small number of revisits per block.
    let bound = a.cfg().block_count() as u32 + 1;
    assert!(
        a.max_block_visits() <= bound,
        "block revisited {} times, bound {}",
        a.max_block_visits(),
        bound
    );
}

#[test]
fn loop_header_mask_never_loses_bits() {
    // $v = 1; while ($c) { $v = $v + 0.5; }
    let routine = Routine::function(
        "test",
        vec![Param::new("c", sp())],
        vec![
            assign("v", Expr::long(1, sp())),
            Stmt::While {
                cond: Expr::var("c", sp()),
                body: vec![assign(
                    "v",
                    binary(BinaryOp::Add, Expr::var("v", sp()), lit_double(0.5)),
                )],
                span: sp(),
            },
        ],
    );
    let a = analyze_routine(routine);
    // Accumulated: the initial long plus the widened double from the body.
    assert_eq!(
        a.get_local_type_mask("v"),
        TypeRefMask::LONG | TypeRefMask::DOUBLE
    );
    // At the loop header both passes' contributions are merged: the final
    // entry state is a superset of the first-pass state.
    let head = a
        .cfg()
        .block_ids()
        .find(|&id| matches!(a.cfg().block(id).terminator, Terminator::Branch { .. }))
        .expect("loop header");
    let slot = a.flow().lookup("v").expect("v tracked");
    let entry = a.cfg().block(head).flow_state.as_ref().expect("visited");
    assert!(entry.mask(slot).includes(TypeRefMask::LONG | TypeRefMask::DOUBLE));
}

#[test]
fn typed_parameters_seed_the_start_state() {
    let routine = Routine::function(
        "test",
        vec![
            Param::new("n", sp()).with_hint(TypeHint::Long),
            Param::new("anything", sp()),
        ],
        vec![assign("copy", Expr::var("n", sp()))],
    );
    let a = analyze_routine(routine);
    assert_eq!(a.get_param_type_mask("n"), Some(TypeRefMask::LONG));
    assert!(a.get_param_type_mask("anything").unwrap().is_anything());
    assert_eq!(a.get_param_type_mask("copy"), None, "not a parameter");
    assert_eq!(a.get_local_type_mask("copy"), TypeRefMask::LONG);
}

#[test]
fn return_type_unions_all_returns() {
    // if ($c) { return 1; } return 2.5;
    let routine = Routine::function(
        "test",
        vec![Param::new("c", sp())],
        vec![
            Stmt::If {
                cond: Expr::var("c", sp()),
                then: vec![Stmt::Return {
                    value: Some(Expr::long(1, sp())),
                    span: sp(),
                }],
                otherwise: vec![],
                span: sp(),
            },
            Stmt::Return {
                value: Some(lit_double(2.5)),
                span: sp(),
            },
        ],
    );
    let a = analyze_routine(routine);
    assert_eq!(
        a.return_type_mask(),
        TypeRefMask::LONG | TypeRefMask::DOUBLE
    );
}

#[test]
fn routine_without_return_returns_null() {
    let a = analyze(vec![assign("x", Expr::long(1, sp()))]);
    assert_eq!(a.return_type_mask(), TypeRefMask::NULL);
}

#[test]
fn branches_merge_with_bitwise_or() {
    // if ($c) { $x = 1; } else { $x = "s"; }
    let routine = Routine::function(
        "test",
        vec![Param::new("c", sp())],
        vec![Stmt::If {
            cond: Expr::var("c", sp()),
            then: vec![assign("x", Expr::long(1, sp()))],
            otherwise: vec![assign(
                "x",
                Expr::Literal {
                    value: phpz_ast::Lit::Str("s".to_string()),
                    span: sp(),
                },
            )],
            span: sp(),
        }],
    );
    let a = analyze_routine(routine);
    assert_eq!(
        a.get_local_type_mask("x"),
        TypeRefMask::LONG | TypeRefMask::STRING
    );
}

#[test]
fn unset_then_read_reports_undefined() {
    let a = analyze(vec![
        assign("x", Expr::long(1, sp())),
        Stmt::Unset {
            vars: vec![Expr::var("x", sp())],
            span: sp(),
        },
        Stmt::Echo {
            values: vec![Expr::var("x", sp())],
            span: sp(),
        },
    ]);
    assert!(
        a.diagnostics()
            .iter()
            .any(|d| d.code == diagnostic_codes::UNDEFINED_VARIABLE)
    );
}

#[test]
fn compound_assignment_keeps_long() {
    let a = analyze(vec![
        assign("x", Expr::long(1, sp())),
        Stmt::expr(Expr::CompoundAssign {
            op: BinaryOp::Add,
            target: Box::new(Expr::var("x", sp())),
            value: Box::new(Expr::long(2, sp())),
            span: sp(),
        }),
    ]);
    assert_eq!(a.get_local_type_mask("x"), TypeRefMask::LONG);
}

#[test]
fn reference_assignment_marks_both_sides() {
    let a = analyze(vec![
        assign("x", Expr::long(1, sp())),
        Stmt::expr(Expr::RefAssign {
            target: Box::new(Expr::var("r", sp())),
            value: Box::new(Expr::var("x", sp())),
            span: sp(),
        }),
    ]);
    assert!(a.get_local_type_mask("r").is_ref());
    assert!(a.get_local_type_mask("x").is_ref());
}

#[test]
fn catch_variable_carries_the_caught_class() {
    let a = analyze(vec![Stmt::TryCatch {
        body: vec![Stmt::expr(Expr::Call {
            target: CallTarget::Function("risky".to_string()),
            args: vec![Arg::new(Expr::long(1, sp()))],
            span: sp(),
        })],
        catches: vec![Catch {
            class_name: "Exception".to_string(),
            variable: "e".to_string(),
            body: vec![Stmt::Echo {
                values: vec![Expr::var("e", sp())],
                span: sp(),
            }],
            span: sp(),
        }],
        finally: vec![],
        span: sp(),
    }]);
    assert!(a.get_local_type_mask("e").has_class_bits());
    // The catch body read $e without complaint.
    assert!(
        !a.diagnostics()
            .iter()
            .any(|d| d.code == diagnostic_codes::UNDEFINED_VARIABLE)
    );
}

#[test]
fn iteration_cap_fails_loudly() {
    let routine = Routine::function(
        "test",
        vec![Param::new("c", sp())],
        vec![Stmt::While {
            cond: Expr::var("c", sp()),
            body: vec![assign("x", Expr::long(1, sp()))],
            span: sp(),
        }],
    );
    let catalog = SimpleCatalog::new();
    let options = AnalysisOptions {
        max_flow_iterations: 1,
        ..AnalysisOptions::default()
    };
    let err = TypeAnalysis::run(&routine, &catalog, &options).unwrap_err();
    assert!(matches!(err, AnalysisError::IterationLimit { .. }));
}

#[test]
fn pure_constant_expressions_fold_to_literals() {
    // $x = 1 + 2 * 3;
    let a = analyze(vec![assign(
        "x",
        binary(
            BinaryOp::Add,
            Expr::long(1, sp()),
            binary(BinaryOp::Mul, Expr::long(2, sp()), Expr::long(3, sp())),
        ),
    )]);
    assert_eq!(a.get_local_type_mask("x"), TypeRefMask::LONG);
    let start = a.cfg().start();
    let root = a.cfg().block(start).bound[0];
    // After the folding pass the assignment's value is a single literal.
    let mut literal_value = None;
    phpz_binder::visit_with(a.arena(), root, &mut |arena, id| {
        if let BoundKind::Assign { value, .. } = arena.kind(id) {
            literal_value = Some((
                matches!(arena.kind(*value), BoundKind::Literal),
                arena.constant_value(*value).cloned(),
            ));
        }
    });
    let (is_literal, value) = literal_value.expect("assignment survived");
    assert!(is_literal);
    assert_eq!(value, Some(phpz_binder::ConstValue::Long(7)));
}

#[test]
fn this_is_typed_from_the_declaring_class() {
    let mut routine = Routine::function(
        "method",
        vec![],
        vec![assign("me", Expr::var("this", sp()))],
    );
    routine.kind = phpz_ast::RoutineKind::Method;
    routine.this_class = Some("Widget".to_string());
    let a = analyze_routine(routine);
    assert_eq!(
        a.locals().kind("this"),
        Some(VariableKind::ThisParameter)
    );
    assert!(a.get_local_type_mask("me").has_class_bits());
}
